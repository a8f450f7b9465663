mod builder;
mod capture;
mod core;
mod persistence;
mod save;
mod state;
#[cfg(test)]
mod tests;

pub use builder::PhotoGalleryBuilder;
pub use self::core::PhotoGallery;
pub use persistence::{PersistenceHandle, PersistenceSync};
pub use state::GalleryState;
