#[cfg(feature = "keyboard")]
pub mod keyboard_input;

mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::GalleryApp;
pub use runtime::gallery_listing;
pub use types::{AppCommand, ComponentState, ShutdownReason};
