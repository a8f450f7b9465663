pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod photo;
pub mod platform;
pub mod services;

pub use app::{gallery_listing, AppCommand, ComponentState, GalleryApp, ShutdownReason};
pub use config::{GalleryConfig, PlatformMode};
pub use error::{CaptureError, GalleryError, Result, StorageError, TranscodeError};
pub use events::{ChangeReason, EventBus, EventFilter, EventReceiver, GalleryEvent};
pub use gallery::{GalleryState, PersistenceHandle, PersistenceSync, PhotoGallery, PhotoGalleryBuilder};
pub use photo::{CapturedPhoto, FilenameGenerator, UserPhoto};
pub use platform::{NativePlatform, Platform, WebPlatform};
pub use services::{
    BlobFetcher, CaptureOptions, CaptureService, Directory, FilePreferences, Filesystem,
    LocalFilesystem, MemoryPreferences, MockCaptureService, Preferences, SnapshotCamera,
    UriFetcher,
};
