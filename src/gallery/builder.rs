use super::core::PhotoGallery;
use super::persistence::PersistenceSync;
use super::state::GalleryState;
use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::events::EventBus;
use crate::photo::FilenameGenerator;
use crate::platform::{self, Platform};
use crate::services::{
    BlobFetcher, CaptureOptions, CaptureService, FilePreferences, Filesystem, LocalFilesystem,
    Preferences, SnapshotCamera, UriFetcher,
};
use std::sync::Arc;

const DEFAULT_INDEX_KEY: &str = "photos";
const DEFAULT_EVENT_BUS_CAPACITY: usize = 64;

/// Builder for PhotoGallery
pub struct PhotoGalleryBuilder {
    capture: Option<Arc<dyn CaptureService>>,
    fetcher: Option<Arc<dyn BlobFetcher>>,
    filesystem: Option<Arc<dyn Filesystem>>,
    preferences: Option<Arc<dyn Preferences>>,
    platform: Option<Arc<dyn Platform>>,
    event_bus: Option<Arc<EventBus>>,
    filenames: Option<FilenameGenerator>,
    capture_options: CaptureOptions,
    index_key: String,
}

impl PhotoGalleryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            capture: None,
            fetcher: None,
            filesystem: None,
            preferences: None,
            platform: None,
            event_bus: None,
            filenames: None,
            capture_options: CaptureOptions::default(),
            index_key: DEFAULT_INDEX_KEY.to_string(),
        }
    }

    /// Builder wired to the local services described by `config`
    pub fn from_config(config: &GalleryConfig) -> Self {
        let data_dir = config.storage.data_dir();
        let capacity = config.system.event_bus_capacity;
        let event_bus = if config.system.debug_events {
            EventBus::with_debug_logging(capacity)
        } else {
            EventBus::new(capacity)
        };

        Self::new()
            .with_capture_service(Arc::new(SnapshotCamera::new(
                &config.capture.snapshot_path,
                data_dir.join("cache").join("captures"),
            )))
            .with_filesystem(Arc::new(LocalFilesystem::new(&data_dir)))
            .with_preferences(Arc::new(FilePreferences::new(
                config.storage.preferences_path(),
            )))
            .with_platform(platform::from_config(&config.platform))
            .with_event_bus(Arc::new(event_bus))
            .with_index_key(config.storage.index_key.clone())
            .with_capture_options(CaptureOptions::default().with_quality(config.capture.quality))
    }

    /// Set the capture service
    pub fn with_capture_service(mut self, capture: Arc<dyn CaptureService>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Set the blob fetcher (defaults to [`UriFetcher`])
    pub fn with_fetcher(mut self, fetcher: Arc<dyn BlobFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the filesystem
    pub fn with_filesystem(mut self, filesystem: Arc<dyn Filesystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Set the preferences store
    pub fn with_preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Set the platform
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the event bus
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Set the file name generator
    pub fn with_filenames(mut self, filenames: FilenameGenerator) -> Self {
        self.filenames = Some(filenames);
        self
    }

    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.capture_options = options;
        self
    }

    pub fn with_index_key<S: Into<String>>(mut self, key: S) -> Self {
        self.index_key = key.into();
        self
    }

    /// Build the PhotoGallery
    pub fn build(self) -> Result<PhotoGallery> {
        let capture = self.capture.ok_or_else(|| {
            GalleryError::component("gallery_builder", "Capture service is required")
        })?;

        let filesystem = self.filesystem.ok_or_else(|| {
            GalleryError::component("gallery_builder", "Filesystem is required")
        })?;

        let preferences = self.preferences.ok_or_else(|| {
            GalleryError::component("gallery_builder", "Preferences store is required")
        })?;

        let platform = self
            .platform
            .ok_or_else(|| GalleryError::component("gallery_builder", "Platform is required"))?;

        if self.index_key.trim().is_empty() {
            return Err(GalleryError::component(
                "gallery_builder",
                "Index key must not be empty",
            ));
        }

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(EventBus::new(DEFAULT_EVENT_BUS_CAPACITY)));
        let state = Arc::new(GalleryState::new(Arc::clone(&event_bus)));
        let persistence = Arc::new(PersistenceSync::new(preferences, self.index_key));

        Ok(PhotoGallery {
            state,
            persistence,
            capture,
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(UriFetcher::new())),
            filesystem,
            platform,
            filenames: self.filenames.unwrap_or_default(),
            capture_options: self.capture_options,
            event_bus,
        })
    }
}

impl Default for PhotoGalleryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoGallery {
    /// Create a new builder
    pub fn builder() -> PhotoGalleryBuilder {
        PhotoGalleryBuilder::new()
    }
}
