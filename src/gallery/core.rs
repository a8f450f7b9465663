use super::persistence::PersistenceSync;
use super::state::GalleryState;
use crate::events::{EventBus, GalleryEvent};
use crate::photo::{FilenameGenerator, UserPhoto};
use crate::platform::Platform;
use crate::services::{BlobFetcher, CaptureOptions, CaptureService, Filesystem};
use std::sync::Arc;
use tracing::trace;

/// Photo gallery: capture, save, and persisted gallery state
pub struct PhotoGallery {
    pub(super) state: Arc<GalleryState>,
    pub(super) persistence: Arc<PersistenceSync>,
    pub(super) capture: Arc<dyn CaptureService>,
    pub(super) fetcher: Arc<dyn BlobFetcher>,
    pub(super) filesystem: Arc<dyn Filesystem>,
    pub(super) platform: Arc<dyn Platform>,
    pub(super) filenames: FilenameGenerator,
    pub(super) capture_options: CaptureOptions,
    pub(super) event_bus: Arc<EventBus>,
}

impl PhotoGallery {
    /// Current photos, newest first
    pub async fn photos(&self) -> Vec<UserPhoto> {
        self.state.photos().await
    }

    pub fn state(&self) -> &Arc<GalleryState> {
        &self.state
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn persistence(&self) -> &Arc<PersistenceSync> {
        &self.persistence
    }

    pub fn capture_options(&self) -> CaptureOptions {
        self.capture_options
    }

    /// Publish an informational event; having no observers is fine
    pub(super) async fn notify(&self, event: GalleryEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            trace!("Gallery event not delivered: {}", e);
        }
    }
}
