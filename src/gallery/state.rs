use crate::events::{ChangeReason, EventBus, EventFilter, EventReceiver, GalleryEvent};
use crate::photo::UserPhoto;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

struct GalleryContents {
    photos: Vec<UserPhoto>,
    revision: u64,
}

/// Ordered photo list, newest first.
///
/// Every mutation bumps the revision and publishes a
/// [`GalleryEvent::GalleryChanged`] snapshot while the write lock is held, so
/// subscribers see snapshots in mutation order.
pub struct GalleryState {
    contents: RwLock<GalleryContents>,
    event_bus: Arc<EventBus>,
}

impl GalleryState {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            contents: RwLock::new(GalleryContents {
                photos: Vec::new(),
                revision: 0,
            }),
            event_bus,
        }
    }

    /// Current photos, newest first
    pub async fn photos(&self) -> Vec<UserPhoto> {
        self.contents.read().await.photos.clone()
    }

    pub async fn len(&self) -> usize {
        self.contents.read().await.photos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contents.read().await.photos.is_empty()
    }

    /// Number of mutations applied so far
    pub async fn revision(&self) -> u64 {
        self.contents.read().await.revision
    }

    /// Insert a photo at the front; returns the new revision
    pub async fn prepend(&self, photo: UserPhoto) -> u64 {
        let mut contents = self.contents.write().await;
        contents.photos.insert(0, photo);
        self.commit(&mut contents, ChangeReason::PhotoAdded).await
    }

    /// Replace the whole list; returns the new revision
    pub async fn replace_all(&self, photos: Vec<UserPhoto>) -> u64 {
        let mut contents = self.contents.write().await;
        contents.photos = photos;
        self.commit(&mut contents, ChangeReason::Loaded).await
    }

    /// Observe every event on the gallery bus
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.event_bus.subscribe()
    }

    /// Observe only gallery snapshots
    pub fn subscribe_changes<S: Into<String>>(&self, name: S) -> EventReceiver {
        self.event_bus
            .subscribe_filtered(EventFilter::EventTypes(vec!["gallery_changed"]), name)
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    async fn commit(&self, contents: &mut GalleryContents, reason: ChangeReason) -> u64 {
        contents.revision += 1;
        let revision = contents.revision;

        let event = GalleryEvent::GalleryChanged {
            photos: contents.photos.clone(),
            revision,
            reason,
        };
        match self.event_bus.publish(event).await {
            Ok(receivers) => trace!("Revision {} delivered to {} observers", revision, receivers),
            Err(e) => debug!("Revision {} has no observers: {}", revision, e),
        }

        revision
    }
}
