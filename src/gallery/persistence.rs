use super::core::PhotoGallery;
use crate::error::{EventBusError, GalleryError, Result};
use crate::events::{EventBus, EventReceiver, GalleryEvent};
use crate::photo::UserPhoto;
use crate::services::Preferences;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Reads and writes the gallery index in the preferences store
pub struct PersistenceSync {
    preferences: Arc<dyn Preferences>,
    key: String,
}

impl PersistenceSync {
    pub fn new<S: Into<String>>(preferences: Arc<dyn Preferences>, key: S) -> Self {
        Self {
            preferences,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize the photos as a JSON array and store them under the index key
    pub async fn store(&self, photos: &[UserPhoto]) -> Result<()> {
        let value = serde_json::to_string(photos)?;
        self.preferences.set(&self.key, value).await?;
        debug!("Stored {} photos under '{}'", photos.len(), self.key);
        Ok(())
    }

    /// Stored photos exactly as persisted; empty when the key is absent
    pub async fn read_index(&self) -> Result<Vec<UserPhoto>> {
        match self.preferences.get(&self.key).await? {
            Some(value) => Ok(serde_json::from_str(&value)?),
            None => {
                debug!("No stored index under '{}'", self.key);
                Ok(Vec::new())
            }
        }
    }

    /// Start the task that stores every gallery snapshot published on `receiver`
    pub fn spawn(
        self: &Arc<Self>,
        receiver: EventReceiver,
        event_bus: Arc<EventBus>,
    ) -> PersistenceHandle {
        let (handled_tx, handled_rx) = watch::channel(0u64);
        let failed_writes = Arc::new(AtomicU64::new(0));
        let cancellation_token = CancellationToken::new();

        let worker = PersistenceWorker {
            sync: Arc::clone(self),
            receiver,
            event_bus,
            handled_tx,
            failed_writes: Arc::clone(&failed_writes),
            cancellation_token: cancellation_token.clone(),
        };
        let task = tokio::spawn(worker.run());

        PersistenceHandle {
            handled_rx,
            failed_writes,
            cancellation_token,
            task,
        }
    }
}

struct PersistenceWorker {
    sync: Arc<PersistenceSync>,
    receiver: EventReceiver,
    event_bus: Arc<EventBus>,
    handled_tx: watch::Sender<u64>,
    failed_writes: Arc<AtomicU64>,
    cancellation_token: CancellationToken,
}

impl PersistenceWorker {
    async fn run(mut self) {
        info!("Gallery persistence task started (key '{}')", self.sync.key);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    self.drain().await;
                    break;
                }
                received = self.receiver.recv() => match received {
                    Ok(event) => self.handle(event).await,
                    // Each snapshot carries the full list; a newer one follows
                    Err(EventBusError::Lagged { skipped }) => {
                        debug!("Skipped {} stale gallery snapshots", skipped);
                    }
                    Err(EventBusError::ChannelClosed) => break,
                    Err(e) => warn!("Persistence receiver error: {}", e),
                }
            }
        }

        info!("Gallery persistence task stopped");
    }

    /// Store only the newest pending snapshot
    async fn drain(&mut self) {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(Some(event)) => latest = Some(event),
                Ok(None) | Err(EventBusError::ChannelClosed) => break,
                Err(_) => continue,
            }
        }

        if let Some(event) = latest {
            self.handle(event).await;
        }
    }

    async fn handle(&mut self, event: GalleryEvent) {
        let GalleryEvent::GalleryChanged {
            photos, revision, ..
        } = event
        else {
            return;
        };

        if let Err(e) = self.sync.store(&photos).await {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            error!("Failed to persist gallery revision {}: {}", revision, e);
            let failed = GalleryEvent::PersistenceFailed {
                revision,
                error: e.to_string(),
            };
            if let Err(e) = self.event_bus.publish(failed).await {
                trace!("Persistence failure not delivered: {}", e);
            }
        }

        self.handled_tx.send_if_modified(|handled| {
            if revision > *handled {
                *handled = revision;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to the running persistence task
pub struct PersistenceHandle {
    handled_rx: watch::Receiver<u64>,
    failed_writes: Arc<AtomicU64>,
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    /// Highest gallery revision the task has attempted to store
    pub fn handled_revision(&self) -> u64 {
        *self.handled_rx.borrow()
    }

    /// Number of snapshots that could not be stored
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Wait until the snapshot for `revision` (or a later one) was handled
    pub async fn wait_for_revision(&self, revision: u64) -> Result<()> {
        let mut handled = self.handled_rx.clone();
        let reached = handled
            .wait_for(|handled| *handled >= revision)
            .await
            .map(|_| ());
        reached.map_err(|_| GalleryError::component("persistence", "Persistence task exited"))
    }

    /// Store the newest pending snapshot and stop the task
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.task.await.map_err(|e| {
            GalleryError::component("persistence".to_string(), format!("Task failed: {}", e))
        })
    }
}

impl PhotoGallery {
    /// Start persisting every gallery mutation from now on
    pub fn start_persistence(&self) -> PersistenceHandle {
        let receiver = self.state.subscribe_changes("persistence");
        self.persistence
            .spawn(receiver, Arc::clone(&self.event_bus))
    }

    /// Replace the gallery with the persisted index.
    ///
    /// Native hosts re-derive each display URI from the stored bytes. A
    /// single unreadable file fails the whole load and leaves the gallery
    /// untouched.
    pub async fn load_saved(&self) -> Result<usize> {
        let mut photos = self.persistence.read_index().await?;

        for photo in photos.iter_mut() {
            photo.webview_path = self
                .platform
                .display_uri_for_loaded(photo, self.filesystem.as_ref())
                .await?;
        }

        let count = photos.len();
        let revision = self.state.replace_all(photos).await;
        info!(
            "Loaded {} saved photos on {} platform (revision {})",
            count,
            self.platform.name(),
            revision
        );

        Ok(count)
    }
}
