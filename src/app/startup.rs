use super::{ComponentState, GalleryApp};
use crate::error::{EventBusError, Result};
use crate::events::GalleryEvent;
use tracing::{debug, error, info, warn};

impl GalleryApp {
    /// Start persistence, the gallery observer, and load the saved gallery.
    ///
    /// A failed load is logged and does not stop startup.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting photo gallery");

        // Persistence must be listening before the load mutates the gallery
        self.set_component_state("persistence", ComponentState::Starting)
            .await;
        self.persistence = Some(self.gallery.start_persistence());
        self.set_component_state("persistence", ComponentState::Running)
            .await;

        self.start_observer();

        self.set_component_state("gallery", ComponentState::Starting)
            .await;
        match self.gallery.load_saved().await {
            Ok(count) => info!("Gallery loaded with {} photos", count),
            Err(e) => error!("Failed to load saved photos: {}", e),
        }
        self.set_component_state("gallery", ComponentState::Running)
            .await;

        info!("Photo gallery started");
        Ok(())
    }

    /// Log every gallery revision, the way a view would re-render
    fn start_observer(&mut self) {
        let mut changes = self.gallery.state().subscribe_changes("observer");
        let cancellation_token = self.cancellation_token.clone();

        self.observer_task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancellation_token.cancelled() => break,
                    received = changes.recv() => match received {
                        Ok(GalleryEvent::GalleryChanged { photos, revision, reason }) => {
                            info!(
                                "Gallery revision {} ({:?}): {} photos",
                                revision,
                                reason,
                                photos.len()
                            );
                        }
                        Ok(_) => {}
                        Err(EventBusError::Lagged { skipped }) => {
                            warn!("Gallery observer skipped {} revisions", skipped);
                        }
                        Err(e) => {
                            debug!("Gallery observer stopping: {}", e);
                            break;
                        }
                    }
                }
            }
        }));
    }
}
