use super::{ComponentState, GalleryApp};
use crate::error::{GalleryError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

const CAPTURE_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
const PERSISTENCE_STOP_TIMEOUT: Duration = Duration::from_secs(10);

impl GalleryApp {
    /// Perform graceful shutdown of all components.
    ///
    /// In-flight captures are allowed to finish so their photos reach the
    /// persisted index before the persistence task is stopped.
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        #[cfg(feature = "keyboard")]
        if let Some(handler) = self.keyboard_handler.take() {
            self.set_component_state("keyboard", ComponentState::Stopping)
                .await;
            match handler.stop().await {
                Ok(()) => {
                    self.set_component_state("keyboard", ComponentState::Stopped)
                        .await;
                }
                Err(e) => {
                    error!("Error stopping keyboard: {}", e);
                    self.set_component_state("keyboard", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
            }
        }

        if let Err(e) = self.drain_captures().await {
            error!("Error finishing captures: {}", e);
            exit_code = 1;
        }

        if let Some(observer) = self.observer_task.take() {
            let _ = observer.await;
        }

        if let Err(e) = self.stop_persistence().await {
            error!("Error stopping persistence: {}", e);
            exit_code = 1;
        }

        self.set_component_state("gallery", ComponentState::Stopped)
            .await;

        let failed = self.components_in(ComponentState::Failed).await;
        if !failed.is_empty() {
            warn!("Components failed during shutdown: {}", failed.join(", "));
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn drain_captures(&mut self) -> Result<()> {
        if self.captures.is_empty() {
            return Ok(());
        }

        info!("Waiting for {} in-flight captures", self.captures.len());
        let captures = &mut self.captures;
        let drained = timeout(CAPTURE_DRAIN_TIMEOUT, async {
            while let Some(joined) = captures.join_next().await {
                if let Err(e) = joined {
                    warn!("Capture task failed during shutdown: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            self.captures.abort_all();
            return Err(GalleryError::system("In-flight captures timed out"));
        }
        Ok(())
    }

    async fn stop_persistence(&mut self) -> Result<()> {
        let component = "persistence";
        let Some(handle) = self.persistence.take() else {
            self.set_component_state(component, ComponentState::Stopped)
                .await;
            return Ok(());
        };

        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let failed_writes = handle.failed_writes();
        match timeout(PERSISTENCE_STOP_TIMEOUT, handle.stop()).await {
            Ok(Ok(())) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                if failed_writes > 0 {
                    warn!("{} gallery index writes failed this session", failed_writes);
                }
                info!("{} component stopped", component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                Err(e)
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                Err(GalleryError::component(
                    component.to_string(),
                    format!("{} component stop timeout", component),
                ))
            }
        }
    }
}
