use super::types::ComponentState;
use crate::config::GalleryConfig;
use crate::error::Result;
use crate::gallery::{PersistenceHandle, PhotoGallery, PhotoGalleryBuilder};
use crate::photo::UserPhoto;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(feature = "keyboard")]
use super::keyboard_input::KeyboardInputHandler;

/// Application coordinator owning the gallery and its background tasks
pub struct GalleryApp {
    pub(super) config: GalleryConfig,
    pub(super) gallery: Arc<PhotoGallery>,

    // Background work
    pub(super) persistence: Option<PersistenceHandle>,
    pub(super) observer_task: Option<JoinHandle<()>>,
    pub(super) captures: JoinSet<Option<UserPhoto>>,
    #[cfg(feature = "keyboard")]
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) cancellation_token: CancellationToken,
}

impl GalleryApp {
    /// Create an application wired to the services described by `config`
    pub fn new(config: GalleryConfig) -> Result<Self> {
        let gallery = PhotoGalleryBuilder::from_config(&config).build()?;
        info!(
            "Gallery configured for {} platform, data in {}",
            gallery.platform().name(),
            config.storage.data_dir
        );
        Ok(Self::with_gallery(config, gallery))
    }

    /// Create an application around an already built gallery
    pub fn with_gallery(config: GalleryConfig, gallery: PhotoGallery) -> Self {
        Self {
            config,
            gallery: Arc::new(gallery),
            persistence: None,
            observer_task: None,
            captures: JoinSet::new(),
            #[cfg(feature = "keyboard")]
            keyboard_handler: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn gallery(&self) -> &Arc<PhotoGallery> {
        &self.gallery
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }
}
