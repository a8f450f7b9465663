use super::core::PhotoGallery;
use crate::error::Result;
use crate::events::GalleryEvent;
use crate::photo::UserPhoto;
use std::time::SystemTime;
use tracing::{debug, error, info};

impl PhotoGallery {
    /// Capture a photo, save it, and add it to the front of the gallery.
    ///
    /// Failures are logged and swallowed; the gallery is left unchanged and
    /// `None` is returned.
    pub async fn add_new_to_gallery(&self) -> Option<UserPhoto> {
        match self.try_add_new_to_gallery().await {
            Ok(photo) => Some(photo),
            Err(e) => {
                error!("Failed to add photo to gallery: {}", e);
                self.notify(GalleryEvent::CaptureFailed {
                    error: e.to_string(),
                })
                .await;
                None
            }
        }
    }

    /// Capture flow with the failure reported to the caller
    pub async fn try_add_new_to_gallery(&self) -> Result<UserPhoto> {
        self.notify(GalleryEvent::CaptureStarted {
            timestamp: SystemTime::now(),
        })
        .await;

        debug!(
            "Requesting photo from {} ({:?})",
            self.capture.service_name(),
            self.capture_options
        );
        let captured = self.capture.get_photo(&self.capture_options).await?;

        let file_name = self.filenames.next_name();
        let saved = self.save_picture(&captured, &file_name).await?;

        let revision = self.state.prepend(saved.clone()).await;
        info!("Added {} to gallery (revision {})", saved.filepath, revision);

        self.notify(GalleryEvent::PhotoAdded {
            photo: saved.clone(),
        })
        .await;

        Ok(saved)
    }
}
