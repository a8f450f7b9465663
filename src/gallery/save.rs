use super::core::PhotoGallery;
use crate::error::{CaptureError, Result};
use crate::photo::{CapturedPhoto, UserPhoto};
use crate::services::{transcode, Directory};
use tracing::debug;

impl PhotoGallery {
    /// Persist a captured photo under `file_name` in app-private storage.
    ///
    /// Exactly one file is written on success. Nothing is written when the
    /// capture has no source URI, the platform rejects it, or its bytes
    /// yield no base64 payload.
    pub async fn save_picture(
        &self,
        captured: &CapturedPhoto,
        file_name: &str,
    ) -> Result<UserPhoto> {
        let source_uri = captured
            .source_uri
            .as_deref()
            .ok_or(CaptureError::MissingSourceUri)?;
        self.platform.validate_capture(captured)?;

        let blob = self.fetcher.fetch(source_uri).await?;
        debug!("Fetched {} bytes ({})", blob.len(), blob.mime_type);

        let data_url = transcode::blob_to_data_url(&blob);
        let base64_data = transcode::strip_data_url_prefix(&data_url)?;

        let written = self
            .filesystem
            .write_file(file_name, base64_data, Directory::Data)
            .await?;

        let webview_path = self.platform.display_uri_for_saved(&written, captured)?;
        debug!(
            "Saved {} on {} platform, display URI {}",
            file_name,
            self.platform.name(),
            webview_path
        );

        Ok(UserPhoto::new(file_name, webview_path))
    }
}
