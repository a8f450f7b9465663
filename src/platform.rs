//! Native vs web host capability.
//!
//! The save and load flows never branch on the host themselves; they ask the
//! [`Platform`] for the display URI of a freshly saved or reloaded photo.

use crate::config::{PlatformConfig, PlatformMode};
use crate::error::{CaptureError, Result};
use crate::photo::{CapturedPhoto, UserPhoto};
use crate::services::{Directory, Filesystem, WriteFileResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Whether the gallery runs inside a native host
    fn is_native(&self) -> bool;

    /// Convert a storage URI into one the display layer can load
    fn convert_file_src(&self, uri: &str) -> String;

    /// Reject a capture result this host could not display once saved.
    ///
    /// Called before any bytes are fetched or written.
    fn validate_capture(&self, _captured: &CapturedPhoto) -> Result<()> {
        Ok(())
    }

    /// Display URI for a photo that was just written to storage
    fn display_uri_for_saved(
        &self,
        written: &WriteFileResult,
        captured: &CapturedPhoto,
    ) -> Result<String>;

    /// Display URI for a photo re-read from the persisted index
    async fn display_uri_for_loaded(
        &self,
        photo: &UserPhoto,
        filesystem: &dyn Filesystem,
    ) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Native host: files are served through a local file server and reloaded
/// photos are inlined from their stored bytes
#[derive(Debug, Clone)]
pub struct NativePlatform {
    file_server_url: String,
}

impl NativePlatform {
    pub fn new<S: Into<String>>(file_server_url: S) -> Self {
        Self {
            file_server_url: file_server_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Platform for NativePlatform {
    fn is_native(&self) -> bool {
        true
    }

    fn convert_file_src(&self, uri: &str) -> String {
        match uri.strip_prefix("file://") {
            Some(path) => format!("{}{}", self.file_server_url, path),
            None => uri.to_string(),
        }
    }

    fn display_uri_for_saved(
        &self,
        written: &WriteFileResult,
        _captured: &CapturedPhoto,
    ) -> Result<String> {
        Ok(self.convert_file_src(&written.uri))
    }

    async fn display_uri_for_loaded(
        &self,
        photo: &UserPhoto,
        filesystem: &dyn Filesystem,
    ) -> Result<String> {
        let file = filesystem
            .read_file(&photo.filepath, Directory::Data)
            .await?;
        debug!("Re-inlined {} for display", photo.filepath);
        Ok(UserPhoto::inline_display_uri(&file.data))
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Web host: the capture-provided URI is displayed as is
#[derive(Debug, Clone, Default)]
pub struct WebPlatform;

impl WebPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Platform for WebPlatform {
    fn is_native(&self) -> bool {
        false
    }

    fn convert_file_src(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn validate_capture(&self, captured: &CapturedPhoto) -> Result<()> {
        match captured.display_uri {
            Some(_) => Ok(()),
            None => Err(CaptureError::MissingDisplayUri.into()),
        }
    }

    fn display_uri_for_saved(
        &self,
        _written: &WriteFileResult,
        captured: &CapturedPhoto,
    ) -> Result<String> {
        captured
            .display_uri
            .clone()
            .ok_or_else(|| CaptureError::MissingDisplayUri.into())
    }

    async fn display_uri_for_loaded(
        &self,
        photo: &UserPhoto,
        _filesystem: &dyn Filesystem,
    ) -> Result<String> {
        Ok(photo.webview_path.clone())
    }

    fn name(&self) -> &'static str {
        "web"
    }
}

/// Platform selected by configuration
pub fn from_config(config: &PlatformConfig) -> Arc<dyn Platform> {
    match config.mode {
        PlatformMode::Native => Arc::new(NativePlatform::new(config.file_server_url.clone())),
        PlatformMode::Web => Arc::new(WebPlatform::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LocalFilesystem;
    use tempfile::TempDir;

    #[test]
    fn test_native_convert_file_src() {
        let platform = NativePlatform::new("http://localhost/_capacitor_file_/");

        assert_eq!(
            platform.convert_file_src("file:///data/user/0/app/files/1.jpeg"),
            "http://localhost/_capacitor_file_/data/user/0/app/files/1.jpeg"
        );
        assert_eq!(
            platform.convert_file_src("data:image/jpeg;base64,AAAA"),
            "data:image/jpeg;base64,AAAA"
        );
    }

    #[test]
    fn test_web_keeps_capture_display_uri() {
        let platform = WebPlatform::new();
        let written = WriteFileResult {
            uri: "file:///tmp/1.jpeg".to_string(),
        };
        let captured = CapturedPhoto::from_uri("blob:http://localhost/abc");

        assert_eq!(
            platform.display_uri_for_saved(&written, &captured).unwrap(),
            "blob:http://localhost/abc"
        );

        let missing = CapturedPhoto {
            display_uri: None,
            ..captured
        };
        assert!(platform.display_uri_for_saved(&written, &missing).is_err());
    }

    #[test]
    fn test_web_requires_display_uri_before_saving() {
        let captured = CapturedPhoto::from_uri("blob:http://localhost/abc");
        assert!(WebPlatform::new().validate_capture(&captured).is_ok());

        let missing = CapturedPhoto {
            display_uri: None,
            ..captured
        };
        assert!(matches!(
            WebPlatform::new().validate_capture(&missing),
            Err(crate::error::GalleryError::Capture(CaptureError::MissingDisplayUri))
        ));
        assert!(NativePlatform::new("http://localhost")
            .validate_capture(&missing)
            .is_ok());
    }

    #[tokio::test]
    async fn test_native_loaded_photo_is_inlined() {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = LocalFilesystem::new(temp_dir.path());
        filesystem
            .write_file("5.jpeg", "aGVsbG8=", Directory::Data)
            .await
            .unwrap();

        let platform = NativePlatform::new("http://localhost/_capacitor_file_");
        let photo = UserPhoto::new("5.jpeg", "http://stale");

        let uri = platform
            .display_uri_for_loaded(&photo, &filesystem)
            .await
            .unwrap();
        assert_eq!(uri, "data:image/jpeg;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn test_web_loaded_photo_is_trusted() {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = LocalFilesystem::new(temp_dir.path());
        let photo = UserPhoto::new("missing.jpeg", "blob:http://localhost/abc");

        let uri = WebPlatform::new()
            .display_uri_for_loaded(&photo, &filesystem)
            .await
            .unwrap();
        assert_eq!(uri, "blob:http://localhost/abc");
    }

    #[test]
    fn test_from_config() {
        let mut config = crate::config::GalleryConfig::default().platform;
        assert!(from_config(&config).is_native());

        config.mode = PlatformMode::Web;
        let platform = from_config(&config);
        assert!(!platform.is_native());
        assert_eq!(platform.name(), "web");
    }
}
