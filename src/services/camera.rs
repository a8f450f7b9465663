use crate::error::{CaptureError, Result, StorageError};
use crate::photo::{CapturedPhoto, PHOTO_EXTENSION};
use crate::services::fetch::mime_type_for_path;
use crate::services::{file_uri, transcode};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info};

/// Shape of the data a capture service hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    /// A reference URI to the image data
    Uri,
    /// Inline `data:` URL
    DataUrl,
}

/// Where the image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    /// Live camera
    Camera,
    /// Existing photo library
    Photos,
}

impl CameraSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraSource::Camera => "camera",
            CameraSource::Photos => "photos",
        }
    }
}

/// Options sent with every capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub result_type: ResultType,
    pub source: CameraSource,
    /// 0-100
    pub quality: u8,
}

impl CaptureOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            result_type: ResultType::Uri,
            source: CameraSource::Camera,
            quality: 100,
        }
    }
}

/// Host camera access
#[async_trait]
pub trait CaptureService: Send + Sync {
    /// Capture a photo. Rejects on user cancellation or device failure.
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CapturedPhoto>;

    /// Name used in log output
    fn service_name(&self) -> &str;
}

/// Capture service backed by a snapshot file that an external camera process
/// keeps current.
///
/// Each capture copies the snapshot into a scratch directory so the returned
/// reference stays stable while the camera keeps writing.
pub struct SnapshotCamera {
    snapshot_path: PathBuf,
    scratch_dir: PathBuf,
    capture_counter: AtomicU64,
}

impl SnapshotCamera {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(snapshot_path: P, scratch_dir: Q) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            scratch_dir: scratch_dir.as_ref().to_path_buf(),
            capture_counter: AtomicU64::new(0),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    async fn copy_snapshot(&self) -> Result<PathBuf> {
        let metadata = fs::metadata(&self.snapshot_path)
            .await
            .map_err(|e| snapshot_error(&self.snapshot_path, e))?;
        if !metadata.is_file() {
            return Err(CaptureError::Unavailable {
                details: format!("{} is not a file", self.snapshot_path.display()),
            }
            .into());
        }

        fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| StorageError::Write {
                path: self.scratch_dir.display().to_string(),
                source: e,
            })?;
        let scratch_dir = fs::canonicalize(&self.scratch_dir)
            .await
            .map_err(|e| StorageError::Read {
                path: self.scratch_dir.display().to_string(),
                source: e,
            })?;

        let sequence = self.capture_counter.fetch_add(1, Ordering::Relaxed);
        let extension = self
            .snapshot_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(PHOTO_EXTENSION);
        // Earlier sessions' captures may still be referenced by a web index
        let target = scratch_dir.join(format!(
            "capture-{}-{}.{}",
            Utc::now().timestamp_millis(),
            sequence,
            extension
        ));

        fs::copy(&self.snapshot_path, &target)
            .await
            .map_err(|e| StorageError::Write {
                path: target.display().to_string(),
                source: e,
            })?;

        debug!(
            "Copied snapshot {} to {}",
            self.snapshot_path.display(),
            target.display()
        );
        Ok(target)
    }
}

/// Permission failures surface as a denied camera, anything else as unavailable
fn snapshot_error(path: &Path, error: std::io::Error) -> CaptureError {
    let details = format!("{}: {}", path.display(), error);
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => CaptureError::Denied { details },
        _ => CaptureError::Unavailable { details },
    }
}

#[async_trait]
impl CaptureService for SnapshotCamera {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CapturedPhoto> {
        if options.source != CameraSource::Camera {
            return Err(CaptureError::UnsupportedSource {
                source_name: options.source.as_str().to_string(),
            }
            .into());
        }

        let captured_path = self.copy_snapshot().await?;
        let format = captured_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(PHOTO_EXTENSION)
            .to_string();

        let photo = match options.result_type {
            ResultType::Uri => CapturedPhoto {
                format,
                ..CapturedPhoto::from_uri(file_uri(&captured_path))
            },
            ResultType::DataUrl => {
                let bytes = fs::read(&captured_path).await.map_err(|e| StorageError::Read {
                    path: captured_path.display().to_string(),
                    source: e,
                })?;
                let data_url = format!(
                    "data:{};base64,{}",
                    mime_type_for_path(&captured_path),
                    transcode::encode_base64(&bytes)
                );
                CapturedPhoto {
                    format,
                    ..CapturedPhoto::from_uri(data_url)
                }
            }
        };

        info!("Captured photo from snapshot {}", self.snapshot_path.display());
        Ok(photo)
    }

    fn service_name(&self) -> &str {
        "snapshot_camera"
    }
}
