//! Host services the gallery depends on.
//!
//! Each service is a trait with a fixed request/response contract so the
//! gallery flows never talk to a concrete camera, filesystem or key-value
//! store directly.
//!
//! | Trait | Local implementation |
//! |-------|----------------------|
//! | [`CaptureService`] | [`SnapshotCamera`], [`MockCaptureService`] |
//! | [`BlobFetcher`] | [`UriFetcher`] |
//! | [`Filesystem`] | [`LocalFilesystem`] |
//! | [`Preferences`] | [`FilePreferences`], [`MemoryPreferences`] |

mod camera;
mod fetch;
mod filesystem;
mod mock;
mod preferences;
pub mod transcode;

pub use camera::{CameraSource, CaptureOptions, CaptureService, ResultType, SnapshotCamera};
pub use fetch::{mime_type_for_path, Blob, BlobFetcher, UriFetcher};
pub use filesystem::{Directory, Filesystem, LocalFilesystem, ReadFileResult, WriteFileResult};
pub use mock::MockCaptureService;
pub use preferences::{FilePreferences, MemoryPreferences, Preferences};

use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// `file://` URI for an absolute path
pub fn file_uri(path: &Path) -> String {
    format!("{}{}", FILE_SCHEME, path.display())
}

/// Local path referenced by a `file://` URI
pub fn path_from_file_uri(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix(FILE_SCHEME)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}
