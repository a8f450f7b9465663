use crate::error::{Result, StorageError};
use crate::services::{file_uri, transcode};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Storage namespace a file lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directory {
    /// Durable app-private data
    Data,
    /// App-private scratch space the host may clear
    Cache,
}

impl Directory {
    fn dir_name(&self) -> &'static str {
        match self {
            Directory::Data => "data",
            Directory::Cache => "cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFileResult {
    /// URI of the written file
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFileResult {
    /// File contents as base64 text
    pub data: String,
}

/// Host filesystem exchanging file contents as base64 text
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Decode `base64_data` and write it to `path`, replacing any existing file
    async fn write_file(
        &self,
        path: &str,
        base64_data: &str,
        directory: Directory,
    ) -> Result<WriteFileResult>;

    /// Read `path` and return its contents as base64 text
    async fn read_file(&self, path: &str, directory: Directory) -> Result<ReadFileResult>;
}

/// Filesystem rooted at a local directory.
///
/// Writes land in a temporary sibling first and are renamed into place, so a
/// failed write never leaves a file at the target path.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path a relative file name maps to
    pub fn resolve(&self, path: &str, directory: Directory) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath {
                path: path.to_string(),
            }
            .into());
        }

        Ok(self.root.join(directory.dir_name()).join(relative))
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn write_file(
        &self,
        path: &str,
        base64_data: &str,
        directory: Directory,
    ) -> Result<WriteFileResult> {
        let target = self.resolve(path, directory)?;
        let bytes = transcode::decode_base64(base64_data)?;

        let parent = target
            .parent()
            .ok_or_else(|| StorageError::InvalidPath {
                path: path.to_string(),
            })?
            .to_path_buf();
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| StorageError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;

        let file_name = target
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("file");
        let temp_path = parent.join(format!(".{}.part", file_name));

        let written = async {
            fs::write(&temp_path, &bytes).await?;
            fs::rename(&temp_path, &target).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Failed to remove partial file {}: {}",
                        temp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(StorageError::Write {
                path: target.display().to_string(),
                source: e,
            }
            .into());
        }

        let absolute = fs::canonicalize(&target)
            .await
            .map_err(|e| StorageError::Read {
                path: target.display().to_string(),
                source: e,
            })?;

        debug!("Wrote {} bytes to {}", bytes.len(), absolute.display());
        Ok(WriteFileResult {
            uri: file_uri(&absolute),
        })
    }

    async fn read_file(&self, path: &str, directory: Directory) -> Result<ReadFileResult> {
        let target = self.resolve(path, directory)?;
        let bytes = fs::read(&target).await.map_err(|e| StorageError::Read {
            path: target.display().to_string(),
            source: e,
        })?;

        debug!("Read {} bytes from {}", bytes.len(), target.display());
        Ok(ReadFileResult {
            data: transcode::encode_base64(&bytes),
        })
    }
}
