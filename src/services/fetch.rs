use crate::error::{Result, StorageError, TranscodeError};
use crate::services::{path_from_file_uri, transcode};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// Binary payload pulled from a capture reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
    pub mime_type: String,
}

impl Blob {
    pub fn new<B: Into<Bytes>, S: Into<String>>(data: B, mime_type: S) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Fetch-by-URI returning a binary payload
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Blob>;
}

/// Fetches `file://` and `data:` URIs
#[derive(Debug, Clone, Default)]
pub struct UriFetcher;

impl UriFetcher {
    pub fn new() -> Self {
        Self
    }

    async fn fetch_file(&self, uri: &str) -> Result<Blob> {
        let path = path_from_file_uri(uri).ok_or_else(|| TranscodeError::UnsupportedUri {
            uri: uri.to_string(),
        })?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::Fetch {
                uri: uri.to_string(),
                source: e,
            })?;

        debug!("Fetched {} bytes from {}", data.len(), path.display());
        Ok(Blob::new(data, mime_type_for_path(&path)))
    }

    fn fetch_data(&self, uri: &str) -> Result<Blob> {
        let rest = &uri["data:".len()..];
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| TranscodeError::MalformedDataUri {
                details: "missing ',' separator".to_string(),
            })?;

        let (mime_type, is_base64) = match header.strip_suffix(";base64") {
            Some(mime_type) => (mime_type, true),
            None => (header, false),
        };
        let mime_type = if mime_type.is_empty() {
            "text/plain"
        } else {
            mime_type
        };

        let data = if is_base64 {
            transcode::decode_base64(payload)?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Blob::new(data, mime_type))
    }
}

#[async_trait]
impl BlobFetcher for UriFetcher {
    async fn fetch(&self, uri: &str) -> Result<Blob> {
        if uri.starts_with("file://") {
            self.fetch_file(uri).await
        } else if uri.starts_with("data:") {
            self.fetch_data(uri)
        } else {
            Err(TranscodeError::UnsupportedUri {
                uri: uri.to_string(),
            }
            .into())
        }
    }
}

/// Media type guessed from a file extension
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
