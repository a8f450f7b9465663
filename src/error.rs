use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl GalleryError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by a capture service or detected in its result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capture cancelled by user")]
    Cancelled,

    #[error("Camera access denied: {details}")]
    Denied { details: String },

    #[error("Camera unavailable: {details}")]
    Unavailable { details: String },

    #[error("Unsupported capture source: {source_name}")]
    UnsupportedSource { source_name: String },

    #[error("Captured photo has no source URI")]
    MissingSourceUri,

    #[error("Captured photo has no display URI")]
    MissingDisplayUri,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscodeError {
    #[error("Unsupported URI scheme: {uri}")]
    UnsupportedUri { uri: String },

    #[error("Malformed data URI: {details}")]
    MalformedDataUri { details: String },

    #[error("No base64 payload after stripping data URI prefix")]
    EmptyPayload,

    #[error("Invalid base64 payload: {details}")]
    InvalidBase64 { details: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to fetch {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },

    #[error("Preferences store error: {details}")]
    Preferences { details: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, GalleryError>;
