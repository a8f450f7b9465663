//! Photo records and the captured-photo handoff type.
//!
//! [`UserPhoto`] is the persisted unit. Its JSON shape is fixed to
//! `{"filepath": ..., "webviewPath": ...}` so an index written by one host can
//! be read by another.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Extension appended to every generated photo file name
pub const PHOTO_EXTENSION: &str = "jpeg";

/// Media type used when rebuilding inline display URIs from stored bytes
pub const PHOTO_MEDIA_TYPE: &str = "image/jpeg";

/// A photo stored in the gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPhoto {
    /// File name of the raw image in app-private storage
    pub filepath: String,
    /// URI the display layer can load directly
    #[serde(rename = "webviewPath")]
    pub webview_path: String,
}

impl UserPhoto {
    pub fn new<P: Into<String>, W: Into<String>>(filepath: P, webview_path: W) -> Self {
        Self {
            filepath: filepath.into(),
            webview_path: webview_path.into(),
        }
    }

    /// Inline data URI for base64 image bytes read back from storage
    pub fn inline_display_uri(base64_data: &str) -> String {
        format!("data:{};base64,{}", PHOTO_MEDIA_TYPE, base64_data)
    }
}

/// Result returned by a capture service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturedPhoto {
    /// Reference to the image data, fetched by the save flow
    pub source_uri: Option<String>,
    /// URI the display layer can use before the photo is persisted
    pub display_uri: Option<String>,
    /// Image format reported by the service (e.g. "jpeg")
    pub format: String,
}

impl CapturedPhoto {
    /// A captured photo whose source and display URIs are the same reference
    pub fn from_uri<S: Into<String>>(uri: S) -> Self {
        let uri = uri.into();
        Self {
            source_uri: Some(uri.clone()),
            display_uri: Some(uri),
            format: PHOTO_EXTENSION.to_string(),
        }
    }
}

type ClockFn = dyn Fn() -> i64 + Send + Sync;

/// Generates `<epoch-millis>.jpeg` file names.
///
/// Names are strictly increasing within one generator: a capture landing in
/// the same millisecond as the previous one is named one millisecond later.
#[derive(Clone)]
pub struct FilenameGenerator {
    clock: Arc<ClockFn>,
    last_issued: Arc<Mutex<i64>>,
}

impl FilenameGenerator {
    /// Generator driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(|| Utc::now().timestamp_millis())
    }

    /// Generator driven by a custom millisecond clock
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            clock: Arc::new(clock),
            last_issued: Arc::new(Mutex::new(i64::MIN)),
        }
    }

    /// Next unique file name
    pub fn next_name(&self) -> String {
        let now = (self.clock)();
        let mut last = self.last_issued.lock();
        let millis = if now > *last { now } else { *last + 1 };
        *last = millis;
        format!("{}.{}", millis, PHOTO_EXTENSION)
    }
}

impl Default for FilenameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FilenameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilenameGenerator")
            .field("last_issued", &*self.last_issued.lock())
            .finish()
    }
}
