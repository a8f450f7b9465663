use super::*;
use crate::error::{CaptureError, GalleryError, Result, StorageError, TranscodeError};
use crate::events::GalleryEvent;
use crate::photo::{CapturedPhoto, FilenameGenerator, UserPhoto};
use crate::platform::{NativePlatform, Platform, WebPlatform};
use crate::services::{
    file_uri, transcode, CaptureOptions, Directory, Filesystem, LocalFilesystem,
    MemoryPreferences, MockCaptureService, Preferences, ReadFileResult, WriteFileResult,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const FILE_SERVER: &str = "http://localhost/_capacitor_file_";

struct Harness {
    temp_dir: TempDir,
    camera: MockCaptureService,
    preferences: MemoryPreferences,
    filesystem: Arc<LocalFilesystem>,
    clock: Arc<AtomicI64>,
}

impl Harness {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = Arc::new(LocalFilesystem::new(temp_dir.path().join("app")));
        Self {
            temp_dir,
            camera: MockCaptureService::new(),
            preferences: MemoryPreferences::new(),
            filesystem,
            clock: Arc::new(AtomicI64::new(1_700_000_000_000)),
        }
    }

    fn builder(&self, platform: Arc<dyn Platform>) -> PhotoGalleryBuilder {
        let clock = Arc::clone(&self.clock);
        PhotoGallery::builder()
            .with_capture_service(Arc::new(self.camera.clone()))
            .with_filesystem(self.filesystem.clone())
            .with_preferences(Arc::new(self.preferences.clone()))
            .with_platform(platform)
            .with_filenames(FilenameGenerator::with_clock(move || {
                clock.load(Ordering::SeqCst)
            }))
    }

    fn gallery(&self, platform: Arc<dyn Platform>) -> PhotoGallery {
        self.builder(platform).build().unwrap()
    }

    fn set_time(&self, millis: i64) {
        self.clock.store(millis, Ordering::SeqCst);
    }

    /// Camera output stored as a file, returned as a `file://` URI
    fn camera_file(&self, name: &str, bytes: &[u8]) -> String {
        let dir = self.temp_dir.path().join("camera");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        file_uri(&path)
    }

    fn queue_capture(&self, name: &str, bytes: &[u8]) {
        let uri = self.camera_file(name, bytes);
        self.camera.push_photo(CapturedPhoto::from_uri(uri));
    }

    fn data_path(&self, file_name: &str) -> std::path::PathBuf {
        self.filesystem.resolve(file_name, Directory::Data).unwrap()
    }

    async fn stored_index(&self) -> Vec<UserPhoto> {
        let value = self.preferences.get("photos").await.unwrap().unwrap();
        serde_json::from_str(&value).unwrap()
    }
}

fn native() -> Arc<dyn Platform> {
    Arc::new(NativePlatform::new(FILE_SERVER))
}

fn web() -> Arc<dyn Platform> {
    Arc::new(WebPlatform::new())
}

fn file_names(photos: &[UserPhoto]) -> Vec<&str> {
    photos.iter().map(|p| p.filepath.as_str()).collect()
}

async fn wait_persisted(handle: &PersistenceHandle, revision: u64) {
    timeout(Duration::from_secs(5), handle.wait_for_revision(revision))
        .await
        .expect("persistence timed out")
        .unwrap();
}

/// Filesystem whose writes always fail
struct ReadOnlyFilesystem {
    inner: Arc<LocalFilesystem>,
}

#[async_trait]
impl Filesystem for ReadOnlyFilesystem {
    async fn write_file(
        &self,
        path: &str,
        _base64_data: &str,
        _directory: Directory,
    ) -> Result<WriteFileResult> {
        Err(StorageError::Write {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        }
        .into())
    }

    async fn read_file(&self, path: &str, directory: Directory) -> Result<ReadFileResult> {
        self.inner.read_file(path, directory).await
    }
}

/// Preferences store whose writes always fail
struct BrokenPreferences;

#[async_trait]
impl Preferences for BrokenPreferences {
    async fn set(&self, _key: &str, _value: String) -> Result<()> {
        Err(StorageError::Preferences {
            details: "disk full".to_string(),
        }
        .into())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_capture_requests_uri_from_live_camera() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness.gallery(native());

    gallery.add_new_to_gallery().await.unwrap();

    assert_eq!(harness.camera.requests(), vec![CaptureOptions::default()]);
}

#[tokio::test]
async fn test_sequential_captures_newest_first() {
    let harness = Harness::new();
    let gallery = harness.gallery(native());

    for i in 0..3i64 {
        harness.set_time(1000 + i);
        harness.queue_capture(&format!("{}.jpg", i), format!("frame {}", i).as_bytes());
        assert!(gallery.add_new_to_gallery().await.is_some());
    }

    let photos = gallery.photos().await;
    assert_eq!(photos.len(), 3);
    assert_eq!(file_names(&photos), vec!["1002.jpeg", "1001.jpeg", "1000.jpeg"]);
}

#[tokio::test]
async fn test_two_captures_scenario() {
    let harness = Harness::new();
    let gallery = harness.gallery(native());
    let persistence = gallery.start_persistence();

    harness.set_time(1_700_000_000_001);
    harness.queue_capture("b1.jpg", b"bytes one");
    gallery.add_new_to_gallery().await.unwrap();

    harness.set_time(1_700_000_000_002);
    harness.queue_capture("b2.jpg", b"bytes two");
    gallery.add_new_to_gallery().await.unwrap();

    let photos = gallery.photos().await;
    assert_eq!(
        file_names(&photos),
        vec!["1700000000002.jpeg", "1700000000001.jpeg"]
    );

    wait_persisted(&persistence, 2).await;
    assert_eq!(harness.stored_index().await, photos);

    assert_eq!(
        std::fs::read(harness.data_path("1700000000001.jpeg")).unwrap(),
        b"bytes one"
    );
    assert_eq!(
        std::fs::read(harness.data_path("1700000000002.jpeg")).unwrap(),
        b"bytes two"
    );

    persistence.stop().await.unwrap();
}

#[tokio::test]
async fn test_native_save_uses_converted_file_uri() {
    let harness = Harness::new();
    harness.set_time(5000);
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness.gallery(native());

    let photo = gallery.try_add_new_to_gallery().await.unwrap();

    let stored = std::fs::canonicalize(harness.data_path("5000.jpeg")).unwrap();
    assert_eq!(photo.filepath, "5000.jpeg");
    assert_eq!(
        photo.webview_path,
        format!("{}{}", FILE_SERVER, stored.display())
    );
}

#[tokio::test]
async fn test_web_save_keeps_capture_uri_and_still_writes_file() {
    let harness = Harness::new();
    harness.set_time(6000);
    let source = harness.camera_file("a.jpg", b"frame");
    harness.camera.push_photo(CapturedPhoto {
        source_uri: Some(source),
        display_uri: Some("blob:http://localhost/1234".to_string()),
        format: "jpeg".to_string(),
    });
    let gallery = harness.gallery(web());

    let photo = gallery.try_add_new_to_gallery().await.unwrap();

    assert_eq!(photo.webview_path, "blob:http://localhost/1234");
    assert_eq!(std::fs::read(harness.data_path("6000.jpeg")).unwrap(), b"frame");
}

#[tokio::test]
async fn test_capture_rejection_leaves_gallery_unchanged() {
    let harness = Harness::new();
    let gallery = harness.gallery(native());
    let mut events = gallery.state().subscribe();

    harness.queue_capture("a.jpg", b"frame");
    gallery.add_new_to_gallery().await.unwrap();
    let before = gallery.photos().await;

    harness.camera.push_error(CaptureError::Cancelled);
    assert!(gallery.add_new_to_gallery().await.is_none());

    assert_eq!(gallery.photos().await, before);
    assert_eq!(gallery.state().revision().await, 1);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let GalleryEvent::CaptureFailed { error } = event {
            assert!(error.contains("cancelled"));
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn test_missing_source_uri_is_rejected() {
    let harness = Harness::new();
    harness.camera.push_photo(CapturedPhoto {
        source_uri: None,
        display_uri: Some("blob:http://localhost/1".to_string()),
        format: "jpeg".to_string(),
    });
    let gallery = harness.gallery(web());

    let err = gallery.try_add_new_to_gallery().await.unwrap_err();

    assert!(matches!(
        err,
        GalleryError::Capture(CaptureError::MissingSourceUri)
    ));
    assert!(gallery.state().is_empty().await);
    assert!(!harness.filesystem.root().join("data").exists());
}

#[tokio::test]
async fn test_web_capture_without_display_uri_writes_no_file() {
    let harness = Harness::new();
    harness.set_time(4242);
    let source = harness.camera_file("a.jpg", b"frame");
    harness.camera.push_photo(CapturedPhoto {
        source_uri: Some(source),
        display_uri: None,
        format: "jpeg".to_string(),
    });
    let gallery = harness.gallery(web());

    let err = gallery.try_add_new_to_gallery().await.unwrap_err();

    assert!(matches!(
        err,
        GalleryError::Capture(CaptureError::MissingDisplayUri)
    ));
    assert!(gallery.state().is_empty().await);
    assert!(!harness.data_path("4242.jpeg").exists());
}

#[tokio::test]
async fn test_empty_capture_writes_no_file() {
    let harness = Harness::new();
    harness.set_time(7000);
    harness.queue_capture("empty.jpg", b"");
    let gallery = harness.gallery(native());

    let err = gallery.try_add_new_to_gallery().await.unwrap_err();

    assert!(matches!(
        err,
        GalleryError::Transcode(TranscodeError::EmptyPayload)
    ));
    assert!(!harness.data_path("7000.jpeg").exists());
    assert_eq!(gallery.state().len().await, 0);
}

#[tokio::test]
async fn test_write_failure_leaves_gallery_unchanged() {
    let harness = Harness::new();
    harness.set_time(8000);
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness
        .builder(native())
        .with_filesystem(Arc::new(ReadOnlyFilesystem {
            inner: harness.filesystem.clone(),
        }))
        .build()
        .unwrap();

    assert!(gallery.add_new_to_gallery().await.is_none());

    assert!(!harness.data_path("8000.jpeg").exists());
    assert!(gallery.photos().await.is_empty());
}

#[tokio::test]
async fn test_load_without_saved_index() {
    let harness = Harness::new();
    let gallery = harness.gallery(native());

    assert_eq!(gallery.load_saved().await.unwrap(), 0);
    assert!(gallery.photos().await.is_empty());
}

#[tokio::test]
async fn test_web_round_trip_keeps_display_uri() {
    let harness = Harness::new();
    let source = harness.camera_file("a.jpg", b"frame");
    harness.camera.push_photo(CapturedPhoto {
        source_uri: Some(source),
        display_uri: Some("blob:http://localhost/abcd".to_string()),
        format: "jpeg".to_string(),
    });

    let gallery = harness.gallery(web());
    let persistence = gallery.start_persistence();
    let saved = gallery.add_new_to_gallery().await.unwrap();
    persistence.stop().await.unwrap();

    let restarted = harness.gallery(web());
    restarted.load_saved().await.unwrap();

    assert_eq!(restarted.photos().await, vec![saved]);
}

#[tokio::test]
async fn test_native_round_trip_inlines_stored_bytes() {
    let harness = Harness::new();
    harness.set_time(9000);
    harness.queue_capture("a.jpg", b"native frame");

    let gallery = harness.gallery(native());
    let persistence = gallery.start_persistence();
    let saved = gallery.add_new_to_gallery().await.unwrap();
    persistence.stop().await.unwrap();
    assert!(saved.webview_path.starts_with(FILE_SERVER));

    let restarted = harness.gallery(native());
    restarted.load_saved().await.unwrap();

    let photos = restarted.photos().await;
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].filepath, "9000.jpeg");
    assert_eq!(
        photos[0].webview_path,
        format!(
            "data:image/jpeg;base64,{}",
            transcode::encode_base64(b"native frame")
        )
    );
}

#[tokio::test]
async fn test_load_store_load_is_idempotent() {
    for platform in [native(), web()] {
        let harness = Harness::new();
        for i in 0..2i64 {
            harness.set_time(100 + i);
            harness.queue_capture(&format!("{}.jpg", i), format!("frame {}", i).as_bytes());
        }

        let gallery = harness.gallery(Arc::clone(&platform));
        let persistence = gallery.start_persistence();
        gallery.add_new_to_gallery().await.unwrap();
        gallery.add_new_to_gallery().await.unwrap();
        persistence.stop().await.unwrap();

        let first = harness.gallery(Arc::clone(&platform));
        first.load_saved().await.unwrap();
        let first_photos = first.photos().await;
        first.persistence().store(&first_photos).await.unwrap();

        let second = harness.gallery(Arc::clone(&platform));
        second.load_saved().await.unwrap();

        assert_eq!(second.photos().await, first_photos, "{}", platform.name());
    }
}

#[tokio::test]
async fn test_load_persists_rehydrated_gallery() {
    let harness = Harness::new();
    harness.set_time(42);
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness.gallery(native());
    gallery.add_new_to_gallery().await.unwrap();
    gallery
        .persistence()
        .store(&gallery.photos().await)
        .await
        .unwrap();

    let restarted = harness.gallery(native());
    let persistence = restarted.start_persistence();
    restarted.load_saved().await.unwrap();
    wait_persisted(&persistence, 1).await;

    let stored = harness.stored_index().await;
    assert_eq!(stored, restarted.photos().await);
    assert!(stored[0].webview_path.starts_with("data:image/jpeg;base64,"));

    persistence.stop().await.unwrap();
}

#[tokio::test]
async fn test_native_load_fails_on_missing_file() {
    let harness = Harness::new();
    let index = vec![
        UserPhoto::new("1.jpeg", "http://old/1"),
        UserPhoto::new("2.jpeg", "http://old/2"),
    ];
    harness
        .preferences
        .set("photos", serde_json::to_string(&index).unwrap())
        .await
        .unwrap();
    harness
        .filesystem
        .write_file("1.jpeg", "aGVsbG8=", Directory::Data)
        .await
        .unwrap();

    let gallery = harness.gallery(native());
    let err = gallery.load_saved().await.unwrap_err();

    assert!(matches!(err, GalleryError::Storage(StorageError::Read { .. })));
    assert!(gallery.photos().await.is_empty());
    assert_eq!(gallery.state().revision().await, 0);
}

#[tokio::test]
async fn test_web_load_does_not_touch_files() {
    let harness = Harness::new();
    let index = vec![UserPhoto::new("missing.jpeg", "blob:http://localhost/x")];
    harness
        .preferences
        .set("photos", serde_json::to_string(&index).unwrap())
        .await
        .unwrap();

    let gallery = harness.gallery(web());

    assert_eq!(gallery.load_saved().await.unwrap(), 1);
    assert_eq!(gallery.photos().await, index);
}

#[tokio::test]
async fn test_persistence_failure_is_silent() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness
        .builder(native())
        .with_preferences(Arc::new(BrokenPreferences))
        .build()
        .unwrap();
    let mut events = gallery.state().subscribe();
    let persistence = gallery.start_persistence();

    assert!(gallery.add_new_to_gallery().await.is_some());
    wait_persisted(&persistence, 1).await;

    assert_eq!(persistence.failed_writes(), 1);
    assert_eq!(gallery.photos().await.len(), 1);

    let failure = timeout(Duration::from_secs(5), async {
        loop {
            if let GalleryEvent::PersistenceFailed { revision, .. } = events.recv().await.unwrap()
            {
                return revision;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(failure, 1);

    persistence.stop().await.unwrap();
}

#[tokio::test]
async fn test_persistence_keeps_running_without_failure_observers() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"first");
    harness.queue_capture("b.jpg", b"second");
    let gallery = harness
        .builder(native())
        .with_preferences(Arc::new(BrokenPreferences))
        .build()
        .unwrap();
    let persistence = gallery.start_persistence();

    assert!(gallery.add_new_to_gallery().await.is_some());
    assert!(gallery.add_new_to_gallery().await.is_some());
    wait_persisted(&persistence, 2).await;

    assert_eq!(persistence.failed_writes(), 2);
    assert_eq!(persistence.handled_revision(), 2);
    persistence.stop().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_captures_persist_final_state() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"first");
    harness.queue_capture("b.jpg", b"second");
    let gallery = Arc::new(harness.gallery(native()));
    let persistence = gallery.start_persistence();

    let (a, b) = tokio::join!(gallery.add_new_to_gallery(), gallery.add_new_to_gallery());
    assert!(a.is_some() && b.is_some());
    // Same millisecond on the scripted clock; names must still differ
    assert_ne!(a.unwrap().filepath, b.unwrap().filepath);

    wait_persisted(&persistence, 2).await;
    let photos = gallery.photos().await;
    assert_eq!(photos.len(), 2);
    assert_eq!(harness.stored_index().await, photos);

    persistence.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_flushes_pending_snapshot() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness.gallery(native());
    let persistence = gallery.start_persistence();

    let saved = gallery.add_new_to_gallery().await.unwrap();
    persistence.stop().await.unwrap();

    assert_eq!(harness.stored_index().await, vec![saved]);
}

#[tokio::test]
async fn test_custom_index_key() {
    let harness = Harness::new();
    harness.queue_capture("a.jpg", b"frame");
    let gallery = harness
        .builder(native())
        .with_index_key("gallery_v1")
        .build()
        .unwrap();
    let persistence = gallery.start_persistence();

    gallery.add_new_to_gallery().await.unwrap();
    persistence.stop().await.unwrap();

    assert!(harness.preferences.get("gallery_v1").await.unwrap().is_some());
    assert!(harness.preferences.get("photos").await.unwrap().is_none());
}

#[test]
fn test_builder_requires_services() {
    let result = PhotoGallery::builder()
        .with_platform(web())
        .with_preferences(Arc::new(MemoryPreferences::new()))
        .build();

    assert!(matches!(result, Err(GalleryError::Component { .. })));
}

#[tokio::test]
async fn test_from_config_enables_event_debug_logging() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = crate::config::GalleryConfig::default();
    config.storage.data_dir = temp_dir.path().to_string_lossy().into_owned();

    let quiet = PhotoGalleryBuilder::from_config(&config).build().unwrap();
    assert!(!quiet.event_bus().is_debug_logging());

    config.system.debug_events = true;
    let verbose = PhotoGalleryBuilder::from_config(&config).build().unwrap();
    assert!(verbose.event_bus().is_debug_logging());
}
