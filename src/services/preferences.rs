use crate::error::{Result, StorageError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Persistent string-keyed storage
#[async_trait]
pub trait Preferences: Send + Sync {
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// `None` when the key has never been set
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Preferences persisted as one JSON object file
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FilePreferences {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                StorageError::Preferences {
                    details: format!("{}: {}", self.path.display(), e),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Read {
                path: self.path.display().to_string(),
                source: e,
            }
            .into()),
        }
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(values)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write {
                    path: parent.display().to_string(),
                    source: e,
                })?;
        }

        let temp_path = self.path.with_extension("json.part");
        fs::write(&temp_path, contents)
            .await
            .map_err(|e| StorageError::Write {
                path: temp_path.display().to_string(),
                source: e,
            })?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::Write {
                path: self.path.display().to_string(),
                source: e,
            })?;

        Ok(())
    }
}

#[async_trait]
impl Preferences for FilePreferences {
    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value);
        self.write_all(&values).await?;

        debug!("Stored preference '{}' in {}", key, self.path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.read_all().await?;
        Ok(values.get(key).cloned())
    }
}

/// In-memory preferences, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Preferences for MemoryPreferences {
    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }
}
