use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GalleryConfig {
    pub storage: StorageConfig,
    pub platform: PlatformConfig,
    pub capture: CaptureConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Root of the app-private storage area
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// File (under data_dir) backing the key-value preferences store
    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,

    /// Preferences key holding the gallery index
    #[serde(default = "default_index_key")]
    pub index_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlatformConfig {
    /// Host context the gallery runs in
    #[serde(default = "default_platform_mode")]
    pub mode: PlatformMode,

    /// Prefix that replaces `file://` when converting storage URIs for display
    #[serde(default = "default_file_server_url")]
    pub file_server_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Image file kept current by the camera process
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Requested capture quality (0-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Log every published gallery event at debug level
    #[serde(default)]
    pub debug_events: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlatformMode {
    Native,
    Web,
}

impl std::str::FromStr for PlatformMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(PlatformMode::Native),
            "web" => Ok(PlatformMode::Web),
            other => Err(format!("unknown platform mode '{}'", other)),
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join(&self.preferences_file)
    }
}

impl GalleryConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("gallery.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("storage.data_dir", default_data_dir())?
            .set_default("storage.preferences_file", default_preferences_file())?
            .set_default("storage.index_key", default_index_key())?
            .set_default("platform.mode", "native")?
            .set_default("platform.file_server_url", default_file_server_url())?
            .set_default("capture.snapshot_path", default_snapshot_path())?
            .set_default("capture.quality", default_quality() as i64)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("system.debug_events", false)?
            .add_source(File::with_name(&path_str).required(false))
            // e.g. PHOTO_GALLERY_STORAGE__DATA_DIR
            .add_source(
                Environment::with_prefix("PHOTO_GALLERY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: GalleryConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage data_dir must not be empty".to_string(),
            ));
        }

        if self.storage.index_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage index_key must not be empty".to_string(),
            ));
        }

        if self.storage.preferences_file.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage preferences_file must not be empty".to_string(),
            ));
        }

        if self.capture.quality > 100 {
            return Err(ConfigError::Message(
                "Capture quality must be between 0 and 100".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: default_data_dir(),
                preferences_file: default_preferences_file(),
                index_key: default_index_key(),
            },
            platform: PlatformConfig {
                mode: default_platform_mode(),
                file_server_url: default_file_server_url(),
            },
            capture: CaptureConfig {
                snapshot_path: default_snapshot_path(),
                quality: default_quality(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                debug_events: false,
            },
        }
    }
}

// Default value functions
fn default_data_dir() -> String {
    "./gallery-data".to_string()
}
fn default_preferences_file() -> String {
    "preferences.json".to_string()
}
fn default_index_key() -> String {
    "photos".to_string()
}

fn default_platform_mode() -> PlatformMode {
    PlatformMode::Native
}
fn default_file_server_url() -> String {
    "http://localhost/_capacitor_file_".to_string()
}

fn default_snapshot_path() -> String {
    "./snapshot.jpg".to_string()
}
fn default_quality() -> u8 {
    100
}

fn default_event_bus_capacity() -> usize {
    64
}
