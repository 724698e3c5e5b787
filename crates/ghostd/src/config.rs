//! Service configuration.
//!
//! Read from `$XDG_CONFIG_HOME/ghostwatch/config.toml`. A missing file
//! means defaults; a missing key means that key's default.
//!
//! Environment overrides:
//! - `GHOSTWATCH_CONFIG` - alternate config file path
//! - `GHOSTWATCH_DATA_DIR` - alternate data directory

use crate::error::{ServiceError, ServiceResult};
use ghost_core::OVERDUE_THRESHOLD_DAYS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const APP_DIR: &str = "ghostwatch";
pub const CONFIG_FILE: &str = "config.toml";
pub const SETTINGS_FILE: &str = "settings.json";
pub const SNAPSHOT_FILE: &str = "chats.json";

pub const CONFIG_PATH_ENV: &str = "GHOSTWATCH_CONFIG";
pub const DATA_DIR_ENV: &str = "GHOSTWATCH_DATA_DIR";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 90;
pub const DEFAULT_PLATFORM_BASE_URL: &str = "http://localhost:23373";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Holds `settings.json` and the `chats.json` snapshot
    pub data_dir: PathBuf,

    pub refresh_interval_secs: u64,

    /// How long a loaded chat snapshot is reused
    pub cache_ttl_secs: u64,

    pub overdue_threshold_days: u32,

    /// Base URL of the chat platform, used for media downloads
    pub platform_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            overdue_threshold_days: OVERDUE_THRESHOLD_DAYS,
            platform_base_url: DEFAULT_PLATFORM_BASE_URL.to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default config path, honouring `GHOSTWATCH_CONFIG`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

impl Config {
    /// Loads configuration from `path`, or the default location when `None`.
    ///
    /// `GHOSTWATCH_DATA_DIR` is applied after the file is read.
    ///
    /// # Errors
    ///
    /// `ServiceError::Config` if the file exists but is not valid TOML,
    /// `ServiceError::Io` if it exists but cannot be read.
    pub fn load(path: Option<&Path>) -> ServiceResult<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);
        let mut config = Self::from_file(&path)?;
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        debug!(
            path = %path.display(),
            data_dir = %config.data_dir.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reads one file without consulting the environment.
    pub fn from_file(path: &Path) -> ServiceResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ServiceError::io(path, e)),
        }
    }

    fn from_toml(text: &str, path: &Path) -> ServiceResult<Self> {
        toml::from_str(text).map_err(|e| ServiceError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
