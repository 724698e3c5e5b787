//! File-backed settings document.

use crate::error::{ServiceError, ServiceResult};
use ghost_core::Settings;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and replaces `settings.json`.
///
/// Saves are whole-document: the new document is written to a sibling
/// temp file and renamed over the old one, so readers never see a
/// half-written file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// `ServiceError::Io` when the file exists but cannot be read,
    /// `ServiceError::Malformed` when it is not a settings document.
    pub async fn load(&self) -> ServiceResult<Settings> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(ServiceError::io(&self.path, e)),
        };
        serde_json::from_str(&text).map_err(|source| ServiceError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the stored document.
    pub async fn save(&self, settings: &Settings) -> ServiceResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::io(parent, e))?;
        }

        let payload = serde_json::to_string_pretty(settings).map_err(|source| {
            ServiceError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|e| ServiceError::io(&temp_path, e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| ServiceError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            people = settings.people.len(),
            "Settings saved"
        );
        Ok(())
    }
}
