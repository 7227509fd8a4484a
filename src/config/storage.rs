//! Saved profiles on disk
//!
//! One JSON file, `~/.sash/sessions.json`. Saves go through a temp file and a
//! rename so a crash never leaves half a file behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::types::{ConfigFile, CONFIG_VERSION};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine home directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// `~/.sash`
pub fn config_dir() -> Result<PathBuf, StorageError> {
    dirs::home_dir()
        .map(|home| home.join(".sash"))
        .ok_or(StorageError::NoConfigDir)
}

pub fn sessions_file() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("sessions.json"))
}

pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self::with_path(sessions_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved profiles, or an empty set when there is no file yet.
    ///
    /// An unreadable file is moved aside (`sessions.json.corrupt-<timestamp>`)
    /// and treated as empty, so the next save does not overwrite it.
    pub async fn load(&self) -> Result<ConfigFile, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved profiles at {:?}", self.path);
                return Ok(ConfigFile::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = match serde_json::from_str::<ConfigFile>(&contents) {
            Ok(config) => config,
            Err(e) => {
                let aside = self.quarantine().await?;
                warn!("Saved profiles unreadable ({}), moved to {:?}", e, aside);
                return Ok(ConfigFile::default());
            }
        };

        if config.version > CONFIG_VERSION {
            return Err(StorageError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    pub async fn save(&self, config: &ConfigFile) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let json = serde_json::to_vec_pretty(config)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} profiles to {:?}", config.sessions.len(), self.path);
        Ok(())
    }

    async fn quarantine(&self) -> Result<PathBuf, StorageError> {
        let aside = self.path.with_extension(format!(
            "json.corrupt-{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));
        fs::rename(&self.path, &aside).await?;
        Ok(aside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SessionConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_without_file() {
        let temp = tempdir().unwrap();
        let storage = ConfigStorage::with_path(temp.path().join("sessions.json"));

        let config = storage.load().await.unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_round_trips() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("sessions.json");
        let storage = ConfigStorage::with_path(path.clone());

        let mut config = ConfigFile::default();
        config.upsert(SessionConfig::new("lab", "10.0.0.5", "ops"));
        storage.save(&config).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(storage.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_moved_aside() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let storage = ConfigStorage::with_path(path.clone());
        let config = storage.load().await.unwrap();
        assert!(config.sessions.is_empty());
        assert!(!path.exists());

        let aside: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .collect();
        assert_eq!(aside.len(), 1);
        assert_eq!(
            std::fs::read_to_string(aside[0].path()).unwrap(),
            "{ not json"
        );
    }

    #[tokio::test]
    async fn test_newer_version_is_refused() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        tokio::fs::write(&path, r#"{"version": 99, "sessions": []}"#)
            .await
            .unwrap();

        let storage = ConfigStorage::with_path(path);
        assert!(matches!(
            storage.load().await,
            Err(StorageError::VersionTooNew { found: 99, .. })
        ));
    }
}
