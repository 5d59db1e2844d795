//! Persisted synchronization record
//!
//! The only state that survives between sync passes: the manifest version
//! last synchronized and the items that failed during that pass. It is
//! written once, after a pass completes, and never mid-pass.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::app::models::ItemKey;
use crate::constants::{cache::APP_DIR, files, settings};
use crate::errors::{SettingsError, SettingsResult};

/// What the last completed sync pass achieved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    /// Manifest version of the last completed pass; 0 means never synced
    #[serde(default)]
    pub last_synced_version: u64,
    /// Items that failed in that pass and should be retried
    #[serde(default)]
    pub pending_retries: Vec<ItemKey>,
}

impl SyncRecord {
    pub fn new(last_synced_version: u64, pending_retries: Vec<ItemKey>) -> Self {
        Self {
            last_synced_version,
            pending_retries,
        }
    }

    /// Whether a pass against `version` would have nothing to do
    pub fn is_current(&self, version: u64) -> bool {
        version != 0 && self.last_synced_version == version && self.pending_retries.is_empty()
    }
}

/// Storage for the sync record
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the record; a missing record is the default one
    async fn load(&self) -> SettingsResult<SyncRecord>;

    /// Replace the record atomically
    async fn store(&self, record: &SyncRecord) -> SettingsResult<()>;

    /// Forget everything
    async fn reset(&self) -> SettingsResult<()> {
        self.store(&SyncRecord::default()).await
    }
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{config_dir}/wallpaper-fetcher/sync-state.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(settings::SYNC_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> SettingsResult<SyncRecord> {
        match fs::read(&self.path).await {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(record) => Ok(record),
                Err(e) => {
                    warn!(
                        "Sync record at {} is corrupt ({}), starting fresh",
                        self.path.display(),
                        e
                    );
                    Ok(SyncRecord::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SyncRecord::default()),
            Err(e) => Err(self.io_error(&self.path, e)),
        }
    }

    async fn store(&self, record: &SyncRecord) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(parent, e))?;
        }

        let content = serde_json::to_vec_pretty(record)?;
        let mut temp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        temp_name.push(files::TEMP_FILE_SUFFIX);
        let temp_path = self.path.with_file_name(temp_name);

        fs::write(&temp_path, &content)
            .await
            .map_err(|e| self.io_error(&temp_path, e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(&self.path, e))?;

        debug!(
            "Stored sync record v{} with {} pending retries",
            record.last_synced_version,
            record.pending_retries.len()
        );
        Ok(())
    }
}

/// In-memory store for tests and embedders without persistence
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    record: RwLock<SyncRecord>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SyncRecord) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> SettingsResult<SyncRecord> {
        Ok(self.record.read().await.clone())
    }

    async fn store(&self, record: &SyncRecord) -> SettingsResult<()> {
        *self.record.write().await = record.clone();
        Ok(())
    }
}
