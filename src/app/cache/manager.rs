//! Tiered cache with atomic disk writes and per-item locking
//!
//! Lookups go memory first, then disk; a disk hit is promoted into memory.
//! Item bytes and their validators are replaced together through temp files
//! and renames, under the item's lock. A cache-wide gate lets `clear_all`
//! exclude every item operation while it wipes the directory.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::app::bundled::BundledAssets;
use crate::app::models::{ItemKey, Tier, Validators};
use crate::constants::cache::APP_DIR;
use crate::constants::files::TEMP_FILE_SUFFIX;
use crate::errors::{CacheError, CacheResult};

use super::config::CacheConfig;
use super::locks::KeyedLocks;
use super::memory::MemoryTier;
use super::path::PathGenerator;
use super::stats::{CacheStats, DirectoryScanner};

/// A cache lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit {
    pub bytes: Bytes,
    /// `Tier::Memory` or `Tier::Disk`
    pub tier: Tier,
}

/// Memory + disk cache for wallpaper bytes and their validators
pub struct TieredCache {
    config: CacheConfig,
    cache_root: PathBuf,
    memory: Mutex<MemoryTier>,
    locks: KeyedLocks,
    /// Item operations hold this for reading, `clear_all` for writing
    gate: RwLock<()>,
    bundle: Arc<dyn BundledAssets>,
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("cache_root", &self.cache_root)
            .field("memory_capacity", &self.config.memory_capacity)
            .finish()
    }
}

impl TieredCache {
    /// Create a new cache, creating its directories if necessary
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DirectoryNotAccessible` if the cache directory
    /// cannot be created
    pub async fn new(config: CacheConfig, bundle: Arc<dyn BundledAssets>) -> CacheResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_dir()?,
        };

        Self::ensure_directory_exists(&PathGenerator::metadata_dir(&cache_root)).await?;
        Self::sweep_temp_files(&cache_root).await;

        info!("Initialized item cache with root: {}", cache_root.display());

        Ok(Self {
            memory: Mutex::new(MemoryTier::new(config.memory_capacity)),
            config,
            cache_root,
            locks: KeyedLocks::new(),
            gate: RwLock::new(()),
            bundle,
        })
    }

    /// Get the cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Bundle consulted by staleness checks
    pub fn bundle(&self) -> &Arc<dyn BundledAssets> {
        &self.bundle
    }

    /// Get the default cache directory for the current OS
    ///
    /// - macOS: ~/Library/Caches/wallpaper-fetcher
    /// - Linux: ~/.cache/wallpaper-fetcher
    /// - Windows: %LOCALAPPDATA%/wallpaper-fetcher
    pub fn get_default_cache_dir() -> CacheResult<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })?
            .join(APP_DIR);

        Ok(cache_dir)
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                }
            })?;
            debug!("Created cache directory: {}", path.display());
        }
        Ok(())
    }

    /// Remove temp files left by writes that never reached their rename
    async fn sweep_temp_files(cache_root: &Path) {
        let dirs = [
            PathGenerator::item_dir(cache_root),
            PathGenerator::metadata_dir(cache_root),
        ];
        for dir in dirs {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to read {}: {}", dir.display(), e);
                    continue;
                }
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                let is_temp = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(TEMP_FILE_SUFFIX));
                if !is_temp {
                    continue;
                }
                match fs::remove_file(&path).await {
                    Ok(()) => debug!("Removed stale temp file {}", path.display()),
                    Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        }
    }

    fn item_path(&self, name: &str) -> PathBuf {
        PathGenerator::item_path(&self.cache_root, name)
    }

    /// Look up an item in memory, then on disk
    ///
    /// A disk hit is promoted into memory. Never touches the network.
    pub async fn get(&self, name: &str) -> Option<CacheHit> {
        if let Err(e) = PathGenerator::validate_name(name) {
            warn!("{}", e);
            return None;
        }
        let _gate = self.gate.read().await;

        if let Some(bytes) = self.memory.lock().await.get(name) {
            debug!("Memory hit: {}", name);
            return Some(CacheHit {
                bytes,
                tier: Tier::Memory,
            });
        }

        let _item = self.locks.lock(name).await;
        let path = self.item_path(name);
        match fs::read(&path).await {
            Ok(data) if !data.is_empty() => {
                let bytes = Bytes::from(data);
                self.memory.lock().await.insert(name, bytes.clone());
                debug!("Disk hit: {}", name);
                Some(CacheHit {
                    bytes,
                    tier: Tier::Disk,
                })
            }
            Ok(_) => {
                warn!("Ignoring empty cache file: {}", path.display());
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Presence in memory or on disk, without promotion
    pub async fn contains(&self, name: &str) -> bool {
        if PathGenerator::validate_name(name).is_err() {
            return false;
        }
        let _gate = self.gate.read().await;
        if self.memory.lock().await.contains(name) {
            return true;
        }
        self.on_disk(name).await
    }

    async fn on_disk(&self, name: &str) -> bool {
        fs::metadata(self.item_path(name))
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Store bytes in memory and on disk with unknown freshness
    pub async fn put(&self, name: &str, bytes: Bytes) -> CacheResult<()> {
        self.put_with_validators(name, bytes, &Validators::default())
            .await
    }

    /// Store bytes together with the validators of the response they came from
    ///
    /// Validators absent from `validators` are removed, so a stored validator
    /// always belongs to the stored bytes.
    pub async fn put_with_validators(
        &self,
        name: &str,
        bytes: Bytes,
        validators: &Validators,
    ) -> CacheResult<()> {
        PathGenerator::validate_name(name)?;
        let _gate = self.gate.read().await;
        let _item = self.locks.lock(name).await;

        Self::ensure_directory_exists(&PathGenerator::metadata_dir(&self.cache_root)).await?;

        let item_path = self.item_path(name);
        let etag_path = PathGenerator::etag_path(&self.cache_root, name);
        let lastmod_path = PathGenerator::last_modified_path(&self.cache_root, name);

        let item_tmp = Self::write_temp(&item_path, &bytes).await?;
        let mut staged = Vec::new();
        for (path, value) in [
            (&etag_path, &validators.etag),
            (&lastmod_path, &validators.last_modified),
        ] {
            match value {
                Some(value) => {
                    let tmp = Self::write_temp(path, value.as_bytes()).await?;
                    staged.push((tmp, path.clone()));
                }
                None => Self::remove_if_exists(path).await?,
            }
        }

        Self::commit(&item_tmp, &item_path).await?;
        for (tmp, path) in &staged {
            Self::commit(tmp, path).await?;
        }

        self.memory.lock().await.insert(name, bytes);
        debug!(
            "Stored {} (etag: {}, last-modified: {})",
            name,
            validators.etag.is_some(),
            validators.last_modified.is_some()
        );
        Ok(())
    }

    async fn write_temp(final_path: &Path, content: &[u8]) -> CacheResult<PathBuf> {
        let temp_path = PathGenerator::temp_path(final_path);
        fs::write(&temp_path, content)
            .await
            .map_err(|source| CacheError::Io {
                path: temp_path.clone(),
                source,
            })?;
        Ok(temp_path)
    }

    async fn commit(temp_path: &Path, final_path: &Path) -> CacheResult<()> {
        fs::rename(temp_path, final_path).await.map_err(|e| {
            error!("Failed to rename temporary file: {}", e);
            CacheError::AtomicOperationFailed {
                temp_path: temp_path.to_path_buf(),
                final_path: final_path.to_path_buf(),
            }
        })
    }

    async fn remove_if_exists(path: &Path) -> CacheResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Put bytes into the memory tier only (used for bundled hits)
    pub async fn promote(&self, name: &str, bytes: Bytes) {
        if PathGenerator::validate_name(name).is_ok() {
            self.memory.lock().await.insert(name, bytes);
        }
    }

    /// Stored validators; unreadable or missing files count as unknown
    pub async fn validators(&self, name: &str) -> Validators {
        if PathGenerator::validate_name(name).is_err() {
            return Validators::default();
        }
        let read = |path: PathBuf| async move {
            match fs::read_to_string(&path).await {
                Ok(value) => Some(value.trim().to_string()),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => {
                    warn!("Unreadable validator {}: {}", path.display(), e);
                    None
                }
            }
        };
        Validators::new(
            read(PathGenerator::etag_path(&self.cache_root, name)).await,
            read(PathGenerator::last_modified_path(&self.cache_root, name)).await,
        )
    }

    /// Whether the origin holds different content than the disk copy
    ///
    /// Bundled items are never stale and an item without a disk entry always
    /// is. Otherwise `probe` supplies the origin's current validators; a
    /// failed probe returns empty validators and counts as not stale.
    pub async fn is_stale<F, Fut>(&self, key: &ItemKey, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Validators>,
    {
        if self.bundle.contains(key).await {
            return false;
        }
        let name = key.canonical_name();
        if !self.on_disk(&name).await {
            return true;
        }

        let local = self.validators(&name).await;
        let remote = probe().await;
        let stale = local.differs_from(&remote);
        debug!(
            "Staleness of {}: {} (local {:?}, remote {:?})",
            name, stale, local, remote
        );
        stale
    }

    /// Remove an item from both tiers together with its validators
    pub async fn force_invalidate(&self, name: &str) -> CacheResult<()> {
        PathGenerator::validate_name(name)?;
        let _gate = self.gate.read().await;
        let _item = self.locks.lock(name).await;

        self.memory.lock().await.remove(name);
        Self::remove_if_exists(&self.item_path(name)).await?;
        Self::remove_if_exists(&PathGenerator::etag_path(&self.cache_root, name)).await?;
        Self::remove_if_exists(&PathGenerator::last_modified_path(&self.cache_root, name))
            .await?;

        debug!("Invalidated {}", name);
        Ok(())
    }

    /// Wipe the item directory and the memory tier
    pub async fn clear_all(&self) -> CacheResult<()> {
        let _gate = self.gate.write().await;

        self.memory.lock().await.clear();
        let item_dir = PathGenerator::item_dir(&self.cache_root);
        match fs::remove_dir_all(&item_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::Io {
                    path: item_dir,
                    source,
                })
            }
        }
        Self::ensure_directory_exists(&PathGenerator::metadata_dir(&self.cache_root)).await?;

        info!("Cleared item cache at {}", item_dir.display());
        Ok(())
    }

    /// Total size of everything under the item directory
    pub async fn disk_usage_bytes(&self) -> u64 {
        DirectoryScanner::scan_item_directory(&PathGenerator::item_dir(&self.cache_root))
            .await
            .bytes
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let (entries, capacity) = {
            let memory = self.memory.lock().await;
            (memory.len(), memory.capacity())
        };
        let usage =
            DirectoryScanner::scan_item_directory(&PathGenerator::item_dir(&self.cache_root))
                .await;

        let mut stats = CacheStats::new(self.cache_root.clone());
        stats.set_memory_stats(entries, capacity);
        stats.set_disk_stats(usage);
        stats
    }
}
