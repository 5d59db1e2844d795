//! Read-only wallpapers shipped alongside the application
//!
//! The bundle is the first tier consulted for an item that is not already in
//! the cache, and it is usable before any cache directory exists.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::app::models::ItemKey;

/// Source of wallpapers that ship with the application
#[async_trait]
pub trait BundledAssets: Send + Sync {
    /// Bytes of the bundled item, if it ships
    async fn lookup(&self, key: &ItemKey) -> Option<Bytes>;

    /// Existence check that does not load the item
    async fn contains(&self, key: &ItemKey) -> bool;
}

/// Bundle laid out on disk as `Wallpapers/{yy}/{m}/{name}` or `Wallpapers/{m}/{name}`
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ItemKey) -> PathBuf {
        self.root.join(key.bundle_path())
    }
}

#[async_trait]
impl BundledAssets for DirectoryBundle {
    async fn lookup(&self, key: &ItemKey) -> Option<Bytes> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) if !data.is_empty() => {
                debug!("Bundled hit: {}", key);
                Some(Bytes::from(data))
            }
            Ok(_) => {
                warn!("Ignoring empty bundled asset: {}", path.display());
                None
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read bundled asset {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn contains(&self, key: &ItemKey) -> bool {
        tokio::fs::metadata(self.path_for(key))
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}

/// Bundle that ships nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBundle;

#[async_trait]
impl BundledAssets for EmptyBundle {
    async fn lookup(&self, _key: &ItemKey) -> Option<Bytes> {
        None
    }

    async fn contains(&self, _key: &ItemKey) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Language, Orientation, Sequence};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn key(y: i32, m: u32, d: u32) -> ItemKey {
        ItemKey::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            Language::Chinese,
            Orientation::Portrait,
            Sequence::First,
        )
    }

    #[tokio::test]
    async fn test_directory_bundle_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = DirectoryBundle::new(temp_dir.path());
        let shipped = key(2025, 12, 21);

        let path = temp_dir.path().join(shipped.bundle_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"png-bytes").unwrap();

        assert!(bundle.contains(&shipped).await);
        assert_eq!(
            bundle.lookup(&shipped).await,
            Some(Bytes::from_static(b"png-bytes"))
        );

        let missing = key(2026, 1, 3);
        assert!(!bundle.contains(&missing).await);
        assert!(bundle.lookup(&missing).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_files_are_not_bundled() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = DirectoryBundle::new(temp_dir.path());
        let item = key(2026, 1, 1);

        let path = temp_dir.path().join(item.bundle_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();

        assert!(!bundle.contains(&item).await);
        assert!(bundle.lookup(&item).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_bundle() {
        assert!(!EmptyBundle.contains(&key(2026, 1, 1)).await);
        assert!(EmptyBundle.lookup(&key(2026, 1, 1)).await.is_none());
    }
}
