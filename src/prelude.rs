//! Prelude module for Wallpaper Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use wallpaper_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use wallpaper_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let bundle: Arc<dyn BundledAssets> = Arc::new(EmptyBundle);
//!     let cache = Arc::new(TieredCache::new(CacheConfig::default(), bundle.clone()).await?);
//!     let origin = Arc::new(OriginClient::new(ClientConfig::default())?);
//!     let acquisition = Arc::new(AcquisitionService::new(cache, bundle, origin, "wallpapers"));
//!
//!     let coordinator = SyncCoordinator::new(
//!         SyncConfig::default(),
//!         acquisition,
//!         Arc::new(MemorySettingsStore::new()),
//!     )?;
//!     let report = coordinator.run_sync(SyncPolicy::Incremental).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    AcquisitionService,
    BundledAssets,
    CacheConfig,
    CacheStats,
    CatalogManifest,
    ClientConfig,
    DirectoryBundle,
    EmptyBundle,
    FileSettingsStore,
    ItemKey,
    MemorySettingsStore,
    Origin,
    OriginClient,
    Resolved,
    SettingsStore,
    SyncConfig,
    SyncCoordinator,
    SyncOutcome,
    SyncPolicy,
    SyncProgress,
    SyncReport,
    SyncScope,
    Tier,
    TieredCache,
};

// Commonly used constants
pub use crate::constants::{DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT_RPS, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _cache_config = CacheConfig::default();
        let _sync_config = SyncConfig::default();
        let _client_config = ClientConfig::default();

        assert_eq!(DEFAULT_RATE_LIMIT_RPS, 15);
        assert!(USER_AGENT.contains("Wallpaper-Fetcher"));
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let cache_config = CacheConfig::with_cache_root(temp_dir.path().to_path_buf());
        let bundle: Arc<dyn BundledAssets> = Arc::new(EmptyBundle);

        let cache = Arc::new(TieredCache::new(cache_config, bundle).await.unwrap());
        assert_eq!(cache.stats().await.cached_items, 0);
    }
}
