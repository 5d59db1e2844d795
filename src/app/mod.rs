//! Core application logic for Wallpaper Fetcher
//!
//! This module contains the acquisition pipeline (bundled assets, tiered
//! cache and origin client), the catalog manifest, persisted sync state and
//! the sync coordinator that drives bulk passes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wallpaper_fetcher::app::{
//!     AcquisitionService, CacheConfig, ClientConfig, DirectoryBundle, ItemKey, OriginClient,
//!     TieredCache,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = Arc::new(DirectoryBundle::new("./bundle"));
//! let cache = Arc::new(TieredCache::new(CacheConfig::default(), bundle.clone()).await?);
//! let origin = Arc::new(OriginClient::new(ClientConfig::default())?);
//! let service = AcquisitionService::new(cache, bundle, origin, "wallpapers");
//!
//! let key: ItemKey = "25.12.21.CS1.png".parse()?;
//! let resolved = service.resolve(&key).await?;
//! println!("{} from {} ({} bytes)", resolved.name, resolved.tier, resolved.bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod bundled;
pub mod cache;
pub mod client;
pub mod coordinator;
pub mod manifest;
pub mod models;
pub mod settings;

// Re-export main public API
pub use acquisition::{AcquisitionService, Resolved};
pub use bundled::{BundledAssets, DirectoryBundle, EmptyBundle};
pub use cache::{CacheConfig, CacheHit, CacheStats, TieredCache};
pub use client::{ClientConfig, FetchedObject, Origin, OriginClient};
pub use coordinator::{
    SyncConfig, SyncCoordinator, SyncOutcome, SyncPolicy, SyncProgress, SyncReport, SyncScope,
    SyncState,
};
pub use manifest::{CatalogManifest, FetchedManifest, ManifestConfig, ManifestFetcher, ManifestSource};
pub use models::{
    filtered_items, items_for_date, ItemKey, Language, NamingScheme, Orientation, Sequence, Tier,
    Validators,
};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingsStore, SyncRecord};
