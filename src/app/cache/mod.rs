//! Tiered item cache with atomic operations
//!
//! This module keeps downloaded wallpapers in a bounded memory tier backed by
//! a disk directory, together with the HTTP validators (ETag, Last-Modified)
//! of the response each item came from.
//!
//! # Key Features
//!
//! - **OS-specific cache directories**: Uses the standard system cache location
//! - **LRU memory tier**: Count-bounded, promoted on disk hits
//! - **Atomic operations**: Bytes and validators replaced with temp-file + rename
//! - **Per-item locking**: Same-name operations serialize, others run concurrently
//! - **Staleness checks**: Stored validators compared against an origin probe
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`path`] - On-disk layout and name validation
//! - [`memory`] - LRU memory tier
//! - [`locks`] - Per-item async locks
//! - [`stats`] - Cache statistics and disk usage monitoring
//! - [`manager`] - The tiered cache itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use wallpaper_fetcher::app::bundled::EmptyBundle;
//! use wallpaper_fetcher::app::cache::{CacheConfig, TieredCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = TieredCache::new(CacheConfig::default(), Arc::new(EmptyBundle)).await?;
//!
//! cache.put("25.12.21.CS1.png", Bytes::from_static(b"...")).await?;
//! if let Some(hit) = cache.get("25.12.21.CS1.png").await {
//!     println!("{} bytes from {}", hit.bytes.len(), hit.tier);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod locks;
pub mod manager;
pub mod memory;
pub mod path;
pub mod stats;

pub use config::CacheConfig;
pub use locks::KeyedLocks;
pub use manager::{CacheHit, TieredCache};
pub use stats::{format_bytes, CacheStats, DirectoryScanner, DiskUsage};
