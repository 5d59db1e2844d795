//! Application constants for Wallpaper Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the origin base URL
    pub const BASE_URL: &str = "WALLPAPER_FETCHER_BASE_URL";

    /// Overrides the cache root directory
    pub const CACHE_DIR: &str = "WALLPAPER_FETCHER_CACHE_DIR";

    /// Overrides the bundled assets directory
    pub const BUNDLE_DIR: &str = "WALLPAPER_FETCHER_BUNDLE_DIR";
}

/// Origin layout
pub mod origin {
    /// Production object storage
    pub const DEFAULT_BASE_URL: &str = "https://pub-810d6e0711de44d396071ecfc5ae9c2a.r2.dev";

    /// Prefix under which wallpaper objects live
    pub const COLLECTION: &str = "wallpapers";

    /// Platform directory holding the manifest
    pub const PLATFORM: &str = "ios";

    /// Manifest object name
    pub const MANIFEST_FILE: &str = "wallpaper-config.json";

    /// Query parameter carrying the cache-busting token
    pub const CACHE_BUST_PARAM: &str = "t";

    /// Cache-Control header sent with cache-busting requests
    pub const NO_CACHE_DIRECTIVE: &str = "no-cache, no-store, must-revalidate";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Wallpaper-Fetcher/0.1.0";

    /// Whole-request deadline
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Deadline for HEAD metadata probes
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting
pub mod limits {
    /// Default request rate towards the origin (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 15;
}

/// Cache layout
pub mod cache {
    /// Directory under the cache root holding item bytes
    pub const ITEM_DIR: &str = "ItemCache";

    /// Directory under the item directory holding validators
    pub const METADATA_DIR: &str = "metadata";

    /// Extension of stored ETag files
    pub const ETAG_EXTENSION: &str = "etag";

    /// Extension of stored Last-Modified files
    pub const LAST_MODIFIED_EXTENSION: &str = "lastmod";

    /// Items kept in the memory tier
    pub const DEFAULT_MEMORY_CAPACITY: usize = 50;

    /// Application directory name under OS cache/config directories
    pub const APP_DIR: &str = "wallpaper-fetcher";
}

/// Catalog facts
pub mod catalog {
    /// Items published per day: 2 languages x 2 orientations x 2 sequences
    pub const ITEMS_PER_DAY: usize = 8;

    /// Directory inside the bundle holding shipped wallpapers
    pub const BUNDLE_DIR: &str = "Wallpapers";

    /// Year whose objects drop the year component from names and paths
    pub const MONTH_ONLY_YEAR: i32 = 2026;

    /// First supported year
    pub const MIN_YEAR: i32 = 2000;

    /// Last supported year
    pub const MAX_YEAR: i32 = 2099;
}

/// Sync record persistence
pub mod settings {
    /// File name of the persisted sync record
    pub const SYNC_STATE_FILE: &str = "sync-state.json";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Local configuration file searched in the working directory
    pub const LOCAL_CONFIG_FILE: &str = "wallpaper-fetcher.toml";

    /// Configuration file name under the config directory
    pub const CONFIG_FILE: &str = "config.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use origin::DEFAULT_BASE_URL;
