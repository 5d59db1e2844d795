//! Configuration management for Wallpaper Fetcher
//!
//! This module provides unified configuration management with automatic
//! first-run initialization, multi-source loading, and zero-config defaults.
//!
//! Precedence, lowest first: built-in defaults, the configuration file,
//! environment variables (after `.env` is loaded), then CLI arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::coordinator::{SyncConfig, SyncPolicy, SyncScope};
use crate::app::{CacheConfig, ClientConfig, ManifestConfig};
use crate::constants::{cache, env, files, http, limits, logging, origin};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Origin (CDN) settings
    pub origin: OriginConfigToml,
    /// Cache settings
    pub cache: CacheConfigToml,
    /// Bundled assets
    pub bundle: BundleConfigToml,
    /// Sync pass settings
    pub sync: SyncConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfigToml {
    /// Base URL of the object storage
    pub base_url: String,
    /// Prefix under which wallpaper objects live
    pub collection: String,
    /// Platform directory holding the manifest
    pub platform: String,
    /// Manifest object name
    pub manifest_file: String,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// HEAD probe timeout in seconds
    pub probe_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for OriginConfigToml {
    fn default() -> Self {
        Self {
            base_url: origin::DEFAULT_BASE_URL.to_string(),
            collection: origin::COLLECTION.to_string(),
            platform: origin::PLATFORM.to_string(),
            manifest_file: origin::MANIFEST_FILE.to_string(),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            probe_timeout_secs: http::PROBE_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path
    pub cache_root: Option<PathBuf>,
    /// Items kept in memory
    pub memory_capacity: usize,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            memory_capacity: cache::DEFAULT_MEMORY_CAPACITY,
        }
    }
}

/// TOML-friendly bundle configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BundleConfigToml {
    /// Directory containing the shipped `Wallpapers/` tree (None = nothing bundled)
    pub dir: Option<PathBuf>,
}

/// TOML-friendly sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfigToml {
    /// Policy used by `sync` when none is given on the command line
    pub policy: SyncPolicy,
    /// Days covered by each pass
    pub scope: SyncScope,
    /// Sync record location (None = user config directory)
    pub state_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `WALLPAPER_FETCHER_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = lookup(env::BASE_URL) {
            debug!("Origin base URL overridden by {}", env::BASE_URL);
            self.origin.base_url = base_url;
        }
        if let Some(dir) = lookup(env::CACHE_DIR) {
            debug!("Cache directory overridden by {}", env::CACHE_DIR);
            self.cache.cache_root = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(env::BUNDLE_DIR) {
            debug!("Bundle directory overridden by {}", env::BUNDLE_DIR);
            self.bundle.dir = Some(PathBuf::from(dir));
        }
    }

    /// Check every section, collecting all problems
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.client_config().validate() {
            errors.push(format!("origin: {}", e));
        }
        if let Err(e) = self.sync_config().validate() {
            errors.push(format!("sync: {}", e));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "logging: unknown level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Runtime origin client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.origin.to_runtime_config()
    }

    /// Runtime cache configuration
    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_runtime_config()
    }

    /// Runtime sync configuration
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_scope(self.sync.scope.clone())
            .with_manifest(ManifestConfig {
                platform: self.origin.platform.clone(),
                file_name: self.origin.manifest_file.clone(),
            })
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> Result<Option<PathBuf>> {
        if let Some(existing) = Self::find_config_file() {
            return Ok(Some(existing));
        }
        let Some(config_path) = Self::get_default_config_path() else {
            debug!("No user config directory, skipping config generation");
            return Ok(None);
        };

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        println!("📁 Created default configuration file:");
        println!("   {}", config_path.display());
        println!("   You can customize settings by editing this file.");
        println!();

        Ok(Some(config_path))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", files::LOCAL_CONFIG_FILE))];
        search_paths.extend(Self::get_default_config_path());

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(cache::APP_DIR).join(files::CONFIG_FILE))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Serialize the effective configuration
    pub fn to_toml(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        let default_cache_path = dirs::cache_dir()
            .map(|dir| dir.join(cache::APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./cache"));

        format!(
            r#"# Wallpaper Fetcher Configuration
# This file was automatically generated on first run.
# You can customize any of these settings to suit your needs.

[origin]
# Object storage serving wallpapers and the catalog manifest
base_url = "{base_url}"
collection = "{collection}"
platform = "{platform}"
manifest_file = "{manifest_file}"
tcp_nodelay = true
pool_idle_timeout_secs = {pool_idle}
pool_max_per_host = {pool_max}
request_timeout_secs = {request_timeout}
connect_timeout_secs = {connect_timeout}
probe_timeout_secs = {probe_timeout}
rate_limit_rps = {rps}

[cache]
# Cache directory (leave unset to use the system default)
# Default: {cache_path}
# cache_root = "/path/to/custom/cache"

# Wallpapers kept in memory
memory_capacity = {memory}

[bundle]
# Directory containing a Wallpapers/ tree shipped with the application
# dir = "/path/to/bundle"

[sync]
# incremental, stale-only, forced or clean
policy = "incremental"

# Days covered by a pass:
#   {{ kind = "catalog" }}, {{ kind = "recent", days = 7 }}
#   or {{ kind = "dates", dates = ["2026-01-01"] }}
scope = {{ kind = "catalog" }}

# state_file = "/path/to/sync-state.json"

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            base_url = origin::DEFAULT_BASE_URL,
            collection = origin::COLLECTION,
            platform = origin::PLATFORM,
            manifest_file = origin::MANIFEST_FILE,
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool_max = http::POOL_MAX_PER_HOST,
            request_timeout = http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout = http::CONNECT_TIMEOUT.as_secs(),
            probe_timeout = http::PROBE_TIMEOUT.as_secs(),
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            cache_path = default_cache_path.display(),
            memory = cache::DEFAULT_MEMORY_CAPACITY,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl OriginConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            collection: self.collection.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            memory_capacity: self.memory_capacity,
        }
    }
}
