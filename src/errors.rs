//! Error types for Wallpaper Fetcher
//!
//! Each component owns an error enum with enough context to act on: the
//! origin client classifies transport failures, the cache reports the path it
//! could not touch, and the coordinator only fails for setup problems (per-item
//! failures during a sync pass are counted, not raised).

use std::path::PathBuf;
use thiserror::Error;

/// Origin (HTTP) errors, classified from status codes and transport failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The object does not exist on the origin (HTTP 404)
    #[error("Object not found on origin: {url}")]
    NotFound { url: String },

    /// Any other non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Request exceeded the configured deadline
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Body could not be read or was empty
    #[error("Could not decode response body: {reason}")]
    DecodeError { reason: String },

    /// Invalid URL built from the configured base
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Connection-level failure (DNS, TLS, reset)
    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    /// Rate limiter could not be constructed or refused the request
    #[error("Rate limiter error: {reason}")]
    RateLimiter { reason: String },
}

impl NetworkError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Timeout { .. } | NetworkError::Connection { .. } => true,
            NetworkError::ServerError { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Single-item acquisition errors
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// No tier could supply the item
    #[error("Wallpaper {name} is unavailable")]
    Unavailable {
        name: String,
        #[source]
        source: NetworkError,
    },
}

impl AcquisitionError {
    /// The underlying network classification
    pub fn network(&self) -> &NetworkError {
        match self {
            AcquisitionError::Unavailable { source, .. } => source,
        }
    }
}

/// Catalog manifest errors. All of these are recovered by the fallback manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest could not be downloaded
    #[error("Failed to download manifest")]
    Network(#[from] NetworkError),

    /// JSON parsing error
    #[error("JSON parsing error in manifest")]
    Parse(#[from] serde_json::Error),

    /// Start date after end date
    #[error("Invalid manifest date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    /// Dates whose two-digit year names would collide with another century
    #[error("Manifest range {start} to {end} is outside the supported years {min}-{max}")]
    UnsupportedYears {
        start: String,
        end: String,
        min: i32,
        max: i32,
    },
}

/// Cache management errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Item name that cannot be used as a cache file name
    #[error("Invalid cache item name: {name:?}")]
    InvalidName { name: String },

    /// I/O error on a cache file
    #[error("Cache I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Persisted sync record errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored record is not valid JSON
    #[error("Settings file is corrupt")]
    Json(#[from] serde_json::Error),
}

/// Sync coordinator errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The sync record could not be persisted
    #[error("Failed to persist sync record")]
    Settings(#[from] SettingsError),

    /// Cache could not be cleared for a clean pass
    #[error("Failed to prepare cache for sync")]
    Cache(#[from] CacheError),

    /// Invalid sync configuration
    #[error("Invalid sync configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Origin error
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Acquisition error
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Settings error
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Sync error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Network(e) => e.is_transient(),
            AppError::Acquisition(e) => e.network().is_transient(),
            AppError::Manifest(ManifestError::Network(e)) => e.is_transient(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Network(_) => "network",
            AppError::Acquisition(_) => "acquisition",
            AppError::Manifest(_) => "manifest",
            AppError::Cache(_) => "cache",
            AppError::Settings(_) => "settings",
            AppError::Sync(_) => "sync",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Origin result type alias
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

/// Acquisition result type alias
pub type AcquisitionResult<T> = std::result::Result<T, AcquisitionError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Settings result type alias
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Sync result type alias
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(NetworkError::Timeout { seconds: 60 }.is_transient());
        assert!(NetworkError::ServerError { status: 503 }.is_transient());
        assert!(!NetworkError::ServerError { status: 403 }.is_transient());
        assert!(
            !NetworkError::NotFound {
                url: "x".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_app_error_category() {
        let err = AppError::from(AcquisitionError::Unavailable {
            name: "25.12.1.CS1.png".to_string(),
            source: NetworkError::Connection {
                reason: "reset".to_string(),
            },
        });
        assert_eq!(err.category(), "acquisition");
        assert!(err.is_recoverable());

        let err = AppError::from(CacheError::InvalidName {
            name: "../x".to_string(),
        });
        assert_eq!(err.category(), "cache");
        assert!(!err.is_recoverable());
    }
}
