//! Origin client for the wallpaper object storage
//!
//! The origin is a plain HTTP object store behind a CDN. Items are immutable
//! in practice but may be re-uploaded, so every response's ETag and
//! Last-Modified are captured for later staleness checks.
//!
//! The module is organized into specialized components:
//! - `config`: client configuration and HTTP client building
//! - `http`: rate-limited GET/HEAD with status classification and cache-busting
//!
//! # Examples
//!
//! ```rust,no_run
//! use wallpaper_fetcher::app::client::{ClientConfig, Origin, OriginClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OriginClient::new(ClientConfig::default())?;
//! let object = client.fetch("wallpapers/25/12/25.12.21.CS1.png", false).await?;
//! println!("{} bytes, etag {:?}", object.bytes.len(), object.validators.etag);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::app::models::Validators;
use crate::errors::{NetworkError, NetworkResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// Body and validators of one successful GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedObject {
    pub bytes: Bytes,
    pub validators: Validators,
}

/// Transport used to reach the origin
///
/// Paths are relative to the origin base, e.g. `wallpapers/12/12.1.CS1.png`.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Download an object. With `bust_cache` intermediaries must not answer
    /// from their copy.
    async fn fetch(&self, path: &str, bust_cache: bool) -> NetworkResult<FetchedObject>;

    /// Current validators of an object; empty when the probe fails
    async fn probe_metadata(&self, path: &str) -> Validators;
}

/// HTTP client for the wallpaper origin
#[derive(Debug)]
pub struct OriginClient {
    http_handler: HttpHandler,
    base_url: Url,
    collection: String,
}

impl OriginClient {
    /// Creates a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` for an unparsable base URL and
    /// `NetworkError::RateLimiter` for a zero rate limit
    pub fn new(config: ClientConfig) -> NetworkResult<Self> {
        let base_url = Self::parse_base(&config.base_url)?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(
            client,
            config.rate_limit_rps,
            config.request_timeout,
            config.probe_timeout,
        )?;

        tracing::info!("Created origin client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
            collection: config.collection,
        })
    }

    /// Base URL normalized to end with a slash so relative paths append
    fn parse_base(raw: &str) -> NetworkResult<Url> {
        let mut url = Url::parse(raw.trim()).map_err(|e| NetworkError::InvalidUrl {
            url: raw.to_string(),
            error: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl {
                url: raw.to_string(),
                error: "URL cannot be used as a base".to_string(),
            });
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Absolute URL of an origin-relative object path
    pub fn object_url(&self, path: &str) -> NetworkResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| NetworkError::InvalidUrl {
                url: path.to_string(),
                error: e.to_string(),
            })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Prefix under which wallpaper objects live
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl Origin for OriginClient {
    async fn fetch(&self, path: &str, bust_cache: bool) -> NetworkResult<FetchedObject> {
        let url = self.object_url(path)?;
        let (bytes, validators) = self.http_handler.get_object(&url, bust_cache).await?;
        Ok(FetchedObject { bytes, validators })
    }

    async fn probe_metadata(&self, path: &str) -> Validators {
        match self.object_url(path) {
            Ok(url) => self.http_handler.head_validators(&url).await,
            Err(e) => {
                tracing::debug!("Skipping probe: {}", e);
                Validators::default()
            }
        }
    }
}
