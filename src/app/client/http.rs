//! Rate-limited HTTP operations against the origin
//!
//! Every request waits on a governor rate limiter before it is sent. Status
//! codes and transport failures are classified into [`NetworkError`]; nothing
//! here retries.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, CACHE_CONTROL, ETAG, LAST_MODIFIED, PRAGMA};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::app::models::Validators;
use crate::constants::origin::{CACHE_BUST_PARAM, NO_CACHE_DIRECTIVE};
use crate::errors::{NetworkError, NetworkResult};

/// Issues strictly increasing millisecond tokens for cache-busting
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicU64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current Unix time in milliseconds, bumped past any token already issued
    pub fn next_token(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Append the cache-busting parameter to `url`
    pub fn apply(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &self.next_token().to_string());
    }
}

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    buster: CacheBuster,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and limits
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RateLimiter` if `rate_limit_rps` is zero
    pub fn new(
        client: Client,
        rate_limit_rps: u32,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> NetworkResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            buster: CacheBuster::new(),
            request_timeout,
            probe_timeout,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> NetworkResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            NetworkError::RateLimiter {
                reason: "Rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;
    }

    fn no_cache(request: RequestBuilder) -> RequestBuilder {
        request
            .header(CACHE_CONTROL, NO_CACHE_DIRECTIVE)
            .header(PRAGMA, "no-cache")
    }

    /// GET `url`, returning the body and the validators of that response
    ///
    /// With `bust_cache` the request carries a unique `t` parameter and
    /// no-cache headers so intermediaries cannot answer from their copy.
    pub async fn get_object(
        &self,
        url: &Url,
        bust_cache: bool,
    ) -> NetworkResult<(Bytes, Validators)> {
        let mut url = url.clone();
        let mut request = if bust_cache {
            self.buster.apply(&mut url);
            Self::no_cache(self.client.get(url.as_str()))
        } else {
            self.client.get(url.as_str())
        };
        request = request.timeout(self.request_timeout);

        self.throttle().await;
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;
        let response = Self::check_status(response, &url)?;
        let validators = Self::validators(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| match self.classify(e, self.request_timeout) {
                NetworkError::Timeout { seconds } => NetworkError::Timeout { seconds },
                other => NetworkError::DecodeError {
                    reason: other.to_string(),
                },
            })?;
        if body.is_empty() {
            return Err(NetworkError::DecodeError {
                reason: format!("empty body from {}", url),
            });
        }

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok((body, validators))
    }

    /// HEAD `url` with cache-busting; any failure yields empty validators
    pub async fn head_validators(&self, url: &Url) -> Validators {
        let mut url = url.clone();
        self.buster.apply(&mut url);
        let request = Self::no_cache(self.client.head(url.as_str())).timeout(self.probe_timeout);

        self.throttle().await;
        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                Self::validators(response.headers())
            }
            Ok(response) => {
                tracing::debug!("Probe of {} returned HTTP {}", url, response.status());
                Validators::default()
            }
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", url, e);
                Validators::default()
            }
        }
    }

    fn check_status(response: Response, url: &Url) -> NetworkResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(NetworkError::NotFound {
                url: url.to_string(),
            })
        } else {
            Err(NetworkError::ServerError {
                status: status.as_u16(),
            })
        }
    }

    fn validators(headers: &HeaderMap) -> Validators {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        Validators::new(header(ETAG), header(LAST_MODIFIED))
    }

    fn classify(&self, error: reqwest::Error, timeout: Duration) -> NetworkError {
        if error.is_timeout() {
            NetworkError::Timeout {
                seconds: timeout.as_secs(),
            }
        } else if error.is_builder() {
            NetworkError::InvalidUrl {
                url: error
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
                error: error.to_string(),
            }
        } else {
            NetworkError::Connection {
                reason: error.to_string(),
            }
        }
    }
}
