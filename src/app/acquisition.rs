//! Single-item acquisition across bundle, cache and origin
//!
//! `resolve` walks the tiers cheapest first: the cache (memory, then disk),
//! the bundled assets, and finally the origin with a normal (cacheable)
//! request. `force_refresh` skips straight to a cache-busting origin fetch.
//! Concurrent requests for the same item are single-flighted, so the second
//! caller is served from whatever the first one stored.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::app::bundled::BundledAssets;
use crate::app::cache::{KeyedLocks, TieredCache};
use crate::app::client::{FetchedObject, Origin};
use crate::app::models::{ItemKey, Tier};
use crate::errors::{AcquisitionError, AcquisitionResult};

/// Bytes of a resolved item and the tier that supplied them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub name: String,
    pub bytes: Bytes,
    pub tier: Tier,
}

/// Resolves item keys into bytes
pub struct AcquisitionService {
    cache: Arc<TieredCache>,
    bundle: Arc<dyn BundledAssets>,
    origin: Arc<dyn Origin>,
    collection: String,
    inflight: KeyedLocks,
}

impl AcquisitionService {
    pub fn new(
        cache: Arc<TieredCache>,
        bundle: Arc<dyn BundledAssets>,
        origin: Arc<dyn Origin>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            bundle,
            origin,
            collection: collection.into(),
            inflight: KeyedLocks::new(),
        }
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn bundle(&self) -> &Arc<dyn BundledAssets> {
        &self.bundle
    }

    pub fn origin(&self) -> &Arc<dyn Origin> {
        &self.origin
    }

    /// Origin path of an item under the configured collection
    pub fn remote_path(&self, key: &ItemKey) -> String {
        key.remote_path(&self.collection)
    }

    /// Resolve an item from the cheapest tier that has it
    ///
    /// # Errors
    ///
    /// Returns `AcquisitionError::Unavailable` when the item is neither cached
    /// nor bundled and the origin fetch fails
    pub async fn resolve(&self, key: &ItemKey) -> AcquisitionResult<Resolved> {
        let name = key.canonical_name();
        let _flight = self.inflight.lock(&name).await;

        if let Some(hit) = self.cache.get(&name).await {
            return Ok(Resolved {
                name,
                bytes: hit.bytes,
                tier: hit.tier,
            });
        }

        if let Some(bytes) = self.bundle.lookup(key).await {
            self.cache.promote(&name, bytes.clone()).await;
            return Ok(Resolved {
                name,
                bytes,
                tier: Tier::Bundled,
            });
        }

        let object = self.fetch(key, &name, false).await?;
        self.store(&name, &object).await;
        Ok(Resolved {
            name,
            bytes: object.bytes,
            tier: Tier::Origin,
        })
    }

    /// Replace the cached copy with a fresh one from the origin
    ///
    /// Issues exactly one cache-busting request; the bytes and validators
    /// stored come from that same response.
    pub async fn force_refresh(&self, key: &ItemKey) -> AcquisitionResult<Resolved> {
        let name = key.canonical_name();
        let _flight = self.inflight.lock(&name).await;

        if let Err(e) = self.cache.force_invalidate(&name).await {
            warn!("Failed to invalidate {} before refresh: {}", name, e);
        }

        let object = self.fetch(key, &name, true).await?;
        self.store(&name, &object).await;
        info!("Refreshed {} ({} bytes)", name, object.bytes.len());
        Ok(Resolved {
            name,
            bytes: object.bytes,
            tier: Tier::Origin,
        })
    }

    /// Whether the origin holds newer content than the cached copy
    pub async fn is_stale(&self, key: &ItemKey) -> bool {
        let path = self.remote_path(key);
        let origin = &self.origin;
        self.cache
            .is_stale(key, || async move { origin.probe_metadata(&path).await })
            .await
    }

    async fn fetch(
        &self,
        key: &ItemKey,
        name: &str,
        bust_cache: bool,
    ) -> AcquisitionResult<FetchedObject> {
        let path = self.remote_path(key);
        debug!("Fetching {} from origin (bust: {})", path, bust_cache);
        self.origin
            .fetch(&path, bust_cache)
            .await
            .map_err(|source| AcquisitionError::Unavailable {
                name: name.to_string(),
                source,
            })
    }

    /// A failed cache write still returns the fetched bytes to the caller
    async fn store(&self, name: &str, object: &FetchedObject) {
        if let Err(e) = self
            .cache
            .put_with_validators(name, object.bytes.clone(), &object.validators)
            .await
        {
            warn!("Failed to cache {}: {}", name, e);
        }
    }
}
