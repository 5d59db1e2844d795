//! Shared fixtures for integration tests
//!
//! Provides a scripted in-memory origin that records every request, a
//! directory-backed bundle and a helper that wires them into an
//! acquisition service over a temporary cache.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use tempfile::TempDir;

use wallpaper_fetcher::app::client::{FetchedObject, Origin};
use wallpaper_fetcher::app::models::{items_for_date, ItemKey, Validators};
use wallpaper_fetcher::app::{
    AcquisitionService, BundledAssets, CacheConfig, DirectoryBundle, TieredCache,
};
use wallpaper_fetcher::errors::{NetworkError, NetworkResult};

pub const COLLECTION: &str = "wallpapers";
pub const MANIFEST_PATH: &str = "ios/wallpaper-config.json";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Every key published on the days `start..=end`
pub fn keys_between(start: NaiveDate, end: NaiveDate) -> Vec<ItemKey> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .flat_map(items_for_date)
        .collect()
}

pub fn manifest_json(version: u64, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        r#"{{"version": {}, "lastUpdated": "{}", "startDate": "{}", "endDate": "{}"}}"#,
        version, start, start, end
    )
}

/// A recorded origin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub bust_cache: bool,
}

/// Scripted origin serving objects from memory
#[derive(Default)]
pub struct FakeOrigin {
    objects: Mutex<HashMap<String, (Bytes, Validators)>>,
    remote_validators: Mutex<HashMap<String, Validators>>,
    requests: Mutex<Vec<Request>>,
    probes: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_manifest(&self, version: u64, start: NaiveDate, end: NaiveDate) {
        self.put_path(
            MANIFEST_PATH,
            Bytes::from(manifest_json(version, start, end)),
            Validators::default(),
        );
    }

    pub fn put_path(&self, path: &str, bytes: Bytes, validators: Validators) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, validators));
    }

    pub fn remove_path(&self, path: &str) {
        self.objects.lock().unwrap().remove(path);
    }

    /// Serve `key` with contents derived from its name
    pub fn put_item(&self, key: &ItemKey, etag: &str) {
        self.put_path(
            &key.remote_path(COLLECTION),
            Self::item_bytes(key, etag),
            Validators::new(Some(etag.to_string()), None),
        );
    }

    pub fn put_items(&self, keys: &[ItemKey]) {
        for key in keys {
            self.put_item(key, "\"v1\"");
        }
    }

    pub fn remove_item(&self, key: &ItemKey) {
        self.remove_path(&key.remote_path(COLLECTION));
    }

    /// Validators reported by HEAD probes, independent of the stored object
    pub fn set_remote_validators(&self, key: &ItemKey, validators: Validators) {
        self.remote_validators
            .lock()
            .unwrap()
            .insert(key.remote_path(COLLECTION), validators);
    }

    pub fn item_bytes(key: &ItemKey, etag: &str) -> Bytes {
        Bytes::from(format!("{}@{}", key.canonical_name(), etag))
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn item_requests(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != MANIFEST_PATH)
            .collect()
    }

    pub fn requests_for(&self, key: &ItemKey) -> usize {
        let path = key.remote_path(COLLECTION);
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn clear_log(&self) {
        self.requests.lock().unwrap().clear();
        self.probes.lock().unwrap().clear();
    }
}

#[async_trait]
impl Origin for FakeOrigin {
    async fn fetch(&self, path: &str, bust_cache: bool) -> NetworkResult<FetchedObject> {
        self.requests.lock().unwrap().push(Request {
            path: path.to_string(),
            bust_cache,
        });
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let object = self.objects.lock().unwrap().get(path).cloned();
        match object {
            Some((bytes, validators)) => Ok(FetchedObject { bytes, validators }),
            None => Err(NetworkError::NotFound {
                url: format!("fake://{}", path),
            }),
        }
    }

    async fn probe_metadata(&self, path: &str) -> Validators {
        self.probes.lock().unwrap().push(path.to_string());
        if let Some(validators) = self.remote_validators.lock().unwrap().get(path) {
            return validators.clone();
        }
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }
}

/// Acquisition stack over a temporary cache and bundle
pub struct Harness {
    pub origin: Arc<FakeOrigin>,
    pub cache: Arc<TieredCache>,
    pub bundle: Arc<DirectoryBundle>,
    pub acquisition: Arc<AcquisitionService>,
    pub cache_dir: TempDir,
    pub bundle_dir: TempDir,
}

impl Harness {
    pub async fn new(origin: Arc<FakeOrigin>) -> Self {
        Self::with_memory_capacity(origin, 50).await
    }

    pub async fn with_memory_capacity(origin: Arc<FakeOrigin>, capacity: usize) -> Self {
        let cache_dir = TempDir::new().unwrap();
        let bundle_dir = TempDir::new().unwrap();
        let bundle = Arc::new(DirectoryBundle::new(bundle_dir.path()));
        let bundle_dyn: Arc<dyn BundledAssets> = bundle.clone();

        let config = CacheConfig::with_cache_root(cache_dir.path().to_path_buf())
            .with_memory_capacity(capacity);
        let cache = Arc::new(TieredCache::new(config, bundle_dyn.clone()).await.unwrap());
        let origin_dyn: Arc<dyn Origin> = origin.clone();
        let acquisition = Arc::new(AcquisitionService::new(
            cache.clone(),
            bundle_dyn,
            origin_dyn,
            COLLECTION,
        ));

        Self {
            origin,
            cache,
            bundle,
            acquisition,
            cache_dir,
            bundle_dir,
        }
    }

    /// Ship `key` in the bundle
    pub fn bundle_item(&self, key: &ItemKey) {
        let path = self.bundle_dir.path().join(key.bundle_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("bundled:{}", key.canonical_name())).unwrap();
    }
}
