//! Catalog synchronization
//!
//! The sync coordinator drives bulk passes over the catalog: it fetches the
//! manifest, decides from the persisted sync record whether anything needs
//! doing, classifies every item in scope and downloads what is missing,
//! publishing progress after every item.
//!
//! # Key Features
//!
//! - **Version gating**: an incremental pass against an already synced
//!   manifest version makes no item requests
//! - **Retry tracking**: items that failed are re-planned on the next pass
//!   even when the version is unchanged
//! - **Cancellation**: a new pass cancels the running one; cancelled passes
//!   persist nothing
//! - **Observable progress**: `watch`-based snapshots, also as a `Stream`
//!
//! # Architecture
//!
//! - [`config`] - Policies, scopes and configuration
//! - [`plan`] - Classification of items in scope
//! - [`progress`] - State machine and progress snapshots
//! - [`stats`] - Per-pass reports
//! - [`signals`] - Signal handling for cancellation
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wallpaper_fetcher::app::coordinator::{SyncConfig, SyncCoordinator, SyncPolicy};
//! use wallpaper_fetcher::app::settings::MemorySettingsStore;
//! # use wallpaper_fetcher::app::acquisition::AcquisitionService;
//!
//! # async fn example(acquisition: Arc<AcquisitionService>) -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = SyncCoordinator::new(
//!     SyncConfig::default(),
//!     acquisition,
//!     Arc::new(MemorySettingsStore::new()),
//! )?;
//!
//! let report = coordinator.run_sync(SyncPolicy::Incremental).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod plan;
pub mod progress;
pub mod signals;
pub mod stats;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::NaiveDate;
use futures::Stream;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::acquisition::AcquisitionService;
use crate::app::manifest::{CatalogManifest, FetchedManifest, ManifestFetcher, ManifestSource};
use crate::app::models::{items_for_date, ItemKey};
use crate::app::settings::{SettingsStore, SyncRecord};
use crate::errors::{SyncError, SyncResult};

pub use config::{SyncConfig, SyncPolicy, SyncScope};
pub use plan::{Classification, SyncPlan};
pub use progress::{progress_stream, ProgressReporter, SyncOutcome, SyncProgress, SyncState};
pub use signals::SignalHandler;
pub use stats::{ItemFailure, SyncReport};

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Orchestrates sync passes against the catalog
pub struct SyncCoordinator {
    config: SyncConfig,
    acquisition: Arc<AcquisitionService>,
    manifests: ManifestFetcher,
    settings: Arc<dyn SettingsStore>,
    progress: ProgressReporter,
    /// Token of the newest pass
    current: StdMutex<Option<CancellationToken>>,
    pass_counter: AtomicU64,
    /// Serializes passes
    pass_lock: Mutex<()>,
    today: Clock,
}

impl SyncCoordinator {
    /// Create a coordinator that fetches the manifest through the
    /// acquisition service's origin
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidConfig` if the configuration is invalid
    pub fn new(
        config: SyncConfig,
        acquisition: Arc<AcquisitionService>,
        settings: Arc<dyn SettingsStore>,
    ) -> SyncResult<Self> {
        config
            .validate()
            .map_err(|reason| SyncError::InvalidConfig { reason })?;
        let manifests = ManifestFetcher::new(acquisition.origin().clone(), &config.manifest);

        Ok(Self {
            config,
            acquisition,
            manifests,
            settings,
            progress: ProgressReporter::new(),
            current: StdMutex::new(None),
            pass_counter: AtomicU64::new(0),
            pass_lock: Mutex::new(()),
            today: Box::new(|| chrono::Local::now().date_naive()),
        })
    }

    /// Replace the clock used to decide which days are unlocked
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn acquisition(&self) -> &Arc<AcquisitionService> {
        &self.acquisition
    }

    /// Latest progress snapshot
    pub fn state(&self) -> SyncProgress {
        self.progress.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    /// Snapshots as a stream: the current one, then one per change
    pub fn progress_stream(&self) -> impl Stream<Item = SyncProgress> {
        progress_stream(self.progress.subscribe())
    }

    /// Cancel the running pass, if any
    pub fn cancel(&self) {
        if let Some(token) = self.lock_current().as_ref() {
            token.cancel();
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the manifest and report whether a pass would do anything
    pub async fn check_for_updates(&self) -> SyncResult<bool> {
        let fetched = self.manifests.fetch_manifest().await;
        let record = self.settings.load().await?;
        let available = !record.is_current(fetched.manifest.version);
        info!(
            "Manifest v{}, last synced v{}, {} pending retries: updates {}",
            fetched.manifest.version,
            record.last_synced_version,
            record.pending_retries.len(),
            if available { "available" } else { "not available" }
        );
        Ok(available)
    }

    /// Run one sync pass
    ///
    /// Starting a pass cancels the one currently running; passes never
    /// overlap. Per-item failures do not fail the pass, they are reported.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the sync record cannot be read or written, or
    /// the cache cannot be cleared for a clean pass
    pub async fn run_sync(&self, policy: SyncPolicy) -> SyncResult<SyncReport> {
        let token = CancellationToken::new();
        if let Some(previous) = self.lock_current().replace(token.clone()) {
            previous.cancel();
        }

        let _pass = self.pass_lock.lock().await;
        let pass_id = self.pass_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.begin(pass_id);
        info!("Starting {} sync pass {}", policy, pass_id);

        let result = self.run_pass(pass_id, policy, &token).await;

        {
            // An uncancelled token is still the newest one
            let mut current = self.lock_current();
            if !token.is_cancelled() {
                *current = None;
            }
        }

        match &result {
            Ok(report) => info!("Sync pass {} finished: {}", pass_id, report.summary()),
            Err(e) => {
                warn!("Sync pass {} failed: {}", pass_id, e);
                self.progress
                    .set_state(SyncState::Idle, format!("Sync failed: {}", e));
            }
        }
        result
    }

    async fn run_pass(
        &self,
        pass_id: u64,
        policy: SyncPolicy,
        token: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            fetched = self.manifests.fetch_manifest() => Some(fetched),
        };
        let FetchedManifest { manifest, source } = match fetched {
            Some(fetched) => fetched,
            None => {
                let report = SyncReport::new(pass_id, policy, 0, ManifestSource::Fallback);
                return Ok(self.cancelled(report));
            }
        };
        let mut report = SyncReport::new(pass_id, policy, manifest.version, source);

        self.progress
            .set_state(SyncState::Planning, "Preparing wallpaper list...");

        if policy == SyncPolicy::Clean {
            self.acquisition.cache().clear_all().await?;
            self.settings.reset().await?;
            info!("Cleared cache and sync record for clean pass");
        }

        let record = self.settings.load().await?;
        let gated = policy == SyncPolicy::Incremental && self.config.scope.is_catalog();

        if gated && record.is_current(manifest.version) {
            report.finish(SyncOutcome::Noop);
            self.progress.finish(
                SyncOutcome::Noop,
                format!("Already up to date (v{})", manifest.version),
            );
            return Ok(report);
        }

        let keys = if gated
            && manifest.version != 0
            && record.last_synced_version == manifest.version
        {
            info!(
                "Manifest v{} already synced, retrying {} failed items",
                manifest.version,
                record.pending_retries.len()
            );
            retry_keys(&record)
        } else {
            self.keys_in_scope(&manifest)
        };

        let plan = match plan::build_plan(&self.acquisition, keys, policy, token).await {
            Some(plan) => plan,
            None => return Ok(self.cancelled(report)),
        };
        report.apply_plan(&plan);

        if plan.is_empty() {
            self.persist(policy, &manifest, &record, &mut report, Vec::new())
                .await?;
            report.finish(SyncOutcome::Noop);
            self.progress.finish(
                SyncOutcome::Noop,
                format!(
                    "All wallpapers available ({} bundled, {} cached)",
                    plan.bundled, plan.already_cached
                ),
            );
            return Ok(report);
        }

        self.progress.start_downloading(
            plan.to_fetch.len(),
            format!("Downloading {} wallpapers...", plan.to_fetch.len()),
        );

        for key in &plan.to_fetch {
            let name = key.canonical_name();
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = self.download(key, policy) => Some(result),
            };
            match outcome {
                None => return Ok(self.cancelled(report)),
                Some(Ok(())) => {
                    report.fetched += 1;
                    self.progress.record_success(&name);
                }
                Some(Err(reason)) => {
                    warn!("Failed to download {}: {}", name, reason);
                    report.failures.push(ItemFailure { key: *key, reason });
                    self.progress.record_failure(&name);
                }
            }
        }

        let failed = report.failed_keys();
        self.persist(policy, &manifest, &record, &mut report, failed)
            .await?;

        let outcome = if report.has_failures() {
            SyncOutcome::Partial
        } else {
            SyncOutcome::Success
        };
        report.finish(outcome);
        self.progress.finish(outcome, completion_text(&report));
        Ok(report)
    }

    /// Keys of every day in scope, in pass order
    fn keys_in_scope(&self, manifest: &CatalogManifest) -> Vec<ItemKey> {
        let today = (self.today)();
        self.config
            .scope
            .days(manifest.start_date, manifest.end_date, today)
            .into_iter()
            .flat_map(items_for_date)
            .collect()
    }

    async fn download(&self, key: &ItemKey, policy: SyncPolicy) -> Result<(), String> {
        let result = if policy.busts_cache() {
            self.acquisition.force_refresh(key).await
        } else {
            self.acquisition.resolve(key).await
        };
        result.map(|_| ()).map_err(|e| e.network().to_string())
    }

    /// Write the sync record for completed catalog passes
    ///
    /// A pass against the built-in fallback manifest never replaces a record
    /// of a newer remote version.
    async fn persist(
        &self,
        policy: SyncPolicy,
        manifest: &CatalogManifest,
        stored: &SyncRecord,
        report: &mut SyncReport,
        pending_retries: Vec<ItemKey>,
    ) -> SyncResult<()> {
        if !policy.persists_record() || !self.config.scope.is_catalog() {
            return Ok(());
        }
        if report.manifest_source == ManifestSource::Fallback
            && stored.last_synced_version > manifest.version
        {
            warn!(
                "Keeping sync record for manifest v{}; fallback manifest v{} is older",
                stored.last_synced_version, manifest.version
            );
            return Ok(());
        }
        let record = SyncRecord::new(manifest.version, pending_retries);
        self.settings.store(&record).await?;
        report.persisted = true;
        info!(
            "Recorded manifest v{} as synced ({} pending retries)",
            record.last_synced_version,
            record.pending_retries.len()
        );
        Ok(())
    }

    fn cancelled(&self, mut report: SyncReport) -> SyncReport {
        report.finish(SyncOutcome::Cancelled);
        self.progress
            .finish(SyncOutcome::Cancelled, "Sync cancelled");
        info!("Sync pass {} cancelled", report.pass_id);
        report
    }
}

fn retry_keys(record: &SyncRecord) -> Vec<ItemKey> {
    let mut keys: Vec<ItemKey> = record
        .pending_retries
        .iter()
        .copied()
        .filter(ItemKey::is_supported)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

fn completion_text(report: &SyncReport) -> String {
    let mut text = format!("Downloaded {} wallpapers", report.fetched);
    if report.bundled > 0 {
        text.push_str(&format!(", {} bundled", report.bundled));
    }
    if report.has_failures() {
        text.push_str(&format!(", {} failed", report.failures.len()));
    }
    text
}
