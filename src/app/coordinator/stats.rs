//! Sync pass reporting
//!
//! A [`SyncReport`] is returned by every pass, including no-op and cancelled
//! ones. It summarizes what was planned and what happened so callers can
//! print it or decide whether to retry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::manifest::ManifestSource;
use crate::app::models::ItemKey;

use super::config::SyncPolicy;
use super::plan::SyncPlan;
use super::progress::SyncOutcome;

/// A failed item and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub key: ItemKey,
    pub reason: String,
}

/// Final result of a sync pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub pass_id: u64,
    pub policy: SyncPolicy,
    pub outcome: SyncOutcome,
    /// Manifest version the pass ran against
    pub manifest_version: u64,
    pub manifest_source: ManifestSource,
    /// Items in scope before classification
    pub in_scope: usize,
    pub bundled: usize,
    pub already_cached: usize,
    /// Uncached items a stale-only pass left alone
    pub skipped: usize,
    pub total_to_fetch: usize,
    pub fetched: usize,
    pub failures: Vec<ItemFailure>,
    /// Whether the sync record was written
    pub persisted: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl SyncReport {
    pub(crate) fn new(
        pass_id: u64,
        policy: SyncPolicy,
        manifest_version: u64,
        manifest_source: ManifestSource,
    ) -> Self {
        Self {
            pass_id,
            policy,
            outcome: SyncOutcome::Noop,
            manifest_version,
            manifest_source,
            in_scope: 0,
            bundled: 0,
            already_cached: 0,
            skipped: 0,
            total_to_fetch: 0,
            fetched: 0,
            failures: Vec::new(),
            persisted: false,
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn apply_plan(&mut self, plan: &SyncPlan) {
        self.in_scope = plan.in_scope;
        self.bundled = plan.bundled;
        self.already_cached = plan.already_cached;
        self.skipped = plan.skipped;
        self.total_to_fetch = plan.to_fetch.len();
    }

    pub(crate) fn finish(&mut self, outcome: SyncOutcome) {
        self.outcome = outcome;
        self.duration = Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
    }

    pub fn failed_keys(&self) -> Vec<ItemKey> {
        self.failures.iter().map(|f| f.key).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        match self.outcome {
            SyncOutcome::Noop if self.in_scope == 0 => format!(
                "Already up to date (manifest v{})",
                self.manifest_version
            ),
            SyncOutcome::Noop => format!(
                "All {} wallpapers available ({} bundled, {} cached)",
                self.in_scope, self.bundled, self.already_cached
            ),
            SyncOutcome::Success => format!(
                "Downloaded {} wallpapers in {:.1}s ({} bundled, {} already cached)",
                self.fetched,
                self.duration.as_secs_f64(),
                self.bundled,
                self.already_cached
            ),
            SyncOutcome::Partial => format!(
                "Downloaded {} of {} wallpapers, {} failed",
                self.fetched,
                self.total_to_fetch,
                self.failures.len()
            ),
            SyncOutcome::Cancelled => format!(
                "Cancelled after {} of {} wallpapers",
                self.fetched + self.failures.len(),
                self.total_to_fetch
            ),
        }
    }
}
