//! Planning: which items of a pass need a download
//!
//! Every key in scope is classified as bundled, already cached or needing a
//! download. The classification depends on the policy: incremental passes
//! skip cached items, forced passes refresh everything not bundled, and
//! stale-only passes refresh cached items whose origin validators changed.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::acquisition::AcquisitionService;
use crate::app::models::ItemKey;

use super::config::SyncPolicy;

/// Where an item in scope stands before downloading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Bundled,
    AlreadyCached,
    NeedsDownload,
    /// Not cached and not refreshed by a stale-only pass
    Skipped,
}

/// Result of planning a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub in_scope: usize,
    pub bundled: usize,
    pub already_cached: usize,
    pub skipped: usize,
    /// Keys to download, in deterministic order
    pub to_fetch: Vec<ItemKey>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_fetch.is_empty()
    }

    fn record(&mut self, key: ItemKey, classification: Classification) {
        match classification {
            Classification::Bundled => self.bundled += 1,
            Classification::AlreadyCached => self.already_cached += 1,
            Classification::Skipped => self.skipped += 1,
            Classification::NeedsDownload => self.to_fetch.push(key),
        }
    }
}

/// Classify one key under `policy`
pub async fn classify(
    acquisition: &AcquisitionService,
    key: &ItemKey,
    policy: SyncPolicy,
) -> Classification {
    if acquisition.bundle().contains(key).await {
        return Classification::Bundled;
    }
    let cached = acquisition.cache().contains(&key.canonical_name()).await;
    match policy {
        SyncPolicy::Incremental if cached => Classification::AlreadyCached,
        SyncPolicy::Incremental => Classification::NeedsDownload,
        SyncPolicy::Forced | SyncPolicy::Clean => Classification::NeedsDownload,
        SyncPolicy::StaleOnly if !cached => Classification::Skipped,
        SyncPolicy::StaleOnly => {
            if acquisition.is_stale(key).await {
                Classification::NeedsDownload
            } else {
                Classification::AlreadyCached
            }
        }
    }
}

/// Classify `keys` in order; `None` when cancelled part way
pub async fn build_plan(
    acquisition: &AcquisitionService,
    keys: Vec<ItemKey>,
    policy: SyncPolicy,
    token: &CancellationToken,
) -> Option<SyncPlan> {
    let mut plan = SyncPlan {
        in_scope: keys.len(),
        ..Default::default()
    };
    for key in keys {
        if token.is_cancelled() {
            return None;
        }
        let classification = classify(acquisition, &key, policy).await;
        plan.record(key, classification);
    }
    debug!(
        "Planned {} items: {} bundled, {} cached, {} skipped, {} to fetch",
        plan.in_scope,
        plan.bundled,
        plan.already_cached,
        plan.skipped,
        plan.to_fetch.len()
    );
    Some(plan)
}
