//! Observable progress of sync passes
//!
//! The coordinator publishes a fresh [`SyncProgress`] snapshot after every
//! state change and every item. Observers hold a `watch` receiver, so they
//! always see the latest snapshot; intermediate ones may be coalesced.

use futures::Stream;
use serde::Serialize;
use tokio::sync::watch;

/// Terminal result of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// Every planned item was obtained
    Success,
    /// At least one item failed
    Partial,
    /// Nothing needed doing
    Noop,
    /// A newer pass or an explicit cancel stopped this one
    Cancelled,
}

/// Coordinator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SyncState {
    #[default]
    Idle,
    FetchingManifest,
    Planning,
    Downloading,
    Done(SyncOutcome),
}

impl SyncState {
    pub fn is_done(&self) -> bool {
        matches!(self, SyncState::Done(_))
    }
}

/// Snapshot of the current (or last) pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncProgress {
    /// Increases with every pass
    pub pass_id: u64,
    pub state: SyncState,
    pub total_to_fetch: usize,
    pub fetched_so_far: usize,
    pub failed_count: usize,
    pub last_status_text: String,
}

impl SyncProgress {
    /// Items processed so far, successful or not
    pub fn processed(&self) -> usize {
        self.fetched_so_far + self.failed_count
    }

    /// Completion percentage (0.0 to 100.0)
    pub fn completion_percentage(&self) -> f64 {
        if self.total_to_fetch == 0 {
            if self.state.is_done() {
                100.0
            } else {
                0.0
            }
        } else {
            (self.processed() as f64 / self.total_to_fetch as f64) * 100.0
        }
    }
}

/// Publishing side of the progress channel
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<SyncProgress>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncProgress::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SyncProgress {
        self.tx.borrow().clone()
    }

    /// Reset all counters for a new pass
    pub fn begin(&self, pass_id: u64) {
        self.tx.send_replace(SyncProgress {
            pass_id,
            state: SyncState::FetchingManifest,
            last_status_text: "Checking for new wallpapers...".to_string(),
            ..Default::default()
        });
    }

    pub fn set_state(&self, state: SyncState, status: impl Into<String>) {
        let status = status.into();
        self.tx.send_modify(|p| {
            p.state = state;
            p.last_status_text = status;
        });
    }

    pub fn start_downloading(&self, total_to_fetch: usize, status: impl Into<String>) {
        let status = status.into();
        self.tx.send_modify(|p| {
            p.state = SyncState::Downloading;
            p.total_to_fetch = total_to_fetch;
            p.last_status_text = status;
        });
    }

    pub fn record_success(&self, name: &str) {
        self.tx.send_modify(|p| {
            p.fetched_so_far += 1;
            p.last_status_text = format!(
                "Downloaded {} ({}/{})",
                name,
                p.processed(),
                p.total_to_fetch
            );
        });
    }

    pub fn record_failure(&self, name: &str) {
        self.tx.send_modify(|p| {
            p.failed_count += 1;
            p.last_status_text = format!(
                "Failed to download {} ({}/{})",
                name,
                p.processed(),
                p.total_to_fetch
            );
        });
    }

    pub fn finish(&self, outcome: SyncOutcome, status: impl Into<String>) {
        self.set_state(SyncState::Done(outcome), status);
    }
}

/// Stream of snapshots: the current one, then one per change
pub fn progress_stream(rx: watch::Receiver<SyncProgress>) -> impl Stream<Item = SyncProgress> {
    futures::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let snapshot = rx.borrow_and_update().clone();
        Some((snapshot, (rx, false)))
    })
}
