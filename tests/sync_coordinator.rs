//! Integration tests for sync passes
//!
//! These tests drive the coordinator against a scripted origin, a real
//! temporary cache and an in-memory sync record.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use common::{date, keys_between, FakeOrigin, Harness};
use wallpaper_fetcher::app::coordinator::{
    SyncConfig, SyncCoordinator, SyncOutcome, SyncPolicy, SyncScope, SyncState,
};
use wallpaper_fetcher::app::manifest::ManifestSource;
use wallpaper_fetcher::app::models::{items_for_date, Validators};
use wallpaper_fetcher::app::settings::{MemorySettingsStore, SettingsStore, SyncRecord};

fn coordinator(
    harness: &Harness,
    config: SyncConfig,
    settings: Arc<MemorySettingsStore>,
) -> SyncCoordinator {
    SyncCoordinator::new(config, harness.acquisition.clone(), settings)
        .unwrap()
        .with_today(|| date(2026, 1, 10))
}

/// Manifest v3 already synced: the pass makes no item requests
#[tokio::test]
async fn test_synced_version_is_noop() {
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(3, date(2025, 12, 21), date(2025, 12, 25));
    let harness = Harness::new(origin.clone()).await;
    let settings = Arc::new(MemorySettingsStore::with_record(SyncRecord::new(3, vec![])));
    let coordinator = coordinator(&harness, SyncConfig::default(), settings);

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::Noop);
    assert_eq!(report.manifest_version, 3);
    assert!(origin.item_requests().is_empty());
    assert_eq!(origin.probe_count(), 0);
    assert_eq!(
        coordinator.state().state,
        SyncState::Done(SyncOutcome::Noop)
    );
    assert!(!coordinator.check_for_updates().await.unwrap());
}

/// 5 days of 8 items with 10 bundled leaves exactly 30 to download
#[tokio::test]
async fn test_bundled_items_are_not_planned() {
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(4, date(2025, 12, 21), date(2025, 12, 25));
    let keys = keys_between(date(2025, 12, 21), date(2025, 12, 25));
    assert_eq!(keys.len(), 40);
    origin.put_items(&keys);

    let harness = Harness::new(origin.clone()).await;
    for key in keys.iter().step_by(4) {
        harness.bundle_item(key);
    }
    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.in_scope, 40);
    assert_eq!(report.bundled, 10);
    assert_eq!(report.total_to_fetch, 30);
    assert_eq!(report.fetched, 30);
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(origin.item_requests().len(), 30);
    assert!(origin.item_requests().iter().all(|r| !r.bust_cache));

    let progress = coordinator.state();
    assert_eq!(progress.fetched_so_far, progress.total_to_fetch);
    assert_eq!(progress.failed_count, 0);

    // Completed pass records the manifest version
    let record = settings.load().await.unwrap();
    assert_eq!(record.last_synced_version, 4);
    assert!(record.pending_retries.is_empty());
    assert!(report.persisted);
}

/// One 404 in a 5-item pass: partial outcome, the rest cached
#[tokio::test]
async fn test_missing_item_gives_partial_pass() {
    let day = date(2026, 1, 5);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(2, day, day);
    let keys = items_for_date(day);
    origin.put_items(&keys);

    let harness = Harness::new(origin.clone()).await;
    for key in &keys[..3] {
        harness.bundle_item(key);
    }
    let missing = keys[5];
    origin.remove_item(&missing);

    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());
    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::Partial);
    assert_eq!(report.total_to_fetch, 5);
    assert_eq!(report.fetched, 4);
    assert_eq!(report.failed_keys(), vec![missing]);

    let progress = coordinator.state();
    assert_eq!(progress.state, SyncState::Done(SyncOutcome::Partial));
    assert_eq!(progress.failed_count, 1);
    assert_eq!(progress.fetched_so_far, 4);

    for key in &keys[3..] {
        let cached = harness.cache.contains(&key.canonical_name()).await;
        assert_eq!(cached, *key != missing, "{}", key);
    }

    // Version persisted despite the failure, with the failure kept for retry
    let record = settings.load().await.unwrap();
    assert_eq!(record.last_synced_version, 2);
    assert_eq!(record.pending_retries, vec![missing]);
}

/// Same version with pending retries: only the failed items are planned
#[tokio::test]
async fn test_pending_retries_are_replanned() {
    let day = date(2026, 1, 5);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(2, day, day);
    let keys = items_for_date(day);
    origin.put_items(&keys);
    let harness = Harness::new(origin.clone()).await;

    let retry = keys[2];
    let settings = Arc::new(MemorySettingsStore::with_record(SyncRecord::new(
        2,
        vec![retry],
    )));
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());
    assert!(coordinator.check_for_updates().await.unwrap());

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(report.in_scope, 1);
    assert_eq!(origin.item_requests().len(), 1);
    assert_eq!(origin.requests_for(&retry), 1);

    let record = settings.load().await.unwrap();
    assert!(record.is_current(2));
}

/// Already cached items are skipped; a forced pass refreshes them with cache-busting
#[tokio::test]
async fn test_forced_pass_refreshes_cached_items() {
    let day = date(2026, 1, 6);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(5, day, day);
    let keys = items_for_date(day);
    origin.put_items(&keys);
    let harness = Harness::new(origin.clone()).await;
    harness.bundle_item(&keys[0]);

    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());

    let first = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();
    assert_eq!(first.fetched, 7);
    origin.clear_log();

    // New version, everything cached: nothing to download
    origin.set_manifest(6, day, day);
    let second = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();
    assert_eq!(second.outcome, SyncOutcome::Noop);
    assert_eq!(second.already_cached, 7);
    assert!(origin.item_requests().is_empty());
    assert_eq!(settings.load().await.unwrap().last_synced_version, 6);

    let forced = coordinator.run_sync(SyncPolicy::Forced).await.unwrap();
    assert_eq!(forced.outcome, SyncOutcome::Success);
    assert_eq!(forced.fetched, 7);
    let requests = origin.item_requests();
    assert_eq!(requests.len(), 7);
    assert!(requests.iter().all(|r| r.bust_cache));
}

/// Stale-only passes refresh changed items and never write the record
#[tokio::test]
async fn test_stale_only_pass() {
    let day = date(2026, 1, 7);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(1, day, day);
    let keys = items_for_date(day);
    origin.put_items(&keys[..2]);
    let harness = Harness::new(origin.clone()).await;

    harness.acquisition.resolve(&keys[0]).await.unwrap();
    harness.acquisition.resolve(&keys[1]).await.unwrap();
    origin.put_item(&keys[1], "\"v2\"");
    origin.clear_log();

    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());
    let report = coordinator.run_sync(SyncPolicy::StaleOnly).await.unwrap();

    assert_eq!(report.total_to_fetch, 1);
    assert_eq!(report.already_cached, 1);
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(origin.requests_for(&keys[1]), 1);
    assert_eq!(origin.requests_for(&keys[0]), 0);
    assert_eq!(
        harness.acquisition.resolve(&keys[1]).await.unwrap().bytes,
        FakeOrigin::item_bytes(&keys[1], "\"v2\"")
    );

    assert!(!report.persisted);
    assert_eq!(settings.load().await.unwrap(), SyncRecord::default());
}

/// Clean passes wipe the cache and re-download everything
#[tokio::test]
async fn test_clean_pass_resets_state() {
    let day = date(2026, 1, 8);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(9, day, day);
    let keys = items_for_date(day);
    origin.put_items(&keys);
    let harness = Harness::new(origin.clone()).await;

    let settings = Arc::new(MemorySettingsStore::with_record(SyncRecord::new(9, vec![])));
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());
    harness.acquisition.resolve(&keys[0]).await.unwrap();
    origin.clear_log();

    let report = coordinator.run_sync(SyncPolicy::Clean).await.unwrap();

    assert_eq!(report.total_to_fetch, 8);
    assert_eq!(report.fetched, 8);
    assert!(origin.item_requests().iter().all(|r| r.bust_cache));
    assert!(settings.load().await.unwrap().is_current(9));
}

/// Narrow scopes are clipped to today and never touch the record
#[tokio::test]
async fn test_recent_scope_clips_to_today() {
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(2, date(2026, 1, 1), date(2026, 1, 31));
    origin.put_items(&keys_between(date(2026, 1, 1), date(2026, 1, 31)));
    let harness = Harness::new(origin.clone()).await;

    let settings = Arc::new(MemorySettingsStore::with_record(SyncRecord::new(2, vec![])));
    let config = SyncConfig::default().with_scope(SyncScope::Recent { days: 3 });
    let coordinator = coordinator(&harness, config, settings.clone());

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    // Jan 8..=10, not gated by the synced version
    assert_eq!(report.in_scope, 24);
    assert_eq!(report.fetched, 24);
    assert!(!report.persisted);
    let expected: Vec<String> = keys_between(date(2026, 1, 8), date(2026, 1, 10))
        .iter()
        .map(|k| k.remote_path(common::COLLECTION))
        .collect();
    let requested: Vec<String> = origin.item_requests().into_iter().map(|r| r.path).collect();
    assert_eq!(requested, expected);
}

/// Unreachable manifest: the built-in catalog is used
#[tokio::test]
async fn test_manifest_fallback() {
    let origin = Arc::new(FakeOrigin::new());
    let harness = Harness::new(origin.clone()).await;
    let settings = Arc::new(MemorySettingsStore::new());
    let config = SyncConfig::default().with_scope(SyncScope::Dates {
        dates: vec![date(2026, 1, 1)],
    });
    let coordinator = coordinator(&harness, config, settings);

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.manifest_source, ManifestSource::Fallback);
    assert_eq!(report.manifest_version, 1);
    assert_eq!(report.in_scope, 8);
    assert_eq!(report.outcome, SyncOutcome::Partial);
    assert_eq!(report.failures.len(), 8);
}

/// A catalog pass on the fallback manifest keeps a newer stored record
#[tokio::test]
async fn test_fallback_pass_keeps_newer_record() {
    let origin = Arc::new(FakeOrigin::new());
    let harness = Harness::new(origin.clone()).await;
    let settings = Arc::new(MemorySettingsStore::with_record(SyncRecord::new(5, vec![])));
    let coordinator = coordinator(&harness, SyncConfig::default(), settings.clone());

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();

    assert_eq!(report.manifest_source, ManifestSource::Fallback);
    assert_eq!(report.manifest_version, 1);
    assert_eq!(report.outcome, SyncOutcome::Partial);
    assert!(!report.persisted);

    let record = settings.load().await.unwrap();
    assert_eq!(record.last_synced_version, 5);
    assert!(record.pending_retries.is_empty());
}

/// Cancelling mid-pass persists nothing; the next pass gets a new id
#[tokio::test]
async fn test_cancelled_pass_persists_nothing() {
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(7, date(2026, 1, 1), date(2026, 1, 3));
    origin.put_items(&keys_between(date(2026, 1, 1), date(2026, 1, 3)));
    let harness = Harness::new(origin.clone()).await;

    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = Arc::new(coordinator(&harness, SyncConfig::default(), settings.clone()));
    let mut updates = coordinator.subscribe();

    origin.set_delay(Duration::from_millis(50));
    let running = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run_sync(SyncPolicy::Incremental).await })
    };

    // Wait until at least one item went through
    loop {
        updates.changed().await.unwrap();
        let progress = updates.borrow_and_update().clone();
        if progress.state == SyncState::Downloading && progress.fetched_so_far >= 1 {
            break;
        }
    }
    coordinator.cancel();

    let report = running.await.unwrap().unwrap();
    assert_eq!(report.outcome, SyncOutcome::Cancelled);
    assert_eq!(report.pass_id, 1);
    assert!(report.fetched < 24);
    assert!(!report.persisted);
    assert_eq!(settings.load().await.unwrap(), SyncRecord::default());
    assert_eq!(
        coordinator.state().state,
        SyncState::Done(SyncOutcome::Cancelled)
    );

    origin.set_delay(Duration::from_millis(0));
    let next = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();
    assert_eq!(next.pass_id, 2);
    assert_eq!(next.outcome, SyncOutcome::Success);
    assert_eq!(next.already_cached + next.fetched, 24);
    assert!(settings.load().await.unwrap().is_current(7));
}

/// A new pass cancels the one in flight
#[tokio::test]
async fn test_new_pass_supersedes_running_pass() {
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(3, date(2026, 1, 1), date(2026, 1, 2));
    origin.put_items(&keys_between(date(2026, 1, 1), date(2026, 1, 2)));
    origin.set_delay(Duration::from_millis(20));
    let harness = Harness::new(origin.clone()).await;

    let settings = Arc::new(MemorySettingsStore::new());
    let coordinator = Arc::new(coordinator(&harness, SyncConfig::default(), settings.clone()));
    let mut updates = coordinator.subscribe();

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run_sync(SyncPolicy::Incremental).await })
    };
    loop {
        updates.changed().await.unwrap();
        if updates.borrow_and_update().state == SyncState::Downloading {
            break;
        }
    }

    let second = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first.outcome, SyncOutcome::Cancelled);
    assert_eq!(second.pass_id, first.pass_id + 1);
    assert_eq!(second.outcome, SyncOutcome::Success);
    assert!(settings.load().await.unwrap().is_current(3));
}

/// The progress stream ends each pass in a terminal state
#[tokio::test]
async fn test_progress_stream_reports_pass() {
    let day = date(2026, 1, 2);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(1, day, day);
    origin.put_items(&items_for_date(day));
    let harness = Harness::new(origin.clone()).await;
    let coordinator = Arc::new(coordinator(
        &harness,
        SyncConfig::default(),
        Arc::new(MemorySettingsStore::new()),
    ));

    let stream = coordinator.progress_stream();
    let collector = tokio::spawn(async move {
        stream
            .take_while(|p| {
                let done = p.pass_id == 1 && p.state.is_done();
                async move { !done }
            })
            .collect::<Vec<_>>()
            .await
    });

    let report = coordinator.run_sync(SyncPolicy::Incremental).await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Success);

    let snapshots = tokio::time::timeout(Duration::from_secs(1), collector)
        .await
        .unwrap()
        .unwrap();
    let processed: Vec<usize> = snapshots.iter().map(|p| p.processed()).collect();
    assert!(processed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(coordinator.state().completion_percentage(), 100.0);
}

/// Origin validators missing on both sides do not count as stale
#[tokio::test]
async fn test_stale_only_ignores_unknown_validators() {
    let day = date(2026, 1, 9);
    let origin = Arc::new(FakeOrigin::new());
    origin.set_manifest(1, day, day);
    let key = items_for_date(day)[0];
    origin.put_item(&key, "\"v1\"");
    let harness = Harness::new(origin.clone()).await;
    harness
        .cache
        .put(&key.canonical_name(), FakeOrigin::item_bytes(&key, "x"))
        .await
        .unwrap();
    origin.set_remote_validators(&key, Validators::default());

    let coordinator = coordinator(
        &harness,
        SyncConfig::default(),
        Arc::new(MemorySettingsStore::new()),
    );
    let report = coordinator.run_sync(SyncPolicy::StaleOnly).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::Noop);
    assert_eq!(report.already_cached, 1);
    assert_eq!(report.skipped, 7);
}
