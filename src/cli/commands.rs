//! Command handlers for Wallpaper Fetcher CLI
//!
//! This module implements the command handlers that wire the configuration
//! into the acquisition pipeline and the sync coordinator.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::coordinator::{SignalHandler, SyncCoordinator, SyncOutcome};
use crate::app::manifest::{ManifestFetcher, ManifestSource};
use crate::app::models::{filtered_items, ItemKey};
use crate::app::{
    AcquisitionService, BundledAssets, DirectoryBundle, EmptyBundle, FileSettingsStore, Origin,
    OriginClient, SettingsStore, TieredCache,
};
use crate::cli::{
    CacheAction, CacheArgs, GlobalArgs, ItemArgs, ListArgs, ProgressConfig, ProgressDisplay,
    SyncArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Shared components built from the configuration
pub struct Services {
    pub cache: Arc<TieredCache>,
    pub acquisition: Arc<AcquisitionService>,
}

impl Services {
    /// Build the bundle, cache, origin client and acquisition service
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let bundle: Arc<dyn BundledAssets> = match &config.bundle.dir {
            Some(dir) => {
                debug!("Using bundled assets from {}", dir.display());
                Arc::new(DirectoryBundle::new(dir.clone()))
            }
            None => Arc::new(EmptyBundle),
        };

        let cache = Arc::new(TieredCache::new(config.cache_config(), bundle.clone()).await?);
        let client_config = config.client_config();
        let collection = client_config.collection.clone();
        let origin: Arc<dyn Origin> = Arc::new(OriginClient::new(client_config)?);
        let acquisition = Arc::new(AcquisitionService::new(
            cache.clone(),
            bundle,
            origin,
            collection,
        ));

        Ok(Self { cache, acquisition })
    }
}

/// Fold global CLI flags into the loaded configuration
pub fn apply_global_args(config: &mut AppConfig, global: &GlobalArgs) {
    if let Some(dir) = &global.cache_dir {
        config.cache.cache_root = Some(dir.clone());
    }
    if let Some(dir) = &global.bundle_dir {
        config.bundle.dir = Some(dir.clone());
    }
    if let Some(url) = &global.base_url {
        config.origin.base_url = url.clone();
    }
}

fn parse_key(name: &str) -> Result<ItemKey> {
    name.parse::<ItemKey>()
        .map_err(|e| AppError::generic(format!("Invalid wallpaper name '{}': {}", name, e)))
}

fn settings_store(config: &AppConfig) -> Result<Arc<dyn SettingsStore>> {
    let path = match &config.sync.state_file {
        Some(path) => path.clone(),
        None => FileSettingsStore::default_path()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?,
    };
    debug!("Sync record at {}", path.display());
    Ok(Arc::new(FileSettingsStore::new(path)))
}

/// Handle `resolve` and `refresh`
pub async fn handle_resolve(config: &AppConfig, args: ItemArgs, force: bool) -> Result<()> {
    let key = parse_key(&args.name)?;
    let services = Services::build(config).await?;

    let start = Instant::now();
    let resolved = if force {
        services.acquisition.force_refresh(&key).await?
    } else {
        services.acquisition.resolve(&key).await?
    };
    info!("Resolved {} in {:?}", resolved.name, start.elapsed());

    println!(
        "✅ {} from {} ({})",
        resolved.name,
        resolved.tier,
        crate::app::cache::format_bytes(resolved.bytes.len() as u64)
    );

    if let Some(output) = args.output {
        write_output(&output, &resolved.bytes).await?;
        println!("   Written to {}", output.display());
    }
    Ok(())
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Handle `stale`
pub async fn handle_stale(config: &AppConfig, name: &str) -> Result<()> {
    let key = parse_key(name)?;
    let services = Services::build(config).await?;

    if !services.cache.contains(&key.canonical_name()).await {
        println!("ℹ️  {} is not cached", key);
        return Ok(());
    }
    if services.acquisition.is_stale(&key).await {
        println!("🔄 {} changed on the origin; run 'refresh' to update it", key);
    } else {
        println!("✅ {} is up to date", key);
    }
    Ok(())
}

/// Handle `list`
pub fn handle_list(args: ListArgs) -> Result<()> {
    let keys = filtered_items(args.date, args.language, args.orientation);
    if keys.is_empty() {
        return Err(AppError::generic(format!(
            "No wallpapers are published for {}",
            args.date
        )));
    }

    let today = chrono::Local::now().date_naive();
    println!("🖼️  Wallpapers for {}", args.date);
    for key in &keys {
        println!(
            "  {:<20} {:<28} {}",
            key.canonical_name(),
            key.bundle_path().display(),
            if key.is_unlocked(today) { "" } else { "(locked)" }
        );
    }
    Ok(())
}

/// Handle `sync`
///
/// Ctrl-C cancels the running pass; the sync record is left untouched.
pub async fn handle_sync(config: &AppConfig, args: SyncArgs, quiet: bool) -> Result<()> {
    let policy = args.policy.unwrap_or(config.sync.policy);
    let mut sync_config = config.sync_config();
    if let Some(scope) = args.scope() {
        sync_config = sync_config.with_scope(scope);
    }

    let services = Services::build(config).await?;
    let coordinator = Arc::new(SyncCoordinator::new(
        sync_config,
        services.acquisition,
        settings_store(config)?,
    )?);

    let signals = SignalHandler::new();
    let signal_task = signals.setup();
    let shutdown = signals.token();
    let cancel_task = {
        let coordinator = coordinator.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            coordinator.cancel();
        })
    };

    let display = ProgressDisplay::new(ProgressConfig {
        enabled: !quiet && !args.json,
        ..Default::default()
    });
    let progress = display.start(coordinator.state().pass_id, coordinator.progress_stream());

    let result = coordinator.run_sync(policy).await;

    progress.finish().await;
    cancel_task.abort();
    // Stops the signal listener
    shutdown.cancel();
    let _ = signal_task.await;

    let report = result?;
    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::generic(format!("Failed to render report: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let icon = match report.outcome {
        SyncOutcome::Success | SyncOutcome::Noop => "✅",
        SyncOutcome::Partial => "⚠️ ",
        SyncOutcome::Cancelled => "🛑",
    };
    println!("{} {}", icon, report.summary());
    if report.manifest_source == ManifestSource::Fallback {
        println!("   Manifest unavailable, used the built-in catalog");
    }
    for failure in report.failures.iter().take(10) {
        println!("   • {}: {}", failure.key, failure.reason);
    }
    if report.failures.len() > 10 {
        println!("   ... and {} more failures", report.failures.len() - 10);
    }
    Ok(())
}

/// Handle `check`
pub async fn handle_check(config: &AppConfig) -> Result<()> {
    let services = Services::build(config).await?;
    let coordinator =
        SyncCoordinator::new(config.sync_config(), services.acquisition, settings_store(config)?)?;

    if coordinator.check_for_updates().await? {
        println!("🆕 Updates available; run 'sync' to download them");
    } else {
        println!("✅ Already up to date");
    }
    Ok(())
}

/// Handle `manifest`
pub async fn handle_manifest(config: &AppConfig) -> Result<()> {
    let origin: Arc<dyn Origin> = Arc::new(OriginClient::new(config.client_config())?);
    let fetcher = ManifestFetcher::new(origin, &config.sync_config().manifest);

    let fetched = fetcher.fetch_manifest().await;
    let manifest = &fetched.manifest;

    println!("📋 Catalog Manifest");
    println!("==================");
    println!(
        "Source: {}",
        match fetched.source {
            ManifestSource::Remote => fetcher.path().to_string(),
            ManifestSource::Fallback => "built-in fallback".to_string(),
        }
    );
    println!("Version: {}", manifest.version);
    println!("Last updated: {}", manifest.last_updated);
    println!(
        "Range: {} to {} ({} days)",
        manifest.start_date,
        manifest.end_date,
        manifest.day_count()
    );
    println!("Wallpapers: {}", manifest.approx_item_count());
    Ok(())
}

/// Handle cache management commands
pub async fn handle_cache(config: &AppConfig, args: CacheArgs) -> Result<()> {
    let bundle: Arc<dyn BundledAssets> = Arc::new(EmptyBundle);
    let cache = TieredCache::new(config.cache_config(), bundle).await?;

    match args.action {
        CacheAction::Usage => {
            let bytes = cache.disk_usage_bytes().await;
            println!(
                "💾 {} in {}",
                crate::app::cache::format_bytes(bytes),
                cache.cache_root().display()
            );
        }
        CacheAction::Stats => {
            let stats = cache.stats().await;
            println!("💾 Cache Information");
            println!("===================");
            println!("Location: {}", stats.cache_root.display());
            println!("Cached wallpapers: {}", stats.cached_items);
            println!("Validator files: {}", stats.validator_files);
            println!("Cache size: {}", stats.format_cache_size());
            println!("Memory capacity: {} items", stats.memory_capacity);
        }
        CacheAction::Clear { reset_sync } => {
            cache.clear_all().await?;
            println!("🧹 Cleared {}", cache.cache_root().display());
            if reset_sync {
                settings_store(config)?.reset().await?;
                println!("   Sync record reset; the next sync downloads everything");
            }
        }
        CacheAction::Invalidate { name } => {
            let key = parse_key(&name)?;
            if !cache.contains(&key.canonical_name()).await {
                warn!("{} was not cached", key);
            }
            cache.force_invalidate(&key.canonical_name()).await?;
            println!("🗑️  Removed {} from the cache", key);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert!(parse_key("25.12.21.CS1.png").is_ok());
        assert!(parse_key("wallpaper.jpg").is_err());
    }

    #[test]
    fn test_global_args_override_config() {
        let mut config = AppConfig::default();
        let global = GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config: None,
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            bundle_dir: None,
            base_url: Some("http://localhost:1234".to_string()),
        };
        apply_global_args(&mut config, &global);

        assert_eq!(config.cache.cache_root, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.bundle.dir, None);
        assert_eq!(config.origin.base_url, "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_write_output_creates_parent() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.png");
        write_output(&path, b"png").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }
}
