//! Wallpaper Fetcher CLI application
//!
//! Command-line interface for obtaining daily wallpapers and keeping the
//! local cache in step with the published catalog.

use std::process;

use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use wallpaper_fetcher::cli::{
    apply_global_args, handle_cache, handle_check, handle_list, handle_manifest, handle_resolve,
    handle_stale, handle_sync, Cli, Commands,
};
use wallpaper_fetcher::config::AppConfig;
use wallpaper_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    if cli.global.config.is_none() {
        AppConfig::initialize_first_run().await?;
    }
    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    apply_global_args(&mut config, &cli.global);
    config.validate()?;

    init_logging(&cli, &config);

    info!("Wallpaper Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Resolve(args) => handle_resolve(&config, args, false).await,
        Commands::Refresh(args) => handle_resolve(&config, args, true).await,
        Commands::Stale { name } => handle_stale(&config, &name).await,
        Commands::List(args) => handle_list(args),
        Commands::Sync(args) => {
            info!("Executing sync command");
            handle_sync(&config, args, cli.global.quiet).await
        }
        Commands::Check => handle_check(&config).await,
        Commands::Manifest => handle_manifest(&config).await,
        Commands::Cache(args) => handle_cache(&config, args).await,
    }
}

/// Initialize logging from CLI verbosity, falling back to the config level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_ascii_lowercase())
        .unwrap_or_else(|| config.logging.level.to_ascii_lowercase());

    let mut filter = EnvFilter::from_default_env();
    match format!("wallpaper_fetcher={}", level).parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
