//! Command-line argument parsing for Wallpaper Fetcher
//!
//! This module defines the CLI structure using clap derive macros,
//! providing commands for single-item acquisition, catalog synchronization
//! and cache management.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::coordinator::{SyncPolicy, SyncScope};
use crate::app::models::{Language, Orientation};

/// Wallpaper Fetcher - Daily wallpapers from bundle, cache or CDN
#[derive(Parser, Debug)]
#[command(
    name = "wallpaper_fetcher",
    version,
    about = "Fetch and synchronize daily wallpapers",
    long_about = "Obtains daily wallpapers from the fastest available source: assets bundled
with the application, the local memory/disk cache, or the CDN origin. Keeps the cache in
step with the published catalog using version-gated sync passes."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory containing bundled wallpapers
    #[arg(long, global = true, value_name = "DIR")]
    pub bundle_dir: Option<PathBuf>,

    /// Origin base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain one wallpaper from the fastest available tier
    Resolve(ItemArgs),

    /// Re-download one wallpaper, bypassing every cache
    Refresh(ItemArgs),

    /// Check whether a cached wallpaper changed on the origin
    Stale {
        /// Canonical name, e.g. 25.12.21.CS1.png
        name: String,
    },

    /// List the wallpapers published for a day
    List(ListArgs),

    /// Run a sync pass against the catalog
    Sync(SyncArgs),

    /// Check whether a sync pass would download anything
    Check,

    /// Show the catalog manifest
    Manifest,

    /// Cache management
    Cache(CacheArgs),
}

/// Arguments for single-item commands
#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    /// Canonical name, e.g. 25.12.21.CS1.png or 2.28.EH2.png
    pub name: String,

    /// Write the wallpaper to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Day to list (YYYY-MM-DD)
    pub date: NaiveDate,

    /// Only this language (C or E)
    #[arg(short, long)]
    pub language: Option<Language>,

    /// Only this orientation (S or H)
    #[arg(short, long)]
    pub orientation: Option<Orientation>,
}

/// Arguments for the sync command
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// incremental, stale-only, forced or clean (default from config)
    #[arg(short, long)]
    pub policy: Option<SyncPolicy>,

    /// Only the last N days ending today
    #[arg(long, value_name = "DAYS", conflicts_with = "dates")]
    pub recent: Option<u32>,

    /// Only these days (YYYY-MM-DD), repeatable
    #[arg(long = "date", value_name = "DATE")]
    pub dates: Vec<NaiveDate>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache size on disk
    Usage,

    /// Show cache statistics and information
    Stats,

    /// Remove every cached wallpaper
    Clear {
        /// Also forget the sync record
        #[arg(long)]
        reset_sync: bool,
    },

    /// Remove one wallpaper and its validators from the cache
    Invalidate {
        /// Canonical name
        name: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level chosen by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl SyncArgs {
    /// Scope requested on the command line, if narrower than the config
    pub fn scope(&self) -> Option<SyncScope> {
        if let Some(days) = self.recent {
            Some(SyncScope::Recent { days })
        } else if !self.dates.is_empty() {
            Some(SyncScope::Dates {
                dates: self.dates.clone(),
            })
        } else {
            None
        }
    }
}
