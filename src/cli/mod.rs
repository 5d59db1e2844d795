//! Command-line interface components
//!
//! This module contains CLI-specific code for the Wallpaper Fetcher
//! application, including argument parsing, command handlers and progress
//! display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    CacheAction, CacheArgs, Cli, Commands, GlobalArgs, ItemArgs, ListArgs, SyncArgs,
};
pub use commands::{
    apply_global_args, handle_cache, handle_check, handle_list, handle_manifest, handle_resolve,
    handle_stale, handle_sync, Services,
};
pub use progress::{ProgressConfig, ProgressDisplay, ProgressHandle};
