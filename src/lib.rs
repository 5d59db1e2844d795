//! Wallpaper Fetcher Library
//!
//! A Rust library for obtaining daily wallpapers from the fastest available
//! source: assets bundled with the application, an in-memory and on-disk
//! cache, or a versioned CDN origin. A sync coordinator keeps the local cache
//! in step with the published catalog.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
