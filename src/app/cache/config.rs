//! Cache configuration types and defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::cache;

/// Configuration for the tiered cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Number of items kept in the memory tier (0 disables it)
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None, // Will use OS-specific cache directory
            memory_capacity: cache::DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Set the memory tier capacity in items
    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }
}
