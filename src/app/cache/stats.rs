//! Cache statistics and disk usage monitoring
//!
//! This module provides functionality for monitoring cache usage, including
//! item counts, validator counts and total disk usage.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::{cache, files};

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Items currently held in memory
    pub memory_entries: usize,
    /// Memory tier capacity
    pub memory_capacity: usize,
    /// Items stored on disk
    pub cached_items: usize,
    /// Validator files stored beside the items
    pub validator_files: usize,
    /// Size of everything under the item directory in bytes
    pub total_disk_bytes: u64,
}

impl CacheStats {
    /// Create new cache statistics
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            ..Default::default()
        }
    }

    /// Update memory tier counts
    pub fn set_memory_stats(&mut self, entries: usize, capacity: usize) {
        self.memory_entries = entries;
        self.memory_capacity = capacity;
    }

    /// Update disk usage statistics
    pub fn set_disk_stats(&mut self, usage: DiskUsage) {
        self.cached_items = usage.items;
        self.validator_files = usage.validators;
        self.total_disk_bytes = usage.bytes;
    }

    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_disk_bytes)
    }
}

/// Result of scanning the item directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub items: usize,
    pub validators: usize,
    pub bytes: u64,
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Scan the item directory off the async runtime
    pub async fn scan_item_directory(item_dir: &Path) -> DiskUsage {
        let item_dir = item_dir.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan_directory_sync(&item_dir))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                DiskUsage::default()
            })
    }

    /// Recursively scan a directory; every file counts towards `bytes`
    pub fn scan_directory_sync(dir: &Path) -> DiskUsage {
        let mut usage = DiskUsage::default();

        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();

                if path.is_dir() {
                    let sub = Self::scan_directory_sync(&path);
                    usage.items += sub.items;
                    usage.validators += sub.validators;
                    usage.bytes += sub.bytes;
                } else if path.is_file() {
                    if let Ok(metadata) = entry.metadata() {
                        usage.bytes += metadata.len();
                    }
                    if Self::is_validator_file(&path) {
                        usage.validators += 1;
                    } else if Self::is_item_file(&path) {
                        usage.items += 1;
                    }
                }
            }
        }

        usage
    }

    fn is_item_file(path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        name.ends_with(".png") && !name.ends_with(files::TEMP_FILE_SUFFIX)
    }

    fn is_validator_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(ext) if ext == cache::ETAG_EXTENSION || ext == cache::LAST_MODIFIED_EXTENSION
        )
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024 * 3), "3.00 MB");
    }

    #[tokio::test]
    async fn test_scan_item_directory() {
        let temp_dir = TempDir::new().unwrap();
        let item_dir = temp_dir.path().join("ItemCache");
        let metadata_dir = item_dir.join("metadata");
        std::fs::create_dir_all(&metadata_dir).unwrap();

        std::fs::write(item_dir.join("25.12.1.CS1.png"), vec![0u8; 100]).unwrap();
        std::fs::write(item_dir.join("1.1.EH2.png"), vec![0u8; 50]).unwrap();
        std::fs::write(item_dir.join("1.1.EH1.png.tmp"), vec![0u8; 7]).unwrap();
        std::fs::write(metadata_dir.join("25.12.1.CS1.png.etag"), b"\"abc\"").unwrap();
        std::fs::write(metadata_dir.join("25.12.1.CS1.png.lastmod"), b"x").unwrap();

        let usage = DirectoryScanner::scan_item_directory(&item_dir).await;
        assert_eq!(usage.items, 2);
        assert_eq!(usage.validators, 2);
        assert_eq!(usage.bytes, 100 + 50 + 7 + 5 + 1);
    }

    #[tokio::test]
    async fn test_scan_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let usage = DirectoryScanner::scan_item_directory(&temp_dir.path().join("nope")).await;
        assert_eq!(usage, DiskUsage::default());
    }

    #[test]
    fn test_stats_updates() {
        let mut stats = CacheStats::new(PathBuf::from("/cache"));
        stats.set_memory_stats(3, 50);
        stats.set_disk_stats(DiskUsage {
            items: 10,
            validators: 20,
            bytes: 2048,
        });
        assert_eq!(stats.memory_entries, 3);
        assert_eq!(stats.cached_items, 10);
        assert_eq!(stats.format_cache_size(), "2.00 KB");
    }
}
