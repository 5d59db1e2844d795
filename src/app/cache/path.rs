//! On-disk layout of the item cache
//!
//! ```text
//! {cache_root}/ItemCache/{name}
//! {cache_root}/ItemCache/metadata/{name}.etag
//! {cache_root}/ItemCache/metadata/{name}.lastmod
//! ```

use std::path::{Path, PathBuf};

use crate::constants::{cache, files};
use crate::errors::{CacheError, CacheResult};

/// Path generation utility for cache files
pub struct PathGenerator;

impl PathGenerator {
    /// Directory holding item bytes
    pub fn item_dir(cache_root: &Path) -> PathBuf {
        cache_root.join(cache::ITEM_DIR)
    }

    /// Directory holding validator files
    pub fn metadata_dir(cache_root: &Path) -> PathBuf {
        Self::item_dir(cache_root).join(cache::METADATA_DIR)
    }

    pub fn item_path(cache_root: &Path, name: &str) -> PathBuf {
        Self::item_dir(cache_root).join(name)
    }

    pub fn etag_path(cache_root: &Path, name: &str) -> PathBuf {
        Self::metadata_dir(cache_root).join(format!("{}.{}", name, cache::ETAG_EXTENSION))
    }

    pub fn last_modified_path(cache_root: &Path, name: &str) -> PathBuf {
        Self::metadata_dir(cache_root).join(format!(
            "{}.{}",
            name,
            cache::LAST_MODIFIED_EXTENSION
        ))
    }

    /// Sibling path used while a file is being written
    pub fn temp_path(final_path: &Path) -> PathBuf {
        let mut name = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(files::TEMP_FILE_SUFFIX);
        final_path.with_file_name(name)
    }

    /// Reject names that would escape the item directory
    pub fn validate_name(name: &str) -> CacheResult<()> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
            || name.ends_with(files::TEMP_FILE_SUFFIX);
        if invalid {
            Err(CacheError::InvalidName {
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let root = Path::new("/cache");
        assert_eq!(
            PathGenerator::item_path(root, "25.12.1.CS1.png"),
            PathBuf::from("/cache/ItemCache/25.12.1.CS1.png")
        );
        assert_eq!(
            PathGenerator::etag_path(root, "25.12.1.CS1.png"),
            PathBuf::from("/cache/ItemCache/metadata/25.12.1.CS1.png.etag")
        );
        assert_eq!(
            PathGenerator::last_modified_path(root, "1.1.EH2.png"),
            PathBuf::from("/cache/ItemCache/metadata/1.1.EH2.png.lastmod")
        );
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            PathGenerator::temp_path(Path::new("/cache/ItemCache/1.1.EH2.png")),
            PathBuf::from("/cache/ItemCache/1.1.EH2.png.tmp")
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(PathGenerator::validate_name("25.12.1.CS1.png").is_ok());
        for bad in ["", ".", "..", "a/b.png", "..\\x", "x.png.tmp"] {
            assert!(PathGenerator::validate_name(bad).is_err(), "{:?}", bad);
        }
    }
}
