//! Core types for the catalog manifest
//!
//! The manifest is a small JSON document published next to the wallpapers:
//!
//! ```json
//! {"version": 3, "lastUpdated": "2025-12-21", "startDate": "2025-12-21",
//!  "endDate": "2026-02-28", "totalCount": 560}
//! ```
//!
//! Its version gates bulk synchronization and its date range defines which
//! items exist.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::app::models::{items_for_date, ItemKey};
use crate::constants::catalog::{ITEMS_PER_DAY, MAX_YEAR, MIN_YEAR};
use crate::constants::origin;
use crate::errors::{ManifestError, ManifestResult};

/// Description of the published catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogManifest {
    /// Monotonically increasing catalog version; 0 means never synced
    pub version: u64,
    /// Free-form publication date
    pub last_updated: String,
    /// First day of the catalog (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the catalog (inclusive)
    pub end_date: NaiveDate,
    /// Advertised item count, if the publisher included one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u32>,
}

impl CatalogManifest {
    /// Manifest compiled into the application, used whenever the remote one
    /// cannot be obtained
    pub fn fallback() -> Self {
        Self {
            version: 1,
            last_updated: "2025-12-21".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 12, 21).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap_or_default(),
            total_count: Some(560),
        }
    }

    /// Parse and validate a manifest payload
    pub fn from_json(payload: &[u8]) -> ManifestResult<Self> {
        let manifest: Self = serde_json::from_slice(payload)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject inverted date ranges and years item names cannot represent
    pub fn validate(&self) -> ManifestResult<()> {
        if self.start_date > self.end_date {
            return Err(ManifestError::InvalidRange {
                start: self.start_date.to_string(),
                end: self.end_date.to_string(),
            });
        }
        let supported = MIN_YEAR..=MAX_YEAR;
        if !supported.contains(&self.start_date.year()) || !supported.contains(&self.end_date.year())
        {
            return Err(ManifestError::UnsupportedYears {
                start: self.start_date.to_string(),
                end: self.end_date.to_string(),
                min: MIN_YEAR,
                max: MAX_YEAR,
            });
        }
        Ok(())
    }

    /// Every day of the catalog in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }

    pub fn day_count(&self) -> usize {
        if self.start_date > self.end_date {
            0
        } else {
            (self.end_date - self.start_date).num_days() as usize + 1
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// All item keys: date ascending, then language, orientation and sequence
    pub fn item_keys(&self) -> Vec<ItemKey> {
        self.days().flat_map(items_for_date).collect()
    }

    /// Advertised count, or what the date range implies
    pub fn approx_item_count(&self) -> usize {
        self.total_count
            .map(|count| count as usize)
            .unwrap_or_else(|| self.day_count() * ITEMS_PER_DAY)
    }
}

/// Where a manifest came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestSource {
    Remote,
    Fallback,
}

/// Manifest plus its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    pub manifest: CatalogManifest,
    pub source: ManifestSource,
}

/// Location of the manifest on the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Platform directory, e.g. `ios`
    pub platform: String,
    /// Manifest object name
    pub file_name: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            platform: origin::PLATFORM.to_string(),
            file_name: origin::MANIFEST_FILE.to_string(),
        }
    }
}

impl ManifestConfig {
    /// Origin-relative path of the manifest
    pub fn path(&self) -> String {
        let platform = self.platform.trim_matches('/');
        if platform.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", platform, self.file_name)
        }
    }
}
