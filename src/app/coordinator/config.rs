//! Configuration structures for the sync coordinator
//!
//! This module defines what a sync pass does ([`SyncPolicy`]), which items it
//! covers ([`SyncScope`]) and where the manifest lives.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::app::manifest::ManifestConfig;
use crate::constants::catalog::{MAX_YEAR, MIN_YEAR};

/// What a sync pass does with the items in scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Version-gated: download only what is neither bundled nor cached
    #[default]
    Incremental,
    /// Probe cached items and re-download the ones the origin changed
    StaleOnly,
    /// Re-download every non-bundled item with cache-busting
    Forced,
    /// Wipe the cache and the sync record, then behave as `Forced`
    Clean,
}

impl SyncPolicy {
    /// Whether the pass writes the sync record when it completes
    pub fn persists_record(self) -> bool {
        !matches!(self, SyncPolicy::StaleOnly)
    }

    /// Whether downloads bypass intermediary caches
    pub fn busts_cache(self) -> bool {
        !matches!(self, SyncPolicy::Incremental)
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncPolicy::Incremental => "incremental",
            SyncPolicy::StaleOnly => "stale-only",
            SyncPolicy::Forced => "forced",
            SyncPolicy::Clean => "clean",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incremental" => Ok(SyncPolicy::Incremental),
            "stale-only" | "stale" => Ok(SyncPolicy::StaleOnly),
            "forced" | "force" => Ok(SyncPolicy::Forced),
            "clean" => Ok(SyncPolicy::Clean),
            other => Err(format!("unknown sync policy '{}'", other)),
        }
    }
}

/// Which days a pass covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum SyncScope {
    /// The full manifest range
    #[default]
    Catalog,
    /// The last `days` days ending today
    Recent { days: u32 },
    /// Specific dates
    Dates { dates: Vec<NaiveDate> },
}

impl SyncScope {
    /// Only full-catalog passes are version-gated and recorded
    pub fn is_catalog(&self) -> bool {
        matches!(self, SyncScope::Catalog)
    }

    /// Days in scope, ascending, clipped to the manifest range and, for
    /// partial scopes, to unlocked days. Days outside the two-digit naming
    /// window are never included.
    pub fn days(&self, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
        let in_range = |day: &NaiveDate| {
            *day >= start && *day <= end && (MIN_YEAR..=MAX_YEAR).contains(&day.year())
        };
        let mut days: Vec<NaiveDate> = match self {
            SyncScope::Catalog => start
                .iter_days()
                .take_while(|d| *d <= end)
                .filter(in_range)
                .collect(),
            SyncScope::Recent { days } => {
                let span = i64::from((*days).max(1));
                let first = today
                    .checked_sub_signed(Duration::days(span - 1))
                    .unwrap_or(start)
                    .max(start);
                first
                    .iter_days()
                    .take_while(|d| *d <= today)
                    .filter(in_range)
                    .collect()
            }
            SyncScope::Dates { dates } => dates
                .iter()
                .copied()
                .filter(|d| in_range(d) && *d <= today)
                .collect(),
        };
        days.sort();
        days.dedup();
        days
    }
}

/// Configuration for the sync coordinator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Items covered by each pass
    pub scope: SyncScope,
    /// Manifest location on the origin
    pub manifest: ManifestConfig,
}

impl SyncConfig {
    pub fn with_scope(mut self, scope: SyncScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_manifest(mut self, manifest: ManifestConfig) -> Self {
        self.manifest = manifest;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match &self.scope {
            SyncScope::Recent { days: 0 } => {
                return Err("Recent scope must cover at least one day".to_string())
            }
            SyncScope::Dates { dates } if dates.is_empty() => {
                return Err("Date scope cannot be empty".to_string())
            }
            _ => {}
        }
        if self.manifest.file_name.trim().is_empty() {
            return Err("Manifest file name cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Test that default configuration is valid
    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scope, SyncScope::Catalog);
        assert_eq!(SyncPolicy::default(), SyncPolicy::Incremental);
    }

    #[test]
    fn test_invalid_scopes() {
        let config = SyncConfig::default().with_scope(SyncScope::Recent { days: 0 });
        assert!(config.validate().is_err());
        let config = SyncConfig::default().with_scope(SyncScope::Dates { dates: vec![] });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_parsing_and_flags() {
        assert_eq!("stale-only".parse::<SyncPolicy>(), Ok(SyncPolicy::StaleOnly));
        assert_eq!("FORCED".parse::<SyncPolicy>(), Ok(SyncPolicy::Forced));
        assert!("sometimes".parse::<SyncPolicy>().is_err());
        assert!(!SyncPolicy::StaleOnly.persists_record());
        assert!(SyncPolicy::Clean.persists_record());
        assert!(!SyncPolicy::Incremental.busts_cache());
        assert_eq!(SyncPolicy::StaleOnly.to_string(), "stale-only");
    }

    /// Partial scopes never reach past today or outside the manifest range
    #[test]
    fn test_scope_days() {
        let start = date(2025, 12, 21);
        let end = date(2026, 2, 28);
        let today = date(2026, 1, 2);

        assert_eq!(SyncScope::Catalog.days(start, end, today).len(), 70);

        let recent = SyncScope::Recent { days: 3 }.days(start, end, today);
        assert_eq!(recent, vec![date(2025, 12, 31), date(2026, 1, 1), date(2026, 1, 2)]);

        let early = SyncScope::Recent { days: 7 }.days(start, end, date(2025, 12, 22));
        assert_eq!(early, vec![date(2025, 12, 21), date(2025, 12, 22)]);

        let dates = SyncScope::Dates {
            dates: vec![date(2026, 1, 1), date(2025, 1, 1), date(2026, 1, 1), date(2026, 2, 1)],
        }
        .days(start, end, today);
        assert_eq!(dates, vec![date(2026, 1, 1)]);
    }

    /// A very wide recent window is clipped to the manifest start
    #[test]
    fn test_recent_scope_with_huge_window() {
        let scope = SyncScope::Recent { days: u32::MAX };
        assert!(SyncConfig::default().with_scope(scope.clone()).validate().is_ok());

        let start = date(2025, 12, 21);
        let days = scope.days(start, date(2026, 2, 28), date(2026, 1, 2));
        assert_eq!(days.len(), 13);
        assert_eq!(days.first(), Some(&start));
        assert_eq!(days.last(), Some(&date(2026, 1, 2)));
    }

    /// Dates whose names would collide with another century are dropped
    #[test]
    fn test_scope_days_skip_unsupported_years() {
        let start = date(1990, 1, 1);
        let end = date(2200, 12, 31);
        let today = date(2200, 1, 1);

        let dates = SyncScope::Dates {
            dates: vec![date(1999, 12, 31), date(2025, 12, 21), date(2125, 12, 21)],
        }
        .days(start, end, today);
        assert_eq!(dates, vec![date(2025, 12, 21)]);

        let recent = SyncScope::Recent { days: 3 }.days(start, end, date(2100, 1, 1));
        assert_eq!(recent, vec![date(2099, 12, 30), date(2099, 12, 31)]);
    }
}
