//! Item identity for the wallpaper catalog
//!
//! Every wallpaper is identified by a date, a language, an orientation and a
//! sequence number within that day. This module derives from that identity
//! the canonical object name, the remote object path on the origin and the
//! relative path inside the bundled assets. All functions here are pure.
//!
//! Names depend on the year: the production catalog year drops the year
//! component (`12.1.CS1.png`), every other year carries a two digit prefix
//! (`25.12.1.CS1.png`). Month and day are never zero padded.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::catalog::{BUNDLE_DIR, MAX_YEAR, MIN_YEAR, MONTH_ONLY_YEAR};

/// Caption language of a wallpaper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Chinese, Language::English];

    /// Single letter used in object names
    pub fn code(self) -> char {
        match self {
            Language::Chinese => 'C',
            Language::English => 'E',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Language::Chinese),
            'E' => Some(Language::English),
            _ => None,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "zh" | "chinese" => Ok(Language::Chinese),
            "e" | "en" | "english" => Ok(Language::English),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

/// Screen orientation of a wallpaper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Portrait, Orientation::Landscape];

    /// Single letter used in object names
    pub fn code(self) -> char {
        match self {
            Orientation::Portrait => 'S',
            Orientation::Landscape => 'H',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'S' => Some(Orientation::Portrait),
            'H' => Some(Orientation::Landscape),
            _ => None,
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "portrait" => Ok(Orientation::Portrait),
            "h" | "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

/// Position of a wallpaper within its day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sequence {
    First,
    Second,
}

impl Sequence {
    pub const ALL: [Sequence; 2] = [Sequence::First, Sequence::Second];

    pub fn number(self) -> u8 {
        match self {
            Sequence::First => 1,
            Sequence::Second => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Sequence::First),
            2 => Some(Sequence::Second),
            _ => None,
        }
    }
}

/// How object names and paths are laid out for a given year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// `{yy}.{m}.{d}.{L}{O}{n}.png` under `{collection}/{yy}/{m}/`
    YearPrefixed,
    /// `{m}.{d}.{L}{O}{n}.png` under `{collection}/{m}/`
    MonthOnly,
}

impl NamingScheme {
    /// Scheme used by the origin for `year`
    pub fn for_year(year: i32) -> Self {
        if year == MONTH_ONLY_YEAR {
            NamingScheme::MonthOnly
        } else {
            NamingScheme::YearPrefixed
        }
    }
}

/// Logical identity of one wallpaper
///
/// Ordering is date first, then language, orientation and sequence, which is
/// the order a day is expanded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey {
    pub date: NaiveDate,
    pub language: Language,
    pub orientation: Orientation,
    pub sequence: Sequence,
}

impl ItemKey {
    pub fn new(
        date: NaiveDate,
        language: Language,
        orientation: Orientation,
        sequence: Sequence,
    ) -> Self {
        Self {
            date,
            language,
            orientation,
            sequence,
        }
    }

    /// Whether the date falls in the range names can represent unambiguously
    pub fn is_supported(&self) -> bool {
        (MIN_YEAR..=MAX_YEAR).contains(&self.date.year())
    }

    pub fn scheme(&self) -> NamingScheme {
        NamingScheme::for_year(self.date.year())
    }

    fn short_year(&self) -> i32 {
        self.date.year().rem_euclid(100)
    }

    /// Name without extension, e.g. `25.12.1.CS1`
    pub fn stem(&self) -> String {
        let suffix = format!(
            "{}{}{}",
            self.language.code(),
            self.orientation.code(),
            self.sequence.number()
        );
        match self.scheme() {
            NamingScheme::YearPrefixed => format!(
                "{:02}.{}.{}.{}",
                self.short_year(),
                self.date.month(),
                self.date.day(),
                suffix
            ),
            NamingScheme::MonthOnly => {
                format!("{}.{}.{}", self.date.month(), self.date.day(), suffix)
            }
        }
    }

    /// Canonical object name, used as the cache key everywhere
    pub fn canonical_name(&self) -> String {
        format!("{}.png", self.stem())
    }

    /// Directory of the item relative to a collection or bundle root
    fn directory(&self) -> String {
        match self.scheme() {
            NamingScheme::YearPrefixed => {
                format!("{:02}/{}", self.short_year(), self.date.month())
            }
            NamingScheme::MonthOnly => self.date.month().to_string(),
        }
    }

    /// Object path on the origin, without leading slash
    pub fn remote_path(&self, collection: &str) -> String {
        let collection = collection.trim_matches('/');
        if collection.is_empty() {
            format!("{}/{}", self.directory(), self.canonical_name())
        } else {
            format!(
                "{}/{}/{}",
                collection,
                self.directory(),
                self.canonical_name()
            )
        }
    }

    /// Path inside the bundled assets
    pub fn bundle_path(&self) -> PathBuf {
        let mut path = PathBuf::from(BUNDLE_DIR);
        for part in self.directory().split('/') {
            path.push(part);
        }
        path.push(self.canonical_name());
        path
    }

    /// A wallpaper becomes visible on its own date
    pub fn is_unlocked(&self, today: NaiveDate) -> bool {
        self.date <= today
    }

    /// Parse a canonical name back into its key
    pub fn from_canonical_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".png")?;
        let parts: Vec<&str> = stem.split('.').collect();
        let (year, month, day, code) = match parts.as_slice() {
            [yy, m, d, code] if yy.len() == 2 => {
                let year = 2000 + yy.parse::<i32>().ok()?;
                if NamingScheme::for_year(year) != NamingScheme::YearPrefixed {
                    return None;
                }
                (year, *m, *d, *code)
            }
            [m, d, code] => (MONTH_ONLY_YEAR, *m, *d, *code),
            _ => return None,
        };

        if month.starts_with('0') || day.starts_with('0') {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)?;

        let mut chars = code.chars();
        let language = Language::from_code(chars.next()?)?;
        let orientation = Orientation::from_code(chars.next()?)?;
        let sequence = Sequence::from_number(chars.next()?.to_digit(10)? as u8)?;
        if chars.next().is_some() {
            return None;
        }

        Some(Self::new(date, language, orientation, sequence))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for ItemKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical_name(s).ok_or_else(|| format!("not a wallpaper name: '{}'", s))
    }
}

impl TryFrom<String> for ItemKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.canonical_name()
    }
}

/// Where a resolved item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bundled,
    Memory,
    Disk,
    Origin,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Bundled => "bundled",
            Tier::Memory => "memory",
            Tier::Disk => "disk",
            Tier::Origin => "origin",
        };
        write!(f, "{}", label)
    }
}

/// HTTP freshness validators captured from the origin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Validators {
    pub fn new(etag: Option<String>, last_modified: Option<String>) -> Self {
        Self {
            etag: etag.filter(|v| !v.trim().is_empty()),
            last_modified: last_modified.filter(|v| !v.trim().is_empty()),
        }
    }

    /// Neither validator known
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// Whether `remote` describes different content than `self`
    ///
    /// ETags are compared when both sides carry one, otherwise Last-Modified.
    /// A remote validator where none was stored counts as changed; nothing to
    /// compare on either side counts as unchanged.
    pub fn differs_from(&self, remote: &Validators) -> bool {
        if let (Some(local), Some(remote)) = (&self.etag, &remote.etag) {
            return local != remote;
        }
        if let (Some(local), Some(remote)) = (&self.last_modified, &remote.last_modified) {
            return local != remote;
        }
        self.is_empty() && !remote.is_empty()
    }
}

/// The eight items of a day in expansion order
pub fn items_for_date(date: NaiveDate) -> Vec<ItemKey> {
    filtered_items(date, None, None)
}

/// Items of a day restricted to a language and/or orientation
pub fn filtered_items(
    date: NaiveDate,
    language: Option<Language>,
    orientation: Option<Orientation>,
) -> Vec<ItemKey> {
    let mut keys = Vec::with_capacity(8);
    for lang in Language::ALL {
        if language.is_some_and(|l| l != lang) {
            continue;
        }
        for orient in Orientation::ALL {
            if orientation.is_some_and(|o| o != orient) {
                continue;
            }
            for seq in Sequence::ALL {
                keys.push(ItemKey::new(date, lang, orient, seq));
            }
        }
    }
    keys
}
