//! Category resolution for sync records
//!
//! Every record kind belongs to exactly one wire-level category. The mapping
//! is a fixed table; a key outside of it means a new entity kind was added
//! without updating this module.

use crate::error::{Result, SyncError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Top-level sync record class used to route and batch records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Bookmarks,
    HistorySites,
    Preferences,
}

impl Category {
    /// All known categories, in the order they are requested on fetch
    pub const ALL: [Category; 3] = [
        Category::Bookmarks,
        Category::HistorySites,
        Category::Preferences,
    ];

    /// Wire-level category name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Bookmarks => "BOOKMARKS",
            Category::HistorySites => "HISTORY_SITES",
            Category::Preferences => "PREFERENCES",
        }
    }

    /// Look up a category by its wire-level name
    pub fn from_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical kind of a record; its key names the payload field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Bookmark,
    HistorySite,
    SiteSetting,
    Device,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Bookmark,
        RecordKind::HistorySite,
        RecordKind::SiteSetting,
        RecordKind::Device,
    ];

    /// Category key, e.g. `historySite`
    pub fn key(&self) -> &'static str {
        match self {
            RecordKind::Bookmark => "bookmark",
            RecordKind::HistorySite => "historySite",
            RecordKind::SiteSetting => "siteSetting",
            RecordKind::Device => "device",
        }
    }

    /// The category this kind is batched under
    pub fn category(&self) -> Category {
        match self {
            RecordKind::Bookmark => Category::Bookmarks,
            RecordKind::HistorySite => Category::HistorySites,
            RecordKind::SiteSetting => Category::Preferences,
            RecordKind::Device => Category::Preferences,
        }
    }
}

impl FromStr for RecordKind {
    type Err = SyncError;

    fn from_str(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| SyncError::UnknownCategory(key.to_string()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolve a category key to its category, failing on keys outside the table
pub fn resolve_category(key: &str) -> Result<Category> {
    key.parse::<RecordKind>().map(|kind| kind.category())
}
