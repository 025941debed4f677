//! Application-side data models consumed by the record builders

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag marking a site entry as a bookmark
pub const TAG_BOOKMARK: &str = "bookmark";

/// Tag marking a site entry as a bookmark folder
pub const TAG_BOOKMARK_FOLDER: &str = "bookmark-folder";

/// A bookmark, bookmark folder or history entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_accessed_time: Option<i64>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
}

impl SiteEntry {
    /// Check whether the entry carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// An entry is a bookmark iff it is tagged `bookmark` or `bookmark-folder`
    pub fn is_bookmark(&self) -> bool {
        self.has_tag(TAG_BOOKMARK) || self.has_tag(TAG_BOOKMARK_FOLDER)
    }

    pub fn is_folder(&self) -> bool {
        self.has_tag(TAG_BOOKMARK_FOLDER)
    }
}

/// Per-host configuration
///
/// Every field is optional: a setting that was never touched by the user is
/// absent, which is not the same as `false` or zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    #[serde(default)]
    pub zoom_level: Option<f64>,
    #[serde(default)]
    pub shields_up: Option<bool>,
    #[serde(default)]
    pub safe_browsing: Option<bool>,
    #[serde(default)]
    pub no_script: Option<bool>,
    #[serde(default)]
    pub https_everywhere: Option<bool>,
    #[serde(default)]
    pub fingerprinting_protection: Option<bool>,
    #[serde(default)]
    pub ledger_payments: Option<bool>,
    #[serde(default)]
    pub ledger_payments_shown: Option<bool>,
    /// Source value, e.g. `blockAds`; mapped through the ad control table
    #[serde(default)]
    pub ad_control: Option<String>,
    /// Source value, e.g. `allowAllCookies`; mapped through the cookie control table
    #[serde(default)]
    pub cookie_control: Option<String>,
}

/// Read-only snapshot of the application state the session bootstraps from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSnapshot {
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    /// Keyed by host pattern
    #[serde(default)]
    pub site_settings: BTreeMap<String, SiteSetting>,
}

impl AppStateSnapshot {
    /// Iterate over the bookmark entries only, skipping plain history
    pub fn bookmarks(&self) -> impl Iterator<Item = &SiteEntry> {
        self.sites.iter().filter(|site| site.is_bookmark())
    }
}

/// Init data persisted by the host between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSyncState {
    #[serde(default)]
    pub seed: Option<Vec<u8>>,
    #[serde(default)]
    pub device_id: Option<Vec<u8>>,
}

impl PersistedSyncState {
    /// First run means neither a seed nor a device id was ever persisted
    pub fn is_first_run(&self) -> bool {
        self.seed.is_none() && self.device_id.is_none()
    }
}
