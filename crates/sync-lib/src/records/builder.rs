//! Pure conversion of application entities into record payloads

use super::types::{BookmarkValue, DeviceValue, RecordPayload, SiteSettingValue, SiteValue};
use crate::models::{SiteEntry, SiteSetting};
use tracing::debug;

/// Source ad control values and their wire codes
pub const AD_CONTROL_TABLE: &[(&str, u8)] = &[
    ("showBraveAds", 0),
    ("blockAds", 1),
    ("allowAdsAndTracking", 2),
];

/// Source cookie control values and their wire codes
pub const COOKIE_CONTROL_TABLE: &[(&str, u8)] =
    &[("block3rdPartyCookie", 0), ("allowAllCookies", 1)];

fn lookup(table: &[(&str, u8)], value: &str) -> Option<u8> {
    table
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, code)| *code)
}

fn map_enum(field: &'static str, table: &[(&str, u8)], value: Option<&str>) -> Option<u8> {
    let value = value?;
    let code = lookup(table, value);
    if code.is_none() {
        debug!(field, value, "Unmapped setting value, omitting from record");
    }
    code
}

fn project_site(entry: &SiteEntry) -> SiteValue {
    SiteValue {
        location: entry.location.clone(),
        title: entry.title.clone(),
        custom_title: entry.custom_title.clone(),
        favicon: entry.favicon.clone(),
        last_accessed_time: entry.last_accessed_time,
        creation_time: entry.creation_time,
    }
}

/// Build a bookmark or history payload depending on the entry's tags
pub fn build_site_record(entry: &SiteEntry) -> RecordPayload {
    let site = project_site(entry);

    if entry.is_bookmark() {
        RecordPayload::Bookmark(BookmarkValue {
            site,
            is_folder: entry.is_folder(),
            folder_id: entry.folder_id,
            parent_folder_id: entry.parent_folder_id,
        })
    } else {
        RecordPayload::HistorySite(site)
    }
}

/// Build a preference payload for the settings of one host pattern
pub fn build_setting_record(host_pattern: &str, setting: &SiteSetting) -> RecordPayload {
    RecordPayload::SiteSetting(SiteSettingValue {
        host_pattern: host_pattern.to_string(),
        zoom_level: setting.zoom_level,
        shields_up: setting.shields_up,
        safe_browsing: setting.safe_browsing,
        no_script: setting.no_script,
        https_everywhere: setting.https_everywhere,
        fingerprinting_protection: setting.fingerprinting_protection,
        ledger_payments: setting.ledger_payments,
        ledger_payments_shown: setting.ledger_payments_shown,
        ad_control: map_enum("adControl", AD_CONTROL_TABLE, setting.ad_control.as_deref()),
        cookie_control: map_enum(
            "cookieControl",
            COOKIE_CONTROL_TABLE,
            setting.cookie_control.as_deref(),
        ),
    })
}

/// Build the record announcing this device
pub fn build_device_record(name: impl Into<String>) -> RecordPayload {
    RecordPayload::Device(DeviceValue { name: name.into() })
}
