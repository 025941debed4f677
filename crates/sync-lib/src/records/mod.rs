//! Sync record construction
//!
//! This module provides:
//! - Record builders turning site entries and site settings into payloads
//! - The static category table
//! - The wire-ready record envelope

mod builder;
mod category;
mod types;

pub use builder::{
    build_device_record, build_setting_record, build_site_record, AD_CONTROL_TABLE,
    COOKIE_CONTROL_TABLE,
};
pub use category::{resolve_category, Category, RecordKind};
pub use types::{
    Action, BookmarkValue, DeviceId, DeviceValue, ObjectId, RecordPayload, SiteSettingValue,
    SiteValue, SyncRecord, OBJECT_ID_LEN,
};
