//! Wire-ready record envelope and payload values

use super::category::{Category, RecordKind};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Serialize, Serializer};
use std::fmt;

/// Length of a freshly generated object identifier
pub const OBJECT_ID_LEN: usize = 16;

/// Action applied to the remote copy of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Numeric action code used on the wire
    pub fn code(&self) -> u8 {
        match self {
            Action::Create => 0,
            Action::Update => 1,
            Action::Delete => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of the originating device, attached to every outgoing record
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(Vec<u8>);

impl DeviceId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.to_hex())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Per-record-instance identifier, never derived from the entity itself
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generate an identifier from the operating system's CSPRNG
    pub fn random() -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// Projected subset of a site entry shared by bookmark and history payloads
///
/// Absent source fields stay `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteValue {
    pub location: Option<String>,
    pub title: Option<String>,
    pub custom_title: Option<String>,
    pub favicon: Option<String>,
    pub last_accessed_time: Option<i64>,
    pub creation_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkValue {
    pub site: SiteValue,
    pub is_folder: bool,
    pub folder_id: Option<i64>,
    pub parent_folder_id: Option<i64>,
}

/// Preference payload for one host pattern
///
/// The two enum fields are left out of the serialized form entirely when the
/// source setting did not provide them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingValue {
    pub host_pattern: String,
    pub zoom_level: Option<f64>,
    pub shields_up: Option<bool>,
    pub safe_browsing: Option<bool>,
    pub no_script: Option<bool>,
    pub https_everywhere: Option<bool>,
    pub fingerprinting_protection: Option<bool>,
    pub ledger_payments: Option<bool>,
    pub ledger_payments_shown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_control: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_control: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceValue {
    pub name: String,
}

/// Record payload, serialized under a key equal to its category key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordPayload {
    Bookmark(BookmarkValue),
    HistorySite(SiteValue),
    SiteSetting(SiteSettingValue),
    Device(DeviceValue),
}

impl RecordPayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordPayload::Bookmark(_) => RecordKind::Bookmark,
            RecordPayload::HistorySite(_) => RecordKind::HistorySite,
            RecordPayload::SiteSetting(_) => RecordKind::SiteSetting,
            RecordPayload::Device(_) => RecordKind::Device,
        }
    }

    /// Category key this payload is embedded under
    pub fn key(&self) -> &'static str {
        self.kind().key()
    }
}

/// Stamped record as handed to the outbound channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub action: Action,
    pub device_id: DeviceId,
    pub object_id: ObjectId,
    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl SyncRecord {
    pub fn category(&self) -> Category {
        self.payload.kind().category()
    }
}
