//! Sync session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static configuration of the sync subsystem
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Gates whether the session does anything at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between periodic fetch requests
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    /// Display name sent in this device's own record
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Sync server base URL, forwarded to the UI layer
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Sync API version, forwarded to the UI layer
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Verbose logging in the UI sync layer
    #[serde(default)]
    pub debug: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_fetch_interval_secs() -> u64 {
    60
}

fn default_device_name() -> String {
    "site-sync".to_string()
}

fn default_server_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_api_version() -> String {
    "0".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fetch_interval_secs: default_fetch_interval_secs(),
            device_name: default_device_name(),
            server_url: default_server_url(),
            api_version: default_api_version(),
            debug: false,
        }
    }
}

impl SyncConfig {
    /// Period of the fetch timer; never zero
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs.max(1))
    }

    /// Configuration view handed to the UI layer with the init data
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server_url.clone(),
            api_version: self.api_version.clone(),
            debug: self.debug,
            fetch_interval: self.fetch_interval().as_millis() as u64,
        }
    }
}

/// Serializable configuration sent in GOT_INIT_DATA
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub server_url: String,
    pub api_version: String,
    pub debug: bool,
    /// Milliseconds
    pub fetch_interval: u64,
}
