//! Host configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use sync_lib::SyncConfig;

const CONFIG_FILE_ENV: &str = "SYNC_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "site-sync.toml";

/// Host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON file holding the local sites and site settings
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// JSON file holding the persisted seed and device id
    #[serde(default = "default_persisted_state_path")]
    pub persisted_state_path: PathBuf,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between periodic fetch requests
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub debug: bool,
}

fn default_api_port() -> u16 {
    8080
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("state/snapshot.json")
}

fn default_persisted_state_path() -> PathBuf {
    PathBuf::from("state/sync-init.json")
}

fn default_enabled() -> bool {
    SyncConfig::default().enabled
}

fn default_fetch_interval_secs() -> u64 {
    SyncConfig::default().fetch_interval_secs
}

fn default_device_name() -> String {
    SyncConfig::default().device_name
}

fn default_server_url() -> String {
    SyncConfig::default().server_url
}

fn default_api_version() -> String {
    SyncConfig::default().api_version
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            snapshot_path: default_snapshot_path(),
            persisted_state_path: default_persisted_state_path(),
            enabled: default_enabled(),
            fetch_interval_secs: default_fetch_interval_secs(),
            device_name: default_device_name(),
            server_url: default_server_url(),
            api_version: default_api_version(),
            debug: false,
        }
    }
}

impl HostConfig {
    /// Load configuration from the optional config file, then environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    fn load_from(file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("SYNC").try_parsing(true))
            .build()
            .context("failed to read host configuration")?;

        config
            .try_deserialize()
            .context("invalid host configuration")
    }

    /// Sync session settings carried by this configuration
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            enabled: self.enabled,
            fetch_interval_secs: self.fetch_interval_secs,
            device_name: self.device_name.clone(),
            server_url: self.server_url.clone(),
            api_version: self.api_version.clone(),
            debug: self.debug,
        }
    }
}
