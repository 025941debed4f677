//! File-backed collaborators of the sync session
//!
//! - `FileSnapshotProvider` reads the local sites and site settings
//! - `JsonInitDataStore` loads and persists the seed and device id

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use sync_lib::{ActionSink, AppStateSnapshot, PersistedSyncState, StateProvider, SyncError};
use tracing::{debug, info, warn};

/// Reads the application state file on every snapshot request
#[derive(Debug, Clone)]
pub struct FileSnapshotProvider {
    path: PathBuf,
}

impl FileSnapshotProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateProvider for FileSnapshotProvider {
    fn snapshot(&self) -> sync_lib::Result<AppStateSnapshot> {
        let data = std::fs::read(&self.path).map_err(|e| {
            SyncError::StateProvider(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let snapshot: AppStateSnapshot = serde_json::from_slice(&data)?;

        debug!(
            path = %self.path.display(),
            sites = snapshot.sites.len(),
            site_settings = snapshot.site_settings.len(),
            "Loaded state snapshot"
        );
        Ok(snapshot)
    }
}

/// Persists init data as a small JSON document
#[derive(Debug, Clone)]
pub struct JsonInitDataStore {
    path: PathBuf,
}

impl JsonInitDataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted init data; a missing file means first run
    pub fn load(&self) -> Result<PersistedSyncState> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No persisted sync state found");
            return Ok(PersistedSyncState::default());
        }

        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read sync state {:?}", self.path))?;
        let state = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse sync state {:?}", self.path))?;

        Ok(state)
    }

    /// Write the init data atomically
    pub fn save(&self, state: &PersistedSyncState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let json = serde_json::to_vec_pretty(state).context("Failed to serialize sync state")?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

        file.write_all(&json).context("Failed to write sync state")?;
        file.sync_all().context("Failed to sync state file")?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, self.path))?;

        Ok(())
    }
}

impl ActionSink for JsonInitDataStore {
    fn save_init_data(&self, seed: Option<Vec<u8>>, device_id: Option<Vec<u8>>) {
        let state = PersistedSyncState { seed, device_id };
        match self.save(&state) {
            Ok(()) => info!(path = %self.path.display(), "Persisted sync init data"),
            Err(e) => warn!(error = %e, "Failed to persist sync init data"),
        }
    }
}
