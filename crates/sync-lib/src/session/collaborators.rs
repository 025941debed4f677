//! External collaborators consumed by the sync session

use crate::error::Result;
use crate::models::AppStateSnapshot;

/// Read-only source of truth for local application state
pub trait StateProvider: Send + Sync {
    /// Current sites and site settings
    fn snapshot(&self) -> Result<AppStateSnapshot>;
}

/// Sink for persisting newly learned sync configuration
///
/// Fire-and-forget: the session neither waits for nor verifies persistence.
pub trait ActionSink: Send + Sync {
    fn save_init_data(&self, seed: Option<Vec<u8>>, device_id: Option<Vec<u8>>);
}

/// A fixed snapshot serves as its own provider
impl StateProvider for AppStateSnapshot {
    fn snapshot(&self) -> Result<AppStateSnapshot> {
        Ok(self.clone())
    }
}

/// Action sink that discards every request
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardActions;

impl ActionSink for DiscardActions {
    fn save_init_data(&self, _seed: Option<Vec<u8>>, _device_id: Option<Vec<u8>>) {}
}
