//! Device identity management
//!
//! The device id is unset at process start and set exactly once, either from
//! persisted state on resumption or from an id negotiated with the sync
//! service on first run. It is never reset afterwards.

use crate::records::DeviceId;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Holder of the local device identifier
#[derive(Debug, Default)]
pub struct DeviceIdentity {
    id: OnceLock<DeviceId>,
}

impl DeviceIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current identifier, or `None` while unset
    pub fn get(&self) -> Option<&DeviceId> {
        self.id.get()
    }

    pub fn is_set(&self) -> bool {
        self.id.get().is_some()
    }

    /// Set the identity from previously persisted state
    ///
    /// Calling this again with the same id is a no-op. A different id never
    /// replaces an identity that is already set. Returns true if the identity
    /// was set by this call.
    pub fn initialize(&self, saved: DeviceId) -> bool {
        match self.id.get() {
            Some(current) if *current == saved => {
                debug!(device_id = %current, "Device identity already initialized");
                false
            }
            Some(current) => {
                warn!(
                    device_id = %current,
                    ignored = %saved,
                    "Ignoring persisted device id, identity already set"
                );
                false
            }
            None => {
                let set = self.id.set(saved).is_ok();
                if let Some(id) = self.id.get() {
                    info!(device_id = %id, "Device identity resumed");
                }
                set
            }
        }
    }

    /// Adopt an identifier negotiated during the first handshake
    ///
    /// Only takes effect while the identity is unset. Returns true if the id
    /// was adopted; the caller is then responsible for persisting it.
    pub fn adopt(&self, new_id: DeviceId) -> bool {
        if let Some(current) = self.id.get() {
            debug!(device_id = %current, "Device identity already set, not adopting");
            return false;
        }

        let adopted = self.id.set(new_id).is_ok();
        if adopted {
            if let Some(id) = self.id.get() {
                info!(device_id = %id, "Adopted new device identity");
            }
        }
        adopted
    }
}
