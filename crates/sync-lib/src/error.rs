//! Error types for the sync library

use thiserror::Error;

/// Result type alias using the sync library's error
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while building, dispatching or receiving sync records.
///
/// `DeviceIdentityUnset` and `UnknownCategory` signal control-flow bugs
/// upstream. They are propagated to the session loop, which stops, and are
/// never retried.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A record was dispatched before the device identity was established
    #[error("cannot build a sync record because the device id is not set")]
    DeviceIdentityUnset,

    /// A category key that has no entry in the category table
    #[error("unknown sync category key: {0}")]
    UnknownCategory(String),

    /// The outbound channel has been closed by the receiving side
    #[error("outbound sync channel closed")]
    ChannelClosed,

    /// The application state provider could not produce a snapshot
    #[error("state provider error: {0}")]
    StateProvider(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns true for errors that indicate a programming bug rather than a
    /// transient condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::DeviceIdentityUnset | SyncError::UnknownCategory(_)
        )
    }
}
