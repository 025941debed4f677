//! Site sync library
//!
//! This crate provides the core functionality for:
//! - Building sync records from local sites and site settings
//! - Resolving record kinds to sync categories
//! - Device identity management
//! - Dispatching record batches over the outbound channel
//! - Sync session control (handshake, bootstrap, periodic fetch)
//! - Health checks and observability

pub mod config;
pub mod error;
pub mod health;
pub mod identity;
pub mod models;
pub mod observability;
pub mod records;
pub mod session;
pub mod sync;

pub use config::{ClientConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use identity::DeviceIdentity;
pub use models::*;
pub use observability::{StructuredLogger, SyncMetrics};
pub use session::{ActionSink, SessionState, StateProvider, SyncSession};
