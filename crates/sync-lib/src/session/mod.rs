//! Sync session orchestration
//!
//! This module provides:
//! - The session controller (handshake, first-run bootstrap, record intake)
//! - Periodic fetch scheduling
//! - The inbound merge extension point
//! - Interfaces of the external state and action collaborators

mod collaborators;
mod controller;
mod fetch;
mod merge;

#[cfg(test)]
mod tests;

pub use collaborators::{ActionSink, DiscardActions, StateProvider};
pub use controller::{SessionState, SyncSession};
pub use fetch::FetchScheduler;
pub use merge::{DeferredMerge, MergeOutcome, MergeRegistry, RecordMerger};
