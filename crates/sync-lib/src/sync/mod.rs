//! Outbound record dispatch
//!
//! This module provides:
//! - Inbound and outbound message types of the host/UI channel
//! - The outbound channel seam with mpsc and in-memory implementations
//! - The dispatch engine that stamps and batches records

mod channel;
mod dispatcher;


pub use channel::{InboundMessage, MemoryChannel, OutboundChannel, OutboundMessage};
pub use dispatcher::RecordDispatcher;
