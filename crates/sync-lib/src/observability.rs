//! Observability infrastructure for the sync subsystem
//!
//! Provides:
//! - Prometheus metrics (records dispatched, batches sent, fetch requests, inbound batches)
//! - Structured JSON logging with tracing

use crate::records::{Action, Category};
use prometheus::{
    register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Outcome label for accepted inbound batches
pub const INBOUND_ACCEPTED: &str = "accepted";

/// Outcome label for dropped inbound batches
pub const INBOUND_DROPPED: &str = "dropped";

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SyncMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct SyncMetricsInner {
    records_dispatched: IntCounterVec,
    batches_sent: IntCounterVec,
    fetch_requests: IntCounter,
    inbound_batches: IntCounterVec,
    bootstrap_runs: IntCounter,
}

impl SyncMetricsInner {
    fn new() -> Self {
        Self {
            records_dispatched: register_int_counter_vec!(
                "site_sync_records_dispatched_total",
                "Records stamped and sent to the outbound channel",
                &["category", "action"]
            )
            .expect("Failed to register records_dispatched"),

            batches_sent: register_int_counter_vec!(
                "site_sync_batches_sent_total",
                "Record batches sent to the outbound channel",
                &["category"]
            )
            .expect("Failed to register batches_sent"),

            fetch_requests: register_int_counter!(
                "site_sync_fetch_requests_total",
                "Periodic fetch requests issued"
            )
            .expect("Failed to register fetch_requests"),

            inbound_batches: register_int_counter_vec!(
                "site_sync_inbound_batches_total",
                "Inbound record batches by outcome",
                &["outcome"]
            )
            .expect("Failed to register inbound_batches"),

            bootstrap_runs: register_int_counter!(
                "site_sync_bootstrap_runs_total",
                "First-run bootstrap uploads performed"
            )
            .expect("Failed to register bootstrap_runs"),
        }
    }
}

/// Sync metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct SyncMetrics {
    _private: (),
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SyncMetrics")
    }
}

impl SyncMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SyncMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SyncMetricsInner {
        GLOBAL_METRICS.get_or_init(SyncMetricsInner::new)
    }

    /// Record one outbound batch of `count` records
    pub fn observe_batch(&self, category: Category, action: Action, count: usize) {
        let inner = self.inner();
        inner
            .records_dispatched
            .with_label_values(&[category.name(), action.name()])
            .inc_by(count as u64);
        inner
            .batches_sent
            .with_label_values(&[category.name()])
            .inc();
    }

    pub fn inc_fetch_requests(&self) {
        self.inner().fetch_requests.inc();
    }

    /// Count an inbound batch under `INBOUND_ACCEPTED` or `INBOUND_DROPPED`
    pub fn inc_inbound_batches(&self, outcome: &str) {
        self.inner()
            .inbound_batches
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn inc_bootstrap_runs(&self) {
        self.inner().bootstrap_runs.inc();
    }

    pub fn fetch_requests(&self) -> u64 {
        self.inner().fetch_requests.get()
    }

    pub fn batches_sent(&self, category: Category) -> u64 {
        self.inner()
            .batches_sent
            .with_label_values(&[category.name()])
            .get()
    }
}

/// Structured logger for sync events
///
/// Provides consistent JSON-formatted logging for session lifecycle,
/// dispatch, and inbound intake events.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    device_name: String,
}

impl StructuredLogger {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
        }
    }

    /// Log session start
    pub fn log_session_started(&self, first_run: bool) {
        info!(
            event = "session_started",
            device = %self.device_name,
            first_run = first_run,
            "Sync session started"
        );
    }

    /// Log that sync is disabled by configuration
    pub fn log_session_disabled(&self) {
        info!(
            event = "session_disabled",
            device = %self.device_name,
            "Sync disabled by configuration"
        );
    }

    /// Log adoption of a newly negotiated device id
    pub fn log_device_adopted(&self, device_id: &str) {
        info!(
            event = "device_adopted",
            device = %self.device_name,
            device_id = %device_id,
            "Adopted device id from handshake"
        );
    }

    /// Log completion of the first-run bootstrap upload
    pub fn log_bootstrap_complete(&self, bookmarks: usize, site_settings: usize) {
        info!(
            event = "bootstrap_complete",
            device = %self.device_name,
            bookmarks = bookmarks,
            site_settings = site_settings,
            "Seeded sync service with local data"
        );
    }

    /// Log an outbound record batch
    pub fn log_records_sent(&self, category: Category, action: Action, count: usize) {
        debug!(
            event = "records_sent",
            device = %self.device_name,
            category = %category,
            action = %action,
            records = count,
            "Sent sync records"
        );
    }

    /// Log a dropped inbound batch
    pub fn log_inbound_dropped(&self, category_name: &str, reason: &str) {
        debug!(
            event = "inbound_dropped",
            device = %self.device_name,
            category = %category_name,
            reason = %reason,
            "Dropped inbound sync records"
        );
    }

    /// Log a debug message forwarded from the UI sync layer
    pub fn log_sync_debug(&self, message: &str) {
        info!(
            event = "sync_debug",
            device = %self.device_name,
            message = %message,
            "sync debug"
        );
    }

    /// Log session shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "session_shutdown",
            device = %self.device_name,
            reason = %reason,
            "Sync session shutting down"
        );
    }

    /// Log a fatal session error
    pub fn log_fatal(&self, error: &str) {
        warn!(
            event = "session_failed",
            device = %self.device_name,
            error = %error,
            "Sync session stopped on fatal error"
        );
    }
}
