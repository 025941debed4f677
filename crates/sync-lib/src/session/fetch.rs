//! Periodic fetch scheduling
//!
//! Requests fresh records for every known category at a fixed period. The
//! timer fires regardless of whether earlier requests were answered.

use crate::error::{Result, SyncError};
use crate::observability::SyncMetrics;
use crate::records::Category;
use crate::sync::{OutboundChannel, OutboundMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Recurring FETCH_SYNC_RECORDS timer
pub struct FetchScheduler {
    channel: Arc<dyn OutboundChannel>,
    interval: Duration,
    metrics: SyncMetrics,
}

impl FetchScheduler {
    /// A zero interval is clamped to one second
    pub fn new(channel: Arc<dyn OutboundChannel>, interval: Duration) -> Self {
        Self {
            channel,
            interval: interval.max(MIN_INTERVAL),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Send one fetch request for all categories
    pub fn request(&self) -> Result<()> {
        self.channel.send(OutboundMessage::FetchSyncRecords {
            categories: Category::ALL.to_vec(),
        })?;
        self.metrics.inc_fetch_requests();
        Ok(())
    }

    /// Run until shutdown; the first request goes out one full period after start
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting periodic sync fetch"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        let mut fetch_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.request() {
                        Ok(()) => {
                            fetch_count += 1;
                            debug!(fetches = fetch_count, "Requested sync records");
                        }
                        Err(SyncError::ChannelClosed) => {
                            warn!("Outbound channel closed, stopping periodic fetch");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to request sync records");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down periodic sync fetch");
                    break;
                }
            }
        }
    }
}
