//! Record batching and dispatch
//!
//! Stamps every payload of a batch with the action, a fresh random object id
//! and the device id, then hands the batch to the outbound channel as one
//! message.

use super::channel::{OutboundChannel, OutboundMessage};
use crate::error::{Result, SyncError};
use crate::identity::DeviceIdentity;
use crate::observability::{StructuredLogger, SyncMetrics};
use crate::records::{Action, ObjectId, RecordPayload, SyncRecord};
use std::sync::Arc;

/// Dispatch engine for outbound record batches
#[derive(Debug, Clone)]
pub struct RecordDispatcher {
    identity: Arc<DeviceIdentity>,
    metrics: SyncMetrics,
    logger: StructuredLogger,
}

impl RecordDispatcher {
    pub fn new(identity: Arc<DeviceIdentity>, logger: StructuredLogger) -> Self {
        Self {
            identity,
            metrics: SyncMetrics::new(),
            logger,
        }
    }

    pub fn identity(&self) -> &Arc<DeviceIdentity> {
        &self.identity
    }

    /// Send `records` as a single batch
    ///
    /// The batch category comes from the first record; callers group records
    /// by category beforehand. An empty batch sends nothing. Fails with
    /// `DeviceIdentityUnset` while no device id is known.
    pub fn dispatch(
        &self,
        channel: &dyn OutboundChannel,
        action: Action,
        records: Vec<RecordPayload>,
    ) -> Result<()> {
        let device_id = self
            .identity
            .get()
            .ok_or(SyncError::DeviceIdentityUnset)?
            .clone();

        let Some(first) = records.first() else {
            return Ok(());
        };
        let category = first.kind().category();

        let batch: Vec<SyncRecord> = records
            .into_iter()
            .map(|payload| SyncRecord {
                action,
                device_id: device_id.clone(),
                object_id: ObjectId::random(),
                payload,
            })
            .collect();
        let count = batch.len();

        channel.send(OutboundMessage::SendSyncRecords {
            category,
            records: batch,
        })?;

        self.metrics.observe_batch(category, action, count);
        self.logger.log_records_sent(category, action, count);
        Ok(())
    }
}
