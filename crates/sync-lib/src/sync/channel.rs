//! Messages exchanged with the UI sync layer and the outbound channel seam

use crate::config::ClientConfig;
use crate::error::{Result, SyncError};
use crate::records::{Category, DeviceId, SyncRecord};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Messages the host receives from the UI process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    GetInitData,
    SaveInitData {
        #[serde(default)]
        seed: Option<Vec<u8>>,
        #[serde(default, rename = "deviceId")]
        device_id: Option<Vec<u8>>,
    },
    SyncReady,
    ReceiveSyncRecords {
        #[serde(rename = "categoryName")]
        category_name: String,
        #[serde(default)]
        records: Option<Vec<serde_json::Value>>,
    },
    SyncDebug {
        #[serde(default)]
        message: String,
    },
}

impl InboundMessage {
    /// Wire name of the message type
    pub fn name(&self) -> &'static str {
        match self {
            InboundMessage::GetInitData => "GET_INIT_DATA",
            InboundMessage::SaveInitData { .. } => "SAVE_INIT_DATA",
            InboundMessage::SyncReady => "SYNC_READY",
            InboundMessage::ReceiveSyncRecords { .. } => "RECEIVE_SYNC_RECORDS",
            InboundMessage::SyncDebug { .. } => "SYNC_DEBUG",
        }
    }
}

/// Messages the host sends to the UI sync layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    GotInitData {
        seed: Option<Vec<u8>>,
        #[serde(rename = "deviceId")]
        device_id: Option<DeviceId>,
        config: ClientConfig,
    },
    SendSyncRecords {
        category: Category,
        records: Vec<SyncRecord>,
    },
    FetchSyncRecords {
        categories: Vec<Category>,
    },
}

/// Outbound side of the host's messaging transport
pub trait OutboundChannel: Send + Sync {
    fn send(&self, message: OutboundMessage) -> Result<()>;
}

impl OutboundChannel for mpsc::UnboundedSender<OutboundMessage> {
    fn send(&self, message: OutboundMessage) -> Result<()> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| SyncError::ChannelClosed)
    }
}

/// Channel that keeps every sent message in memory
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages sent so far
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remove and return all messages sent so far
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(
            &mut *self
                .sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    pub fn len(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutboundChannel for MemoryChannel {
    fn send(&self, message: OutboundMessage) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_frames_parse() {
        let msg: InboundMessage = serde_json::from_str(r#"{"type":"GET_INIT_DATA"}"#).unwrap();
        assert_eq!(msg, InboundMessage::GetInitData);

        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"SAVE_INIT_DATA","seed":[1,2],"deviceId":[0]}"#)
                .unwrap();
        assert_eq!(
            msg,
            InboundMessage::SaveInitData {
                seed: Some(vec![1, 2]),
                device_id: Some(vec![0]),
            }
        );

        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"RECEIVE_SYNC_RECORDS","categoryName":"BOOKMARKS"}"#)
                .unwrap();
        assert_eq!(msg.name(), "RECEIVE_SYNC_RECORDS");
        assert!(matches!(
            msg,
            InboundMessage::ReceiveSyncRecords { records: None, .. }
        ));
    }

    #[test]
    fn test_unknown_frame_type_rejected() {
        let result = serde_json::from_str::<InboundMessage>(r#"{"type":"RESET_SYNC"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_frame_shape() {
        let msg = OutboundMessage::FetchSyncRecords {
            categories: Category::ALL.to_vec(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "FETCH_SYNC_RECORDS",
                "categories": ["BOOKMARKS", "HISTORY_SITES", "PREFERENCES"]
            })
        );
    }

    #[test]
    fn test_unbounded_sender_reports_closed() {
        let (tx, rx) = mpsc::unbounded_channel::<OutboundMessage>();
        drop(rx);
        let result = OutboundChannel::send(
            &tx,
            OutboundMessage::FetchSyncRecords { categories: vec![] },
        );
        assert!(matches!(result, Err(SyncError::ChannelClosed)));
    }

    #[test]
    fn test_memory_channel_take() {
        let channel = MemoryChannel::new();
        channel
            .send(OutboundMessage::FetchSyncRecords { categories: vec![] })
            .unwrap();
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.take().len(), 1);
        assert!(channel.is_empty());
    }
}
