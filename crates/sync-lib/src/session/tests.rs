//! Scenario tests for the sync session
//!
//! These tests verify:
//! - First-run bootstrap content and ordering
//! - Resumption without bootstrap
//! - Handshake persistence and identity adoption
//! - Inbound record intake and the periodic fetch timer

use super::*;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::models::{AppStateSnapshot, PersistedSyncState, SiteEntry, SiteSetting};
use crate::records::{Action, Category, DeviceId, RecordPayload};
use crate::sync::{InboundMessage, MemoryChannel, OutboundMessage};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

const DEVICE_ID: [u8; 16] = [0xd1; 16];

/// Action sink that remembers every save request
#[derive(Default)]
struct RecordingActions {
    saved: Mutex<Vec<(Option<Vec<u8>>, Option<Vec<u8>>)>>,
}

impl RecordingActions {
    fn saved(&self) -> Vec<(Option<Vec<u8>>, Option<Vec<u8>>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl ActionSink for RecordingActions {
    fn save_init_data(&self, seed: Option<Vec<u8>>, device_id: Option<Vec<u8>>) {
        self.saved.lock().unwrap().push((seed, device_id));
    }
}

struct FailingState;

impl StateProvider for FailingState {
    fn snapshot(&self) -> Result<AppStateSnapshot> {
        Err(SyncError::StateProvider("store unavailable".to_string()))
    }
}

struct Harness {
    session: SyncSession,
    channel: Arc<MemoryChannel>,
    actions: Arc<RecordingActions>,
}

fn local_state() -> AppStateSnapshot {
    AppStateSnapshot {
        sites: vec![
            SiteEntry {
                location: Some("https://a.com".to_string()),
                title: Some("A".to_string()),
                tags: vec!["bookmark".to_string()],
                ..Default::default()
            },
            SiteEntry {
                location: Some("https://b.com".to_string()),
                tags: vec![],
                ..Default::default()
            },
        ],
        site_settings: BTreeMap::new(),
    }
}

fn harness_with(config: SyncConfig, state: Arc<dyn StateProvider>) -> Harness {
    let channel = Arc::new(MemoryChannel::new());
    let actions = Arc::new(RecordingActions::default());
    let session = SyncSession::new(config, channel.clone(), state, actions.clone());
    Harness {
        session,
        channel,
        actions,
    }
}

fn harness(state: AppStateSnapshot) -> Harness {
    harness_with(SyncConfig::default(), Arc::new(state))
}

fn record_batches(messages: &[OutboundMessage]) -> Vec<(Category, Vec<crate::records::SyncRecord>)> {
    messages
        .iter()
        .filter_map(|msg| match msg {
            OutboundMessage::SendSyncRecords { category, records } => {
                Some((*category, records.clone()))
            }
            _ => None,
        })
        .collect()
}

fn handshake_first_run(h: &mut Harness) {
    h.session.init(PersistedSyncState::default());
    h.session.handle(InboundMessage::GetInitData).unwrap();
    h.session
        .handle(InboundMessage::SaveInitData {
            seed: Some(vec![7; 32]),
            device_id: Some(DEVICE_ID.to_vec()),
        })
        .unwrap();
}

#[tokio::test]
async fn test_first_run_bootstrap_sends_device_and_bookmarks() {
    let mut h = harness(local_state());
    handshake_first_run(&mut h);
    assert!(h.session.is_first_run());

    // handshake reply carries no seed or id on first run
    let replies = h.channel.take();
    assert!(matches!(
        &replies[..],
        [OutboundMessage::GotInitData { seed: None, device_id: None, .. }]
    ));

    h.session.handle(InboundMessage::SyncReady).unwrap();

    let sent = h.channel.take();
    let batches = record_batches(&sent);
    assert_eq!(sent.len(), 2, "exactly two sends: {:?}", sent);
    assert_eq!(batches.len(), 2);

    let (category, records) = &batches[0];
    assert_eq!(*category, Category::Preferences);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, Action::Create);
    assert!(matches!(&records[0].payload, RecordPayload::Device(d) if d.name == "site-sync"));

    let (category, records) = &batches[1];
    assert_eq!(*category, Category::Bookmarks);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].device_id, DeviceId::new(DEVICE_ID.to_vec()));
    let RecordPayload::Bookmark(bookmark) = &records[0].payload else {
        panic!("expected bookmark payload");
    };
    assert_eq!(bookmark.site.location.as_deref(), Some("https://a.com"));
    assert_eq!(bookmark.site.title.as_deref(), Some("A"));
    assert!(!bookmark.is_folder);

    assert_eq!(h.session.state(), SessionState::SteadyState);
    assert!(h.session.is_fetching());
}

#[tokio::test]
async fn test_bootstrap_includes_site_settings() {
    let mut state = local_state();
    state.site_settings.insert(
        "https://?a.com".to_string(),
        SiteSetting {
            shields_up: Some(true),
            ..Default::default()
        },
    );
    state.site_settings.insert(
        "https://?b.com".to_string(),
        SiteSetting {
            ad_control: Some("blockAds".to_string()),
            ..Default::default()
        },
    );

    let mut h = harness(state);
    handshake_first_run(&mut h);
    h.channel.take();
    h.session.handle(InboundMessage::SyncReady).unwrap();

    let batches = record_batches(&h.channel.take());
    assert_eq!(batches.len(), 3);
    let (category, records) = &batches[2];
    assert_eq!(*category, Category::Preferences);
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_resumed_session_skips_bootstrap() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState {
        seed: Some(vec![7; 32]),
        device_id: Some(DEVICE_ID.to_vec()),
    });
    assert!(!h.session.is_first_run());

    h.session.handle(InboundMessage::GetInitData).unwrap();
    assert_eq!(
        h.session.identity().get(),
        Some(&DeviceId::new(DEVICE_ID.to_vec()))
    );
    let reply = h.channel.take();
    assert!(matches!(
        &reply[..],
        [OutboundMessage::GotInitData { seed: Some(_), device_id: Some(_), .. }]
    ));

    h.session.handle(InboundMessage::SyncReady).unwrap();
    assert!(h.channel.is_empty());
    assert_eq!(h.session.state(), SessionState::SteadyState);
}

#[tokio::test]
async fn test_seed_alone_is_not_first_run() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState {
        seed: Some(vec![7; 32]),
        device_id: None,
    });
    assert!(!h.session.is_first_run());
}

#[tokio::test]
async fn test_ready_twice_bootstraps_once() {
    let mut h = harness(local_state());
    handshake_first_run(&mut h);
    h.channel.take();

    h.session.handle(InboundMessage::SyncReady).unwrap();
    h.session.handle(InboundMessage::SyncReady).unwrap();

    assert_eq!(record_batches(&h.channel.take()).len(), 2);
}

#[tokio::test]
async fn test_ready_without_identity_is_fatal() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState::default());

    let err = h.session.handle(InboundMessage::SyncReady).unwrap_err();
    assert!(matches!(err, SyncError::DeviceIdentityUnset));
    assert!(h.channel.is_empty());
}

#[tokio::test]
async fn test_state_provider_failure_surfaces() {
    let mut h = harness_with(SyncConfig::default(), Arc::new(FailingState));
    handshake_first_run(&mut h);
    h.channel.take();

    let err = h.session.handle(InboundMessage::SyncReady).unwrap_err();
    assert!(matches!(err, SyncError::StateProvider(_)));
    assert_eq!(h.session.state(), SessionState::AwaitingHandshake);
}

/// Fails the first snapshot request, then serves the local state
#[derive(Default)]
struct FlakyState {
    calls: Mutex<usize>,
}

impl StateProvider for FlakyState {
    fn snapshot(&self) -> Result<AppStateSnapshot> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            return Err(SyncError::StateProvider("store busy".to_string()));
        }
        Ok(local_state())
    }
}

#[tokio::test]
async fn test_failed_snapshot_sends_nothing_and_retry_bootstraps_once() {
    let mut h = harness_with(SyncConfig::default(), Arc::new(FlakyState::default()));
    handshake_first_run(&mut h);
    h.channel.take();

    assert!(h.session.handle(InboundMessage::SyncReady).is_err());
    assert!(h.channel.is_empty());

    h.session.handle(InboundMessage::SyncReady).unwrap();
    h.session.handle(InboundMessage::SyncReady).unwrap();

    let batches = record_batches(&h.channel.take());
    let device_batches = batches
        .iter()
        .filter(|(_, records)| {
            records
                .iter()
                .any(|record| matches!(record.payload, RecordPayload::Device(_)))
        })
        .count();
    assert_eq!(device_batches, 1);
    assert_eq!(batches.len(), 2);
    assert_eq!(h.session.state(), SessionState::SteadyState);
}

#[test]
fn test_save_init_data_adopts_and_persists() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState::default());

    h.session
        .handle(InboundMessage::SaveInitData {
            seed: Some(vec![3; 32]),
            device_id: Some(DEVICE_ID.to_vec()),
        })
        .unwrap();

    assert_eq!(
        h.session.identity().get(),
        Some(&DeviceId::new(DEVICE_ID.to_vec()))
    );
    assert_eq!(
        h.actions.saved(),
        vec![(Some(vec![3; 32]), Some(DEVICE_ID.to_vec()))]
    );
}

#[test]
fn test_save_init_data_does_not_overwrite_identity() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState {
        seed: Some(vec![3; 32]),
        device_id: Some(DEVICE_ID.to_vec()),
    });
    h.session.handle(InboundMessage::GetInitData).unwrap();

    h.session
        .handle(InboundMessage::SaveInitData {
            seed: None,
            device_id: Some(vec![0xee; 16]),
        })
        .unwrap();

    assert_eq!(
        h.session.identity().get(),
        Some(&DeviceId::new(DEVICE_ID.to_vec()))
    );
    assert_eq!(
        h.actions.saved(),
        vec![(Some(vec![3; 32]), Some(DEVICE_ID.to_vec()))]
    );
}

#[test]
fn test_save_without_data_is_ignored() {
    let mut h = harness(local_state());
    h.session.init(PersistedSyncState::default());

    h.session
        .handle(InboundMessage::SaveInitData {
            seed: None,
            device_id: None,
        })
        .unwrap();

    assert!(h.actions.saved().is_empty());
    assert!(!h.session.identity().is_set());
}

#[test]
fn test_disabled_session_ignores_everything() {
    let config = SyncConfig {
        enabled: false,
        ..Default::default()
    };
    let mut h = harness_with(config, Arc::new(local_state()));
    h.session.init(PersistedSyncState::default());
    assert_eq!(h.session.state(), SessionState::Disabled);

    h.session.handle(InboundMessage::GetInitData).unwrap();
    h.session
        .handle(InboundMessage::SaveInitData {
            seed: Some(vec![1]),
            device_id: Some(vec![2]),
        })
        .unwrap();
    h.session.handle(InboundMessage::SyncReady).unwrap();

    assert!(h.channel.is_empty());
    assert!(h.actions.saved().is_empty());
    assert_eq!(h.session.state(), SessionState::Disabled);
}

#[test]
fn test_messages_before_init_are_ignored() {
    let mut h = harness(local_state());
    h.session.handle(InboundMessage::GetInitData).unwrap();
    assert!(h.channel.is_empty());
    assert_eq!(h.session.state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn test_inbound_records_before_ready_are_ignored() {
    let merger = Arc::new(CountingMerger::default());
    let mut h = harness(local_state());
    h.session = h.session.with_merger(Category::Bookmarks, merger.clone());
    h.session.init(PersistedSyncState::default());

    h.session
        .handle(InboundMessage::ReceiveSyncRecords {
            category_name: "BOOKMARKS".to_string(),
            records: Some(vec![json!({"bookmark": {}})]),
        })
        .unwrap();
    assert_eq!(merger.count(), 0);
}

#[derive(Default)]
struct CountingMerger {
    batches: Mutex<Vec<(Category, usize)>>,
}

impl CountingMerger {
    fn count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl RecordMerger for CountingMerger {
    fn merge(&self, category: Category, records: &[serde_json::Value]) -> Result<MergeOutcome> {
        self.batches.lock().unwrap().push((category, records.len()));
        Ok(MergeOutcome::Applied {
            records: records.len(),
        })
    }
}

#[tokio::test]
async fn test_inbound_records_validated_against_known_categories() {
    let merger = Arc::new(CountingMerger::default());
    let mut h = harness(local_state());
    h.session = h
        .session
        .with_merger(Category::Bookmarks, merger.clone())
        .with_merger(Category::Preferences, merger.clone());
    h.session.init(PersistedSyncState {
        seed: Some(vec![1; 32]),
        device_id: Some(DEVICE_ID.to_vec()),
    });
    h.session.handle(InboundMessage::GetInitData).unwrap();
    h.session.handle(InboundMessage::SyncReady).unwrap();

    let inbound = |name: &str, records: Option<Vec<serde_json::Value>>| {
        InboundMessage::ReceiveSyncRecords {
            category_name: name.to_string(),
            records,
        }
    };

    h.session
        .handle(inbound("BOOKMARKS", Some(vec![json!({}), json!({})])))
        .unwrap();
    h.session
        .handle(inbound("TABS", Some(vec![json!({})])))
        .unwrap();
    h.session.handle(inbound("PREFERENCES", None)).unwrap();
    h.session
        .handle(inbound("PREFERENCES", Some(vec![])))
        .unwrap();
    // falls back to the deferring merger
    h.session
        .handle(inbound("HISTORY_SITES", Some(vec![json!({})])))
        .unwrap();

    assert_eq!(
        *merger.batches.lock().unwrap(),
        vec![(Category::Bookmarks, 2)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timer_after_ready() {
    let config = SyncConfig {
        fetch_interval_secs: 30,
        ..Default::default()
    };
    let mut h = harness_with(config, Arc::new(local_state()));
    h.session.init(PersistedSyncState {
        seed: Some(vec![1; 32]),
        device_id: Some(DEVICE_ID.to_vec()),
    });
    h.session.handle(InboundMessage::SyncReady).unwrap();
    assert!(h.channel.is_empty());

    tokio::time::sleep(Duration::from_secs(75)).await;

    let fetches = h
        .channel
        .take()
        .into_iter()
        .filter(|msg| matches!(msg, OutboundMessage::FetchSyncRecords { .. }))
        .count();
    assert_eq!(fetches, 2);

    h.session.shutdown("test complete");
    assert_eq!(h.session.state(), SessionState::Stopped);
}

#[tokio::test]
async fn test_run_loop_stops_on_fatal_error() {
    let h = harness(local_state());
    let mut session = h.session;
    session.init(PersistedSyncState::default());
    let mut states = session.subscribe_state();

    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tx.send(InboundMessage::SyncDebug {
        message: "hello".to_string(),
    })
    .await
    .unwrap();
    // ready before any device id was negotiated
    tx.send(InboundMessage::SyncReady).await.unwrap();

    let result = session.run(rx, shutdown_rx).await;
    assert!(matches!(result, Err(SyncError::DeviceIdentityUnset)));
    assert_eq!(*states.borrow_and_update(), SessionState::Stopped);
}

#[tokio::test]
async fn test_run_loop_ends_when_inbound_closes() {
    let h = harness(local_state());
    let mut session = h.session;
    session.init(PersistedSyncState {
        seed: Some(vec![1; 32]),
        device_id: Some(DEVICE_ID.to_vec()),
    });
    let channel = h.channel.clone();

    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tx.send(InboundMessage::GetInitData).await.unwrap();
    drop(tx);

    session.run(rx, shutdown_rx).await.unwrap();
    assert_eq!(channel.len(), 1);
}
