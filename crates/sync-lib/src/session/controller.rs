//! Sync session controller
//!
//! Drives the handshake with the UI sync layer, the first-run bootstrap
//! upload and steady-state periodic fetching. Messages are handled one at a
//! time, each to completion, from a single-consumer queue.

use super::collaborators::{ActionSink, StateProvider};
use super::fetch::FetchScheduler;
use super::merge::{MergeRegistry, RecordMerger};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::identity::DeviceIdentity;
use crate::models::PersistedSyncState;
use crate::observability::{StructuredLogger, SyncMetrics, INBOUND_ACCEPTED, INBOUND_DROPPED};
use crate::records::{
    build_device_record, build_setting_record, build_site_record, Action, Category, DeviceId,
    RecordPayload,
};
use crate::sync::{InboundMessage, OutboundChannel, OutboundMessage, RecordDispatcher};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Lifecycle state of a sync session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// `init` has not been called
    Uninitialized,
    /// Sync is disabled by configuration; nothing is registered
    Disabled,
    /// Handshake handlers registered, waiting for SYNC_READY
    AwaitingHandshake,
    /// Inbound record intake registered and periodic fetch running
    SteadyState,
    /// Stopped after shutdown or a fatal error
    Stopped,
}

/// Sync session controller
pub struct SyncSession {
    config: SyncConfig,
    identity: Arc<DeviceIdentity>,
    dispatcher: RecordDispatcher,
    outbound: Arc<dyn OutboundChannel>,
    state_provider: Arc<dyn StateProvider>,
    actions: Arc<dyn ActionSink>,
    mergers: MergeRegistry,
    persisted: PersistedSyncState,
    first_run: bool,
    bootstrapped: bool,
    state: watch::Sender<SessionState>,
    shutdown_tx: broadcast::Sender<()>,
    fetch_task: Option<JoinHandle<()>>,
    metrics: SyncMetrics,
    logger: StructuredLogger,
}

impl SyncSession {
    pub fn new(
        config: SyncConfig,
        outbound: Arc<dyn OutboundChannel>,
        state_provider: Arc<dyn StateProvider>,
        actions: Arc<dyn ActionSink>,
    ) -> Self {
        let logger = StructuredLogger::new(config.device_name.clone());
        let identity = Arc::new(DeviceIdentity::new());
        let (state, _) = watch::channel(SessionState::Uninitialized);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            dispatcher: RecordDispatcher::new(identity.clone(), logger.clone()),
            config,
            identity,
            outbound,
            state_provider,
            actions,
            mergers: MergeRegistry::new(),
            persisted: PersistedSyncState::default(),
            first_run: false,
            bootstrapped: false,
            state,
            shutdown_tx,
            fetch_task: None,
            metrics: SyncMetrics::new(),
            logger,
        }
    }

    /// Share an existing device identity instead of a fresh one
    pub fn with_identity(mut self, identity: Arc<DeviceIdentity>) -> Self {
        self.dispatcher = RecordDispatcher::new(identity.clone(), self.logger.clone());
        self.identity = identity;
        self
    }

    /// Register a merge strategy for inbound records of one category
    pub fn with_merger(mut self, category: Category, merger: Arc<dyn RecordMerger>) -> Self {
        self.mergers.register(category, merger);
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn identity(&self) -> &Arc<DeviceIdentity> {
        &self.identity
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_task.is_some()
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Start the session from the persisted init data
    ///
    /// When sync is disabled this is a terminal no-op and no handlers are
    /// registered.
    pub fn init(&mut self, persisted: PersistedSyncState) {
        if self.state() != SessionState::Uninitialized {
            warn!(state = ?self.state(), "Sync session already initialized");
            return;
        }

        if !self.config.enabled {
            self.set_state(SessionState::Disabled);
            self.logger.log_session_disabled();
            return;
        }

        self.first_run = persisted.is_first_run();
        self.persisted = persisted;
        self.set_state(SessionState::AwaitingHandshake);
        self.logger.log_session_started(self.first_run);
    }

    /// Handle one inbound message to completion
    pub fn handle(&mut self, message: InboundMessage) -> Result<()> {
        let state = self.state();
        if matches!(
            state,
            SessionState::Uninitialized | SessionState::Disabled | SessionState::Stopped
        ) {
            debug!(message = message.name(), state = ?state, "No handler registered, ignoring");
            return Ok(());
        }

        match message {
            InboundMessage::GetInitData => self.on_get_init_data(),
            InboundMessage::SaveInitData { seed, device_id } => {
                self.on_save_init_data(seed, device_id);
                Ok(())
            }
            InboundMessage::SyncReady => self.on_sync_ready(),
            InboundMessage::ReceiveSyncRecords {
                category_name,
                records,
            } => {
                if state != SessionState::SteadyState {
                    debug!(category = %category_name, "Record intake not registered yet, ignoring");
                    return Ok(());
                }
                self.on_receive_records(&category_name, records)
            }
            InboundMessage::SyncDebug { message } => {
                self.logger.log_sync_debug(&message);
                Ok(())
            }
        }
    }

    fn on_get_init_data(&mut self) -> Result<()> {
        if let Some(saved) = self.persisted.device_id.clone() {
            self.identity.initialize(DeviceId::new(saved));
        }

        self.outbound.send(OutboundMessage::GotInitData {
            seed: self.persisted.seed.clone(),
            device_id: self.identity.get().cloned(),
            config: self.config.client_config(),
        })
    }

    fn on_save_init_data(&mut self, seed: Option<Vec<u8>>, device_id: Option<Vec<u8>>) {
        if seed.is_none() && device_id.is_none() {
            warn!("Init data was not saved: neither seed nor device id supplied");
            return;
        }

        if let Some(new_id) = device_id.clone() {
            if self.identity.adopt(DeviceId::new(new_id)) {
                if let Some(id) = self.identity.get() {
                    self.logger.log_device_adopted(&id.to_hex());
                }
            }
        }

        if seed.is_some() {
            self.persisted.seed = seed;
        }
        self.persisted.device_id = self
            .identity
            .get()
            .map(|id| id.as_bytes().to_vec())
            .or(device_id);

        self.actions.save_init_data(
            self.persisted.seed.clone(),
            self.persisted.device_id.clone(),
        );
    }

    fn on_sync_ready(&mut self) -> Result<()> {
        if self.state() == SessionState::SteadyState {
            debug!("Sync already ready");
            return Ok(());
        }

        if self.first_run && !self.bootstrapped {
            self.bootstrap()?;
            self.bootstrapped = true;
        }

        self.set_state(SessionState::SteadyState);
        self.start_fetching();
        Ok(())
    }

    /// Seed the sync service with this device, its bookmarks and site settings
    ///
    /// Every batch is built before the first send, so a failing snapshot
    /// leaves nothing sent and the bootstrap can run again on the next ready.
    fn bootstrap(&self) -> Result<()> {
        if !self.identity.is_set() {
            return Err(SyncError::DeviceIdentityUnset);
        }

        let snapshot = self.state_provider.snapshot()?;

        let device = vec![build_device_record(self.config.device_name.clone())];
        // plain history is not uploaded
        let bookmarks: Vec<RecordPayload> =
            snapshot.bookmarks().map(build_site_record).collect();
        let settings: Vec<RecordPayload> = snapshot
            .site_settings
            .iter()
            .map(|(host_pattern, setting)| build_setting_record(host_pattern, setting))
            .collect();
        let bookmark_count = bookmarks.len();
        let setting_count = settings.len();

        let channel = self.outbound.as_ref();
        for batch in [device, bookmarks, settings] {
            self.dispatcher.dispatch(channel, Action::Create, batch)?;
        }

        self.metrics.inc_bootstrap_runs();
        self.logger
            .log_bootstrap_complete(bookmark_count, setting_count);
        Ok(())
    }

    fn start_fetching(&mut self) {
        if self.fetch_task.is_some() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("No async runtime available, periodic fetch not started");
            return;
        };

        let scheduler = FetchScheduler::new(self.outbound.clone(), self.config.fetch_interval());
        self.fetch_task = Some(runtime.spawn(scheduler.run(self.shutdown_tx.subscribe())));
    }

    fn on_receive_records(
        &mut self,
        category_name: &str,
        records: Option<Vec<serde_json::Value>>,
    ) -> Result<()> {
        let Some(category) = Category::from_name(category_name) else {
            self.drop_inbound(category_name, "unknown category");
            return Ok(());
        };

        let records = match records {
            Some(records) if !records.is_empty() => records,
            _ => {
                self.drop_inbound(category_name, "no records");
                return Ok(());
            }
        };

        self.mergers.merge(category, &records)?;
        self.metrics.inc_inbound_batches(INBOUND_ACCEPTED);
        Ok(())
    }

    fn drop_inbound(&self, category_name: &str, reason: &str) {
        self.metrics.inc_inbound_batches(INBOUND_DROPPED);
        self.logger.log_inbound_dropped(category_name, reason);
    }

    /// Stop periodic fetching and refuse further messages
    pub fn shutdown(&mut self, reason: &str) {
        if self.state() == SessionState::Stopped {
            return;
        }
        let _ = self.shutdown_tx.send(());
        self.fetch_task = None;
        self.set_state(SessionState::Stopped);
        self.logger.log_shutdown(reason);
    }

    /// Drain the inbound queue until it closes or shutdown is signalled
    ///
    /// Errors that indicate a control-flow bug, or a closed outbound channel,
    /// stop the session and are returned. Other errors are logged.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<InboundMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else {
                        self.shutdown("inbound channel closed");
                        return Ok(());
                    };

                    if let Err(e) = self.handle(message) {
                        if e.is_fatal() || matches!(e, SyncError::ChannelClosed) {
                            self.logger.log_fatal(&e.to_string());
                            self.shutdown("fatal error");
                            return Err(e);
                        }
                        warn!(error = %e, "Failed to handle sync message");
                    }
                }
                _ = shutdown.recv() => {
                    self.shutdown("shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}
