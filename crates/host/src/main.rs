//! Sync host - drives the site sync session for the UI process
//!
//! The UI sync layer talks to this process over newline-delimited JSON on
//! stdin/stdout. Logs go to stderr.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use sync_lib::{
    health::{components, HealthRegistry},
    observability::SyncMetrics,
    SyncSession,
};
use tokio::io::BufReader;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod store;
mod transport;

const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Inbound frames buffered ahead of the session
const INBOUND_QUEUE_CAPACITY: usize = 256;

/// Time allowed for pending outbound frames to flush on exit
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    // JSON logs on stderr; stdout carries IPC frames
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Sync host failed");
            1
        }
    };

    // A blocked stdin read would otherwise hold up runtime shutdown
    std::process::exit(code);
}

async fn run() -> Result<()> {
    info!(version = HOST_VERSION, "Starting sync-host");

    let config = config::HostConfig::load()?;
    let sync_config = config.sync_config();
    info!(
        device_name = %sync_config.device_name,
        enabled = sync_config.enabled,
        fetch_interval_secs = sync_config.fetch_interval().as_secs(),
        "Host configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SESSION).await;
    health_registry.register(components::FETCH_SCHEDULER).await;
    health_registry.register(components::TRANSPORT).await;

    let metrics = SyncMetrics::new();

    let init_store = store::JsonInitDataStore::new(&config.persisted_state_path);
    let persisted = init_store.load()?;
    let snapshot_provider = store::FileSnapshotProvider::new(&config.snapshot_path);

    // Transport
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let (shutdown_tx, _) = broadcast::channel(1);

    let writer_handle = tokio::spawn(transport::write_frames(tokio::io::stdout(), outbound_rx));

    let reader_health = health_registry.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        match transport::read_frames(stdin, inbound_tx).await {
            Ok(frames) => {
                info!(frames = frames, "Inbound stream closed");
                reader_health
                    .set_degraded(components::TRANSPORT, "Inbound stream closed")
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Inbound transport failed");
                reader_health
                    .set_unhealthy(components::TRANSPORT, e.to_string())
                    .await;
            }
        }
    });

    // Session
    let mut session = SyncSession::new(
        sync_config,
        Arc::new(outbound_tx),
        Arc::new(snapshot_provider),
        Arc::new(init_store),
    );

    let mut states = session.subscribe_state();
    let state_health = health_registry.clone();
    tokio::spawn(async move {
        loop {
            let state = *states.borrow_and_update();
            state_health.record_session_state(state).await;
            if states.changed().await.is_err() {
                break;
            }
        }
    });

    session.init(persisted);

    // Start health and metrics server
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));
    tokio::spawn(async move {
        if let Err(e) = api::serve(config.api_port, app_state).await {
            error!(error = %e, "API server failed");
        }
    });

    let mut session_handle = tokio::spawn(session.run(inbound_rx, shutdown_tx.subscribe()));

    let session_result = tokio::select! {
        result = &mut session_handle => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for SIGINT");
            }
            info!("SIGINT received, shutting down");
            let _ = shutdown_tx.send(());
            session_handle.await
        }
    };

    match tokio::time::timeout(FLUSH_TIMEOUT, writer_handle).await {
        Ok(Ok(Ok(frames))) => info!(frames = frames, "Outbound stream closed"),
        Ok(Ok(Err(e))) => warn!(error = %e, "Outbound transport failed"),
        Ok(Err(e)) => warn!(error = %e, "Outbound writer task failed"),
        Err(_) => warn!("Timed out flushing outbound frames"),
    }

    session_result
        .context("Sync session task panicked")?
        .context("Sync session stopped on a fatal error")?;

    info!("Shutting down");
    Ok(())
}
