//! Bootstrap preview command

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use sync_lib::models::{AppStateSnapshot, PersistedSyncState};
use sync_lib::records::{ObjectId, RecordKind};
use sync_lib::session::{DiscardActions, SyncSession};
use sync_lib::sync::{InboundMessage, MemoryChannel, OutboundMessage};
use sync_lib::SyncConfig;
use tabled::Tabled;

use crate::output::{color_action, print_info, print_json, print_table, print_warning, OutputFormat};

/// Row for the batch table
#[derive(Tabled, Serialize)]
struct BatchRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Kinds")]
    kinds: String,
}

/// Run a first-run handshake against a snapshot file and print what would be sent
pub fn preview_bootstrap(
    snapshot_path: &Path,
    device_id: Option<&str>,
    device_name: String,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let device_id = match device_id {
        Some(hex_id) => parse_device_id(hex_id)?,
        None => ObjectId::random().as_bytes().to_vec(),
    };

    let messages = bootstrap_messages(snapshot, device_id.clone(), device_name)?;

    match format {
        OutputFormat::Json => print_json(&messages),
        OutputFormat::Table => {
            println!("{}", "Bootstrap Preview".bold());
            println!("{}", "=".repeat(60));
            println!("Snapshot:  {}", snapshot_path.display().to_string().cyan());
            println!("Device id: {}", hex::encode(&device_id).cyan());
            println!();

            let rows = batch_rows(&messages);
            if rows.is_empty() {
                print_warning("Nothing would be sent");
                return Ok(());
            }
            print_table(&rows, format);

            let total: usize = rows.iter().map(|row| row.records).sum();
            print_info(&format!("{} records in {} batches", total, rows.len()));
        }
    }

    Ok(())
}

fn load_snapshot(path: &Path) -> Result<AppStateSnapshot> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read snapshot {:?}", path))?;
    serde_json::from_slice(&data).with_context(|| format!("Failed to parse snapshot {:?}", path))
}

fn parse_device_id(hex_id: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(hex_id).context("Device id must be hex encoded")?;
    if bytes.is_empty() {
        bail!("Device id must not be empty");
    }
    Ok(bytes)
}

/// Drive a session through a first-run handshake into an in-memory channel
fn bootstrap_messages(
    snapshot: AppStateSnapshot,
    device_id: Vec<u8>,
    device_name: String,
) -> Result<Vec<OutboundMessage>> {
    let config = SyncConfig {
        device_name,
        ..Default::default()
    };
    let channel = Arc::new(MemoryChannel::new());
    let mut session = SyncSession::new(
        config,
        channel.clone(),
        Arc::new(snapshot),
        Arc::new(DiscardActions),
    );

    session.init(PersistedSyncState::default());
    session.handle(InboundMessage::SaveInitData {
        seed: None,
        device_id: Some(device_id),
    })?;
    session.handle(InboundMessage::SyncReady)?;
    session.shutdown("preview complete");

    Ok(channel.take())
}

fn batch_rows(messages: &[OutboundMessage]) -> Vec<BatchRow> {
    messages
        .iter()
        .filter_map(|message| match message {
            OutboundMessage::SendSyncRecords { category, records } => Some((category, records)),
            _ => None,
        })
        .enumerate()
        .map(|(index, (category, records))| {
            let mut kinds: Vec<RecordKind> = Vec::new();
            for record in records {
                let kind = record.payload.kind();
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }

            BatchRow {
                index: index + 1,
                category: category.to_string(),
                action: records
                    .first()
                    .map(|record| color_action(record.action))
                    .unwrap_or_default(),
                records: records.len(),
                kinds: kinds
                    .iter()
                    .map(|kind| kind.key())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })
        .collect()
}
