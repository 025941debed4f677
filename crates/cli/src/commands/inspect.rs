//! Category table and persisted state inspection

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use sync_lib::models::PersistedSyncState;
use sync_lib::records::RecordKind;
use tabled::Tabled;

use crate::output::{format_optional_hex, print_json, print_success, print_table, print_warning, OutputFormat};

/// Row for the category table
#[derive(Tabled, Serialize)]
struct CategoryRow {
    #[tabled(rename = "Record Key")]
    key: &'static str,
    #[tabled(rename = "Category")]
    category: &'static str,
}

/// Summary of persisted init data
#[derive(Serialize)]
struct StateSummary {
    path: String,
    seed_len: Option<usize>,
    device_id: Option<String>,
    first_run: bool,
}

/// Print every record key and the category it resolves to
pub fn list_categories(format: OutputFormat) {
    let rows = category_rows();
    print_table(&rows, format);
}

fn category_rows() -> Vec<CategoryRow> {
    RecordKind::ALL
        .iter()
        .map(|kind| CategoryRow {
            key: kind.key(),
            category: kind.category().name(),
        })
        .collect()
}

/// Show what the host would load from a persisted state file
pub fn inspect_state(path: &Path, format: OutputFormat) -> Result<()> {
    let state = load_state(path)?;
    let summary = StateSummary {
        path: path.display().to_string(),
        seed_len: state.seed.as_ref().map(Vec::len),
        device_id: state.device_id.as_ref().map(hex::encode),
        first_run: state.is_first_run(),
    };

    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Table => {
            println!("{}", "Persisted Sync State".bold());
            println!("{}", "=".repeat(60));
            println!("File:      {}", summary.path.cyan());
            println!(
                "Seed:      {}",
                summary
                    .seed_len
                    .map(|len| format!("{} bytes", len))
                    .unwrap_or_else(|| "-".dimmed().to_string())
            );
            println!(
                "Device id: {}",
                format_optional_hex(state.device_id.as_deref())
            );
            println!();

            if summary.first_run {
                print_warning("No seed or device id persisted: next start is a first run");
            } else {
                print_success("Sync previously configured: next start resumes");
            }
        }
    }

    Ok(())
}

/// A missing file reads as empty state, as the host treats it
fn load_state(path: &Path) -> Result<PersistedSyncState> {
    if !path.exists() {
        return Ok(PersistedSyncState::default());
    }
    let data = std::fs::read(path).with_context(|| format!("Failed to read state {:?}", path))?;
    serde_json::from_slice(&data).with_context(|| format!("Failed to parse state {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rows_cover_every_kind() {
        let rows = category_rows();
        assert_eq!(rows.len(), 4);
        assert!(rows
            .iter()
            .any(|row| row.key == "siteSetting" && row.category == "PREFERENCES"));
        assert!(rows
            .iter()
            .any(|row| row.key == "device" && row.category == "PREFERENCES"));
    }

    #[test]
    fn test_load_state_missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("absent.json")).unwrap();
        assert!(state.is_first_run());
    }

    #[test]
    fn test_load_state_reads_device_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync-init.json");
        std::fs::write(&path, r#"{"seed": [1, 2], "deviceId": [171]}"#).unwrap();

        let state = load_state(&path).unwrap();
        assert_eq!(state.device_id, Some(vec![0xab]));
        assert!(!state.is_first_run());
    }
}
