//! Site sync CLI
//!
//! A command-line tool for previewing bootstrap uploads, listing the
//! category table, and inspecting persisted sync state.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, preview};
use std::path::PathBuf;

/// Site sync CLI
#[derive(Parser)]
#[command(name = "syncctl")]
#[command(author, version, about = "CLI for the site sync host", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the batches a first-run bootstrap would send for a snapshot
    Preview {
        /// State snapshot file ({"sites": [...], "siteSettings": {...}})
        #[arg(long, short)]
        snapshot: PathBuf,

        /// Device id as hex (random if not specified)
        #[arg(long)]
        device_id: Option<String>,

        /// Display name of the device record
        #[arg(long, env = "SYNC_DEVICE_NAME", default_value = "site-sync")]
        device_name: String,
    },

    /// List record kinds and the category each is sent under
    Categories,

    /// Inspect persisted sync init data
    Inspect {
        /// Persisted state file
        #[arg(long, short, default_value = "state/sync-init.json")]
        state: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            snapshot,
            device_id,
            device_name,
        } => {
            preview::preview_bootstrap(&snapshot, device_id.as_deref(), device_name, cli.format)?;
        }
        Commands::Categories => {
            inspect::list_categories(cli.format);
        }
        Commands::Inspect { state } => {
            inspect::inspect_state(&state, cli.format)?;
        }
    }

    Ok(())
}
