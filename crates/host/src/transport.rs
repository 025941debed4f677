//! Newline-delimited JSON transport to the UI process
//!
//! One frame per line. Inbound frames are read from stdin and outbound frames
//! are written to stdout, so logs must go to stderr.

use anyhow::{Context, Result};
use sync_lib::sync::{InboundMessage, OutboundMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Forward inbound frames to the session queue until EOF
///
/// Unparseable frames are logged and skipped. Returns the number of frames
/// forwarded.
pub async fn read_frames<R>(reader: R, tx: mpsc::Sender<InboundMessage>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0u64;

    while let Some(line) = lines.next_line().await.context("Failed to read frame")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: InboundMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping malformed inbound frame");
                continue;
            }
        };

        debug!(message = message.name(), "Inbound frame");
        if tx.send(message).await.is_err() {
            info!("Session queue closed, no longer reading frames");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

/// Write outbound messages as frames until every sender is dropped
pub async fn write_frames<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;

    while let Some(message) = rx.recv().await {
        let mut frame = serde_json::to_vec(&message).context("Failed to serialize frame")?;
        frame.push(b'\n');

        writer
            .write_all(&frame)
            .await
            .context("Failed to write frame")?;
        writer.flush().await.context("Failed to flush frame")?;
        written += 1;
    }

    Ok(written)
}
