//! Source: JSON-lines `RawChunk`s from a byte stream.
//!
//! One chunk per line: `{"app": "www", "channel": "stdout", "text": "..."}`.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::parser::RawChunk;
use crate::service::PipelineMetrics;

/// Forward every well-formed line of `reader` to `tx`.
///
/// Malformed lines are logged and skipped. Returns the number of chunks
/// forwarded once the reader hits EOF or the receiver goes away.
pub async fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<RawChunk>,
    metrics: Arc<PipelineMetrics>,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(reader.lines());
    let mut forwarded = 0;

    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk = match serde_json::from_str::<RawChunk>(&line) {
            Ok(chunk) => chunk,
            Err(e) => {
                PipelineMetrics::add(&metrics.malformed_chunks, 1);
                warn!(target: "forwarder::diagnostics", error = %e, line = %line, "malformed chunk skipped");
                continue;
            }
        };

        if tx.send(chunk).await.is_err() {
            debug!("Pipeline receiver dropped, source stopping");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}
