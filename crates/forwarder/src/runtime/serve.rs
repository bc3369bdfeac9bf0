//! Serve: wire the stdin source to the pipeline and run until EOF or shutdown.

use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::conf::ForwarderConfig;
use crate::runtime::source::forward_lines;
use crate::runtime::stop::shutdown_signal;
use crate::service::{Pipeline, PipelineSnapshot};
use crate::sink::{JsonLinesSink, LogSink};

/// Read chunks from stdin, write records to stdout, until stdin closes or a
/// shutdown signal arrives.
pub async fn serve(config: ForwarderConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sink = JsonLinesSink::stdout(config.log_name.clone(), config.sink_level()?)
        .with_hostname(config.enrichment.host.clone());
    let pipeline = Arc::new(Pipeline::new(config.enrichment.clone(), sink));

    info!("Forwarder is ready, reading chunks from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    let snapshot = drive(stdin, pipeline, config.channel_capacity, shutdown_signal()).await;

    info!(
        chunks = snapshot.chunks,
        records = snapshot.records,
        fragments = snapshot.fragments,
        dropped_records = snapshot.dropped_records,
        sink_errors = snapshot.sink_errors,
        malformed_chunks = snapshot.malformed_chunks,
        "Forwarder shutdown complete"
    );
    Ok(())
}

/// Run the source task and the pipeline over a bounded channel.
///
/// The pipeline runs on the blocking pool because sinks write synchronously.
/// When `shutdown` resolves the source is stopped and chunks already queued
/// are still processed.
pub async fn drive<R, S, F>(reader: R, pipeline: Arc<Pipeline<S>>, capacity: usize, shutdown: F) -> PipelineSnapshot
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: LogSink + 'static,
    F: Future<Output = ()>,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let source = tokio::spawn(forward_lines(reader, tx, Arc::clone(pipeline.metrics())));

    let mut worker = {
        let pipeline = Arc::clone(&pipeline);
        tokio::task::spawn_blocking(move || pipeline.run_blocking(rx))
    };

    let finished = tokio::select! {
        res = &mut worker => res,
        _ = shutdown => {
            source.abort();
            worker.await
        },
    };
    if let Err(e) = finished {
        error!("Pipeline worker failed: {}", e);
    }

    match source.await {
        Ok(Ok(forwarded)) => info!(forwarded, "Chunk source finished"),
        Ok(Err(e)) => error!("Chunk source failed: {}", e),
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!("Chunk source task panicked: {}", e),
    }

    pipeline.metrics().snapshot()
}
