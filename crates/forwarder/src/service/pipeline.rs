//! Pipeline: reconstruct, dispatch, enrich and emit, one chunk at a time.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::conf::EnrichmentConfig;
use crate::parser::{dispatch_record, reconstruct, OutputFragment, RawChunk, BROADCAST_RELAY_HOST};
use crate::sink::LogSink;
use super::metrics::PipelineMetrics;

pub struct Pipeline<S: LogSink> {
    enrichment: EnrichmentConfig,
    sink: S,
    metrics: Arc<PipelineMetrics>,
}

impl<S: LogSink> Pipeline<S> {
    pub fn new(enrichment: EnrichmentConfig, sink: S) -> Self {
        Self {
            enrichment,
            sink,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Process one chunk to completion. Returns the number of fragments the
    /// sink accepted.
    ///
    /// Records are emitted in boundary order and fragments in line order.
    /// A failing sink is logged and the remaining fragments still go out.
    pub fn process(&self, chunk: &RawChunk) -> usize {
        PipelineMetrics::add(&self.metrics.chunks, 1);

        let default_level = chunk.channel.default_level();
        let host = self.enrichment.host.as_deref();
        let records = reconstruct(chunk);
        PipelineMetrics::add(&self.metrics.records, records.len() as u64);

        if host == Some(BROADCAST_RELAY_HOST) {
            debug!(app = %chunk.source_app, records = records.len(), "broadcast relay host, records dropped");
            PipelineMetrics::add(&self.metrics.dropped_records, records.len() as u64);
            return 0;
        }

        let mut emitted = 0;
        for record in &records {
            let fragments = dispatch_record(record, default_level, host);
            trace!(app = %record.app, channel = chunk.channel.as_str(), fragments = fragments.len(), "record processed");
            for fragment in fragments {
                if self.emit(fragment) {
                    emitted += 1;
                }
            }
        }
        emitted
    }

    fn emit(&self, fragment: OutputFragment) -> bool {
        let OutputFragment { level, message, mut fields } = fragment;
        if message.is_empty() {
            return false;
        }

        // the message travels as its own argument
        fields.remove("message");
        self.enrichment.apply(&mut fields);

        match self.sink.emit(level, &fields, &message) {
            Ok(()) => {
                PipelineMetrics::add(&self.metrics.fragments, 1);
                true
            }
            Err(e) => {
                PipelineMetrics::add(&self.metrics.sink_errors, 1);
                warn!(target: "forwarder::diagnostics", error = %e, level = %level, "sink rejected fragment");
                false
            }
        }
    }

    /// Drain `rx` until every sender is gone.
    ///
    /// Sinks write synchronously, so this blocks the calling thread; run it
    /// under `tokio::task::spawn_blocking`, never on a runtime worker.
    pub fn run_blocking(&self, mut rx: mpsc::Receiver<RawChunk>) {
        while let Some(chunk) = rx.blocking_recv() {
            self.process(&chunk);
        }
        info!("Chunk source closed, pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Channel, Level};
    use crate::sink::{MemorySink, SinkError};
    use crate::parser::Fields;
    use serde_json::json;
    use tracing_test::traced_test;

    const PACKET: &str = "%Relay.Statistic.Packet{usersCount: 2, statistic: %{relay: \"relay-us-2-aa\", \
        sessions: [%{streams: [%{layers: [%{name: \"Audio\", targets: 2}]}]}]}}";

    fn enrichment() -> EnrichmentConfig {
        EnrichmentConfig {
            host: Some("edge-1".to_string()),
            project: Some("live".to_string()),
            env: Some("staging".to_string()),
        }
    }

    fn pipeline() -> Pipeline<MemorySink> {
        Pipeline::new(enrichment(), MemorySink::new())
    }

    #[test]
    fn test_fragments_are_enriched() {
        let p = pipeline();
        let emitted = p.process(&RawChunk::new("api", Channel::Stdout, "service ready"));
        assert_eq!(emitted, 1);

        let records = p.sink().records();
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].message, "service ready");
        assert_eq!(records[0].fields["host"], "edge-1");
        assert_eq!(records[0].fields["project"], "live");
        assert_eq!(records[0].fields["env"], "staging");
    }

    #[test]
    fn test_channel_sets_default_level() {
        let p = pipeline();
        p.process(&RawChunk::new("api", Channel::Stderr, "boom"));
        p.process(&RawChunk::new("api", Channel::Bus, "restarted"));
        let records = p.sink().records();
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[1].level, Level::Debug);
    }

    #[test]
    fn test_fields_never_carry_message_key() {
        let p = pipeline();
        p.process(&RawChunk::new(
            "red5",
            Channel::Stdout,
            "[INFO] [main] org.red5.server.Launcher - started",
        ));
        p.process(&RawChunk::new(
            "live",
            Channel::Stdout,
            format!("2024-03-01 10:00:00.123  INFO  Relay statistics: {}", PACKET),
        ));
        for record in p.sink().records() {
            assert!(!record.fields.contains_key("message"));
        }
        let records = p.sink().records();
        assert_eq!(records[1].fields["relay"]["name"], "relay-us-2");
        assert_eq!(records[1].fields["relay"]["layerTargets"]["Audio"], 2);
    }

    #[test]
    fn test_records_keep_boundary_order() {
        let p = pipeline();
        p.process(&RawChunk::new(
            "www",
            Channel::Stdout,
            "Fri, 01 Mar 2024 10:00:00 GMT first\n\
             Fri, 01 Mar 2024 10:00:01 GMT second\n\
             Fri, 01 Mar 2024 10:00:02 GMT third",
        ));
        let messages: Vec<String> = p.sink().records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_web_front_demotion_through_pipeline() {
        let p = pipeline();
        p.process(&RawChunk::new(
            "www",
            Channel::Stderr,
            "Fri, 01 Mar 2024 10:00:00 GMT Error: Not Found\n    at router (app.js:10:3)",
        ));
        let records = p.sink().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].message, "Error: Not Found\nat router (app.js:10:3)");
    }

    #[test]
    fn test_relay_host_emits_nothing() {
        let p = Pipeline::new(
            EnrichmentConfig {
                host: Some(BROADCAST_RELAY_HOST.to_string()),
                ..Default::default()
            },
            MemorySink::new(),
        );
        let emitted = p.process(&RawChunk::new("api", Channel::Stderr, "a\nFri, 01 Mar 2024 10:00:00 GMT b"));
        assert_eq!(emitted, 0);
        assert!(p.sink().is_empty());

        let snap = p.metrics().snapshot();
        assert_eq!(snap.records, 2);
        assert_eq!(snap.dropped_records, 2);
    }

    #[test]
    fn test_filtered_media_worker_emits_nothing() {
        let p = pipeline();
        let emitted = p.process(&RawChunk::new("media_saver", Channel::Stdout, "INFO saver chunk written"));
        assert_eq!(emitted, 0);
        assert_eq!(p.metrics().snapshot().records, 1);
        assert_eq!(p.metrics().snapshot().fragments, 0);
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn emit(&self, _level: Level, _fields: &Fields, _message: &str) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed")))
        }
    }

    #[test]
    #[traced_test]
    fn test_sink_failure_is_logged_and_counted() {
        let p = Pipeline::new(EnrichmentConfig::default(), FailingSink);
        let emitted = p.process(&RawChunk::new(
            "red5",
            Channel::Stdout,
            "[INFO] [a] x.Y - one\n[INFO] [a] x.Y - two",
        ));
        assert_eq!(emitted, 0);
        assert_eq!(p.metrics().snapshot().sink_errors, 2);
        assert!(logs_contain("sink rejected fragment"));
    }

    #[test]
    fn test_run_blocking_drains_channel() {
        let p = pipeline();
        let (tx, rx) = mpsc::channel(4);
        tx.blocking_send(RawChunk::new("api", Channel::Stdout, "one")).unwrap();
        tx.blocking_send(RawChunk::new("api", Channel::Stdout, "two")).unwrap();
        drop(tx);

        p.run_blocking(rx);

        let messages: Vec<String> = p.sink().records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["one", "two"]);
        assert_eq!(p.sink().records()[0].fields, {
            let mut f = Fields::new();
            f.insert("host".to_string(), json!("edge-1"));
            f.insert("project".to_string(), json!("live"));
            f.insert("env".to_string(), json!("staging"));
            f
        });
    }
}
