use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::literal::LiteralError;
use super::severity::Level;

/// Structured fields carried by a fragment (insertion-ordered JSON object).
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Channel a chunk was captured from on the process bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Process manager's own bus messages
    #[serde(alias = "PM2", alias = "pm2")]
    Bus,
    #[serde(alias = "out")]
    Stdout,
    #[serde(alias = "err")]
    Stderr,
}

impl Channel {
    /// Severity used when the format handler has nothing better.
    pub fn default_level(&self) -> Level {
        match self {
            Channel::Bus => Level::Debug,
            Channel::Stdout => Level::Info,
            Channel::Stderr => Level::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Bus => "bus",
            Channel::Stdout => "stdout",
            Channel::Stderr => "stderr",
        }
    }
}

/// One delivery of raw multi-line text from a managed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChunk {
    #[serde(rename = "app")]
    pub source_app: String,
    pub channel: Channel,
    pub text: String,
}

impl RawChunk {
    pub fn new(source_app: impl Into<String>, channel: Channel, text: impl Into<String>) -> Self {
        Self {
            source_app: source_app.into(),
            channel,
            text: text.into(),
        }
    }
}

/// A logical (possibly multi-line) log entry rebuilt from a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    pub app: String,
    pub message: String,
}

/// Final leveled unit handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFragment {
    pub level: Level,
    pub message: String,
    pub fields: Fields,
}

impl OutputFragment {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Application log formats understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// media_saver / media_transcoder worker logs
    MediaWorker,
    /// live / manager actor-runtime logs with relay telemetry
    LiveManager,
    /// Red5 media server (Java, bracketed)
    Red5,
    /// Broadcaster FileStreamer processes
    Broadcaster,
    /// front / www web processes
    WebFront,
    /// Anything else, forwarded verbatim
    Plain,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::MediaWorker => "media_worker",
            Format::LiveManager => "live_manager",
            Format::Red5 => "red5",
            Format::Broadcaster => "broadcaster",
            Format::WebFront => "web_front",
            Format::Plain => "plain",
        }
    }
}

/// Per-relay streaming statistics pulled out of a live/manager log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySummary {
    pub name: String,
    pub users_count: u64,
    pub output_kbps: u64,
    pub skip_kbps: u64,
    pub output_per_user_kbps: u64,
    pub layer_targets: BTreeMap<String, u64>,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Unparseable statistics literal: {source}")]
    Literal {
        #[source]
        source: LiteralError,
        payload: String,
    },

    #[error("Unexpected statistics shape: {reason}")]
    Shape { reason: String, payload: String },
}

impl TelemetryError {
    /// The raw payload that failed, kept for diagnostics.
    pub fn payload(&self) -> &str {
        match self {
            TelemetryError::Literal { payload, .. } => payload,
            TelemetryError::Shape { payload, .. } => payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_default_levels() {
        assert_eq!(Channel::Bus.default_level(), Level::Debug);
        assert_eq!(Channel::Stdout.default_level(), Level::Info);
        assert_eq!(Channel::Stderr.default_level(), Level::Error);
    }

    #[test]
    fn test_raw_chunk_deserialize() {
        let chunk: RawChunk =
            serde_json::from_str(r#"{"app":"www","channel":"stderr","text":"boom"}"#).unwrap();
        assert_eq!(chunk, RawChunk::new("www", Channel::Stderr, "boom"));
    }

    #[test]
    fn test_raw_chunk_accepts_process_manager_channel_names() {
        let chunk: RawChunk =
            serde_json::from_str(r#"{"app":"live","channel":"out","text":"x"}"#).unwrap();
        assert_eq!(chunk.channel, Channel::Stdout);
        let chunk: RawChunk =
            serde_json::from_str(r#"{"app":"live","channel":"PM2","text":"x"}"#).unwrap();
        assert_eq!(chunk.channel, Channel::Bus);
    }

    #[test]
    fn test_fragment_with_field() {
        let fragment = OutputFragment::new(Level::Info, "hello").with_field("thread", "main");
        assert_eq!(fragment.fields.get("thread"), Some(&serde_json::json!("main")));
    }

    #[test]
    fn test_relay_summary_serializes_camel_case() {
        let summary = RelaySummary {
            name: "relay-eu".to_string(),
            users_count: 2,
            output_kbps: 10,
            skip_kbps: 1,
            output_per_user_kbps: 5,
            layer_targets: BTreeMap::from([("Audio".to_string(), 0)]),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["usersCount"], 2);
        assert_eq!(value["outputPerUserKbps"], 5);
        assert_eq!(value["layerTargets"]["Audio"], 0);
    }
}
