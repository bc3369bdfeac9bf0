//! Newline-delimited JSON in the bunyan record layout, the shape the
//! central log pipeline ingests.

use std::io::Write;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{LogSink, SinkError};
use crate::parser::{Fields, Level};

/// Keys owned by the record envelope; fragment fields cannot override them.
const RESERVED: [&str; 7] = ["name", "hostname", "pid", "level", "msg", "time", "v"];

pub struct JsonLinesSink<W: Write + Send> {
    name: String,
    hostname: Option<String>,
    min_level: Level,
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout(name: impl Into<String>, min_level: Level) -> Self {
        Self::new(name, min_level, std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(name: impl Into<String>, min_level: Level, writer: W) -> Self {
        Self {
            name: name.into(),
            hostname: None,
            min_level,
            writer: Mutex::new(writer),
        }
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn record(&self, level: Level, fields: &Fields, message: &str) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("name".to_string(), Value::from(self.name.as_str()));
        if let Some(hostname) = &self.hostname {
            record.insert("hostname".to_string(), Value::from(hostname.as_str()));
        }
        record.insert("pid".to_string(), Value::from(std::process::id()));
        record.insert("level".to_string(), Value::from(level.bunyan_code()));
        for (key, value) in fields {
            if !RESERVED.contains(&key.as_str()) {
                record.insert(key.clone(), value.clone());
            }
        }
        record.insert("msg".to_string(), Value::from(message));
        record.insert(
            "time".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("v".to_string(), Value::from(0));
        record
    }
}

impl<W: Write + Send> LogSink for JsonLinesSink<W> {
    fn emit(&self, level: Level, fields: &Fields, message: &str) -> Result<(), SinkError> {
        if level < self.min_level {
            return Ok(());
        }

        let mut line = serde_json::to_vec(&self.record(level, fields, message))?;
        line.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(sink: JsonLinesSink<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_record_layout() {
        let sink = JsonLinesSink::new("pm2-forwarder", Level::Debug, Vec::new())
            .with_hostname(Some("edge-3".to_string()));
        let mut fields = Fields::new();
        fields.insert("host".to_string(), json!("web-1"));
        fields.insert("relay".to_string(), json!({"name": "relay-eu"}));
        sink.emit(Level::Warn, &fields, "slow relay").unwrap();

        let out = lines(sink);
        assert_eq!(out.len(), 1);
        let record = &out[0];
        assert_eq!(record["name"], "pm2-forwarder");
        assert_eq!(record["hostname"], "edge-3");
        assert_eq!(record["level"], 40);
        assert_eq!(record["msg"], "slow relay");
        assert_eq!(record["host"], "web-1");
        assert_eq!(record["relay"]["name"], "relay-eu");
        assert_eq!(record["v"], 0);
        assert!(record["time"].as_str().unwrap().ends_with('Z'));
        assert!(record.get("message").is_none());
    }

    #[test]
    fn test_below_min_level_is_skipped() {
        let sink = JsonLinesSink::new("f", Level::Info, Vec::new());
        sink.emit(Level::Debug, &Fields::new(), "noise").unwrap();
        sink.emit(Level::Error, &Fields::new(), "kept").unwrap();
        let out = lines(sink);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["msg"], "kept");
    }

    #[test]
    fn test_fields_cannot_override_envelope() {
        let sink = JsonLinesSink::new("f", Level::Debug, Vec::new());
        let mut fields = Fields::new();
        fields.insert("msg".to_string(), json!("spoofed"));
        fields.insert("level".to_string(), json!(99));
        sink.emit(Level::Info, &fields, "real").unwrap();
        let out = lines(sink);
        assert_eq!(out[0]["msg"], "real");
        assert_eq!(out[0]["level"], 30);
        assert!(out[0].get("hostname").is_none());
    }

    #[test]
    fn test_multiline_message_stays_one_line() {
        let sink = JsonLinesSink::new("f", Level::Debug, Vec::new());
        sink.emit(Level::Error, &Fields::new(), "a\nb").unwrap();
        let out = lines(sink);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["msg"], "a\nb");
    }
}
