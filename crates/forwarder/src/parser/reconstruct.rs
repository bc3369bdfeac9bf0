//! Rebuilds logical records from raw process output.
//!
//! A chunk from the process bus may hold several records, and one record may
//! span several lines (stack traces, dumped objects). A line that starts
//! with a recognised timestamp opens a new record; every other line is a
//! continuation of the current one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{LogicalRecord, RawChunk};

/// `2024-03-01 10:00:00 +01:00: <rest>`, added by the process manager when
/// timestamps are enabled. Stripped before anything else.
static BLOCK_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d \d\d:\d\d:\d\d \+\d\d:\d\d: (.*)").expect("valid regex")
});

/// Record-start patterns, tried in order. Capture 1 is the record text.
static RECORD_START: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        // Fri, 01 Mar 2024 10:00:00 GMT <rest>
        Regex::new(r"^\w{3}, \d\d \w{3} \d{4} \d\d:\d\d:\d\d GMT (.*)").expect("valid regex"),
        // access log from the local proxy
        Regex::new(r"^::ffff:127\.0\.0\.1 - - \[\w{3}, \d\d \w{3} \d{4} \d\d:\d\d:\d\d GMT\](.*)")
            .expect("valid regex"),
    ]
});

/// Line-by-line accumulation state for one chunk.
#[derive(Debug, Default)]
pub struct RecordReconstructor {
    buffer: String,
    records: Vec<String>,
}

impl RecordReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line.
    pub fn push_line(&mut self, line: &str) {
        let line = match BLOCK_WRAPPER.captures(line) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
            None => line,
        };

        match record_start(line) {
            Some(rest) => {
                self.complete_current();
                self.buffer.push_str(rest);
            }
            None => {
                if !self.buffer.is_empty() {
                    self.buffer.push('\n');
                }
                self.buffer.push_str(line.trim());
            }
        }
    }

    /// Flush the last buffer and return all non-empty records in order.
    pub fn finish(mut self) -> Vec<String> {
        self.complete_current();
        self.records
    }

    /// Records completed so far (the current buffer is not included).
    pub fn completed(&self) -> &[String] {
        &self.records
    }

    fn complete_current(&mut self) {
        let record = std::mem::take(&mut self.buffer);
        // empty buffers never leave the reconstructor
        let record = record.trim_end();
        if !record.is_empty() {
            self.records.push(record.to_string());
        }
    }
}

fn record_start(line: &str) -> Option<&str> {
    RECORD_START
        .iter()
        .find_map(|re| re.captures(line))
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
}

/// Split a chunk into logical records attributed to its source process.
pub fn reconstruct(chunk: &RawChunk) -> Vec<LogicalRecord> {
    let mut state = RecordReconstructor::new();
    for line in chunk.text.split('\n') {
        state.push_line(line);
    }

    state
        .finish()
        .into_iter()
        .map(|message| LogicalRecord {
            app: chunk.source_app.clone(),
            message,
        })
        .collect()
}
