use parking_lot::Mutex;

use super::{LogSink, SinkError};
use crate::parser::{Fields, Level};

#[derive(Debug, Clone, PartialEq)]
pub struct EmittedRecord {
    pub level: Level,
    pub fields: Fields,
    pub message: String,
}

/// Keeps every emission in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EmittedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EmittedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, fields: &Fields, message: &str) -> Result<(), SinkError> {
        self.records.lock().push(EmittedRecord {
            level,
            fields: fields.clone(),
            message: message.to_string(),
        });
        Ok(())
    }
}
