//! Sink: where finished fragments go.
//!
//! The pipeline hands every fragment to a [`LogSink`] as
//! `emit(level, fields, message)`. Delivery guarantees are the sink's own
//! business.

pub mod json;
pub mod memory;

use thiserror::Error;

use crate::parser::{Fields, Level};

pub use json::JsonLinesSink;
pub use memory::{EmittedRecord, MemorySink};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait LogSink: Send + Sync {
    /// `fields` never contains a `message` key; the text travels separately.
    fn emit(&self, level: Level, fields: &Fields, message: &str) -> Result<(), SinkError>;
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn emit(&self, level: Level, fields: &Fields, message: &str) -> Result<(), SinkError> {
        (**self).emit(level, fields, message)
    }
}
