pub use super::model::{Format, LogicalRecord, OutputFragment, RawChunk, TelemetryError};
pub use super::severity::Level;

pub trait FormatHandler: Send + Sync {
    /// turn one logical record's message into output fragments
    fn handle(&self, message: &str, default_level: Level) -> Vec<OutputFragment>;
    fn format(&self) -> Format;
}
