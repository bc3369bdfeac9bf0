use crate::parser::traits::*;

/// Fallback for processes without a known format: the whole record is one
/// fragment at the channel's level.
pub struct PlainHandler;

impl FormatHandler for PlainHandler {
    fn handle(&self, message: &str, default_level: Level) -> Vec<OutputFragment> {
        if message.is_empty() {
            return Vec::new();
        }
        vec![OutputFragment::new(default_level, message)]
    }

    fn format(&self) -> Format {
        Format::Plain
    }
}
