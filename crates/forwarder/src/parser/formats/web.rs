//! front / www web processes.

use crate::parser::traits::*;

/// First lines that are client mistakes rather than server faults.
pub const BENIGN_ERRORS: [&str; 3] = [
    "Error: Not Found",
    "Error: Unauthorized",
    "Error: Could not authenticate you.",
];

/// Same, matched against the part of the first line before any comma.
pub const BENIGN_ERROR_PREFIXES: [&str; 2] = [
    "Error: cannot join session in inappropriate state",
    "Error: no session runners",
];

pub struct WebFrontHandler;

/// Demote known benign errors to `warn`, otherwise keep `default_level`.
pub fn resolve_level(message: &str, default_level: Level) -> Level {
    let first_line = message.split('\n').next().unwrap_or("");
    let before_comma = first_line.split(',').next().unwrap_or("");

    if BENIGN_ERRORS.contains(&first_line) || BENIGN_ERROR_PREFIXES.contains(&before_comma) {
        Level::Warn
    } else {
        default_level
    }
}

impl FormatHandler for WebFrontHandler {
    fn handle(&self, message: &str, default_level: Level) -> Vec<OutputFragment> {
        if message.is_empty() {
            return Vec::new();
        }
        vec![OutputFragment::new(resolve_level(message, default_level), message)]
    }

    fn format(&self) -> Format {
        Format::WebFront
    }
}
