//! Red5 media server logs: `[LEVEL] [thread] package.Class - message`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::traits::*;

/// Lines containing any of these are routine connection churn and never
/// forwarded.
pub const IGNORED_SUBSTRINGS: [&str; 7] = [
    "RTMPMinaIoHandler",
    "Closing RTMPMinaConnection",
    "Connection closed by peer",
    "Idle (no bytes) detected",
    "Bandwidth check done",
    "ClientBroadcastStream - Stream stop",
    "WebSocketConnection - Session closed",
];

static LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\w+)\] \[([^\]]+)\] (\S+) - (.*)$").expect("valid regex")
});

pub struct Red5Handler;

pub fn is_ignored(line: &str) -> bool {
    IGNORED_SUBSTRINGS.iter().any(|needle| line.contains(needle))
}

impl FormatHandler for Red5Handler {
    fn handle(&self, message: &str, default_level: Level) -> Vec<OutputFragment> {
        message
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !is_ignored(line))
            .map(|line| match LINE.captures(line) {
                Some(caps) => {
                    let level = caps.get(1).map_or(default_level, |m| Level::resolve(m.as_str()));
                    let thread = caps.get(2).map_or("", |m| m.as_str());
                    let package = caps.get(3).map_or("", |m| m.as_str());
                    let text = caps.get(4).map_or("", |m| m.as_str());
                    OutputFragment::new(level, text)
                        .with_field("thread", thread)
                        .with_field("package", package)
                }
                None => OutputFragment::new(default_level, line),
            })
            .filter(|fragment| !fragment.message.is_empty())
            .collect()
    }

    fn format(&self) -> Format {
        Format::Red5
    }
}
