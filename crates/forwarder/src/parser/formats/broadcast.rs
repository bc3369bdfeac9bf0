//! Broadcaster processes pushing to external platforms.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::traits::*;

/// `<environment>_<platform>` process names.
pub const BROADCASTER_APPS: [&str; 9] = [
    "test_facebook",
    "test_youtube",
    "test_fan",
    "staging_facebook",
    "staging_youtube",
    "staging_fan",
    "prod_facebook",
    "prod_youtube",
    "prod_fan",
];

static FILE_STREAMER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d \d\d:\d\d:\d\d:\d{3} FileStreamer\[\d+:\d+\] ([\s\S]*)$")
        .expect("valid regex")
});

pub struct BroadcasterHandler;

impl FormatHandler for BroadcasterHandler {
    /// Always `info`: the streamer writes progress to stderr.
    fn handle(&self, message: &str, _default_level: Level) -> Vec<OutputFragment> {
        let text = match FILE_STREAMER.captures(message.trim()) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
            None => message,
        };
        if text.is_empty() {
            return Vec::new();
        }
        vec![OutputFragment::new(Level::Info, text)]
    }

    fn format(&self) -> Format {
        Format::Broadcaster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_streamer_prefix_is_stripped() {
        let out = BroadcasterHandler.handle(
            "2024-03-01 10:00:00:123 FileStreamer[12:7] frame=100 fps=30\nbitrate=2000k",
            Level::Error,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].level, Level::Info);
        assert_eq!(out[0].message, "frame=100 fps=30\nbitrate=2000k");
    }

    #[test]
    fn test_other_lines_are_forwarded_whole() {
        let out = BroadcasterHandler.handle("rtmp handshake ok", Level::Error);
        assert_eq!(out[0].message, "rtmp handshake ok");
        assert_eq!(out[0].level, Level::Info);
    }

    #[test]
    fn test_empty_message_is_noop() {
        assert!(BroadcasterHandler.handle("", Level::Info).is_empty());
    }
}
