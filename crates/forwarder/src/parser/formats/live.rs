//! live / manager processes (actor runtime).
//!
//! Lines look like `2024-03-01 10:00:00.123  INFO  message`. Two kinds of
//! message carry extra structure: relay statistics announcements, which embed
//! a statistics packet literal, and relay count announcements.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::parser::telemetry;
use crate::parser::traits::*;

const STAMP: &str = r"\d{4}-\d\d-\d\d \d\d:\d\d:\d\d\.\d{3}\s+";

static LEVEL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?s)^{}(\w+)\s+(.*)", STAMP)).expect("valid regex"));

/// Statistics announcements: legacy and current wording.
static STATISTICS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(&format!(r"^(?:{}\w+\s+)?Relay statistics:", STAMP)).expect("valid regex"),
        Regex::new(&format!(r"^(?:{}\w+\s+)?\[stats\] relay \S+", STAMP)).expect("valid regex"),
    ]
});

static RELAY_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{}\w+\s+)?Number of relays: (\d+)", STAMP)).expect("valid regex")
});

/// Codec descriptions such as `(h264 Main 1280x720)` are not valid literal
/// syntax and are removed before the payload is parsed.
static CODEC_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((?:h264|h265|hevc|vp8|vp9|av1|avc1)[^)]*\)").expect("valid regex")
});

pub struct LiveManagerHandler;

impl LiveManagerHandler {
    fn relay_summary(&self, message: &str) -> Option<serde_json::Value> {
        let cleaned = CODEC_NOISE.replace_all(message, "");
        let (shape, payload) = match telemetry::locate_payload(&cleaned) {
            Some(found) => found,
            None => {
                warn!(
                    target: "forwarder::diagnostics",
                    line = %message,
                    "statistics announcement without a packet"
                );
                return None;
            }
        };

        match telemetry::extract(payload) {
            Ok(summary) => match serde_json::to_value(&summary) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(target: "forwarder::diagnostics", error = %e, "relay summary not serializable");
                    None
                }
            },
            Err(e) => {
                warn!(
                    target: "forwarder::diagnostics",
                    error = %e,
                    shape = ?shape,
                    payload = %e.payload(),
                    "relay statistics extraction failed"
                );
                None
            }
        }
    }
}

impl FormatHandler for LiveManagerHandler {
    fn handle(&self, message: &str, _default_level: Level) -> Vec<OutputFragment> {
        if message.is_empty() {
            return Vec::new();
        }

        let (level, text) = match LEVEL_PREFIX.captures(message) {
            Some(caps) => (
                caps.get(1).map_or(Level::Info, |m| Level::resolve(m.as_str())),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (Level::Info, message),
        };

        if text.is_empty() {
            return Vec::new();
        }

        let mut fragment = OutputFragment::new(level, text);
        let original = message.trim();

        if STATISTICS.iter().any(|re| re.is_match(original)) {
            if let Some(relay) = self.relay_summary(original) {
                fragment.fields.insert("relay".to_string(), relay);
            }
        } else if let Some(count) = RELAY_COUNT
            .captures(original)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            fragment.fields.insert("numberOfRelays".to_string(), count.into());
        }

        vec![fragment]
    }

    fn format(&self) -> Format {
        Format::LiveManager
    }
}
