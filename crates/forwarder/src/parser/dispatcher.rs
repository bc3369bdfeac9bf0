use tracing::trace;

use super::formats::*;
use super::formats::broadcast::BROADCASTER_APPS;
use super::traits::*;

/// Hosts relaying broadcasts produce nothing worth forwarding.
pub const BROADCAST_RELAY_HOST: &str = "broadcaster";

impl Format {
    /// Format of a process, by exact process name.
    pub fn for_app(app: &str) -> Format {
        match app {
            "media_saver" | "media_transcoder" => Format::MediaWorker,
            "live" | "manager" => Format::LiveManager,
            "red5" => Format::Red5,
            "front" | "www" => Format::WebFront,
            app if BROADCASTER_APPS.contains(&app) => Format::Broadcaster,
            _ => Format::Plain,
        }
    }

    pub fn handler(&self) -> &'static dyn FormatHandler {
        match self {
            Format::MediaWorker => &MediaWorkerHandler,
            Format::LiveManager => &LiveManagerHandler,
            Format::Red5 => &Red5Handler,
            Format::Broadcaster => &BroadcasterHandler,
            Format::WebFront => &WebFrontHandler,
            Format::Plain => &PlainHandler,
        }
    }
}

/// Turn one record into fragments.
///
/// Pure function of its arguments. `host` is this machine's configured
/// identity; on a broadcast relay host every record is dropped.
pub fn dispatch(
    app: &str,
    message: &str,
    default_level: Level,
    host: Option<&str>,
) -> Vec<OutputFragment> {
    if host == Some(BROADCAST_RELAY_HOST) {
        return Vec::new();
    }
    if message.is_empty() {
        return Vec::new();
    }

    let format = Format::for_app(app);
    let fragments = format.handler().handle(message, default_level);
    trace!(app, format = format.as_str(), fragments = fragments.len(), "record dispatched");
    fragments
}

/// [`dispatch`] for an already reconstructed record.
pub fn dispatch_record(record: &LogicalRecord, default_level: Level, host: Option<&str>) -> Vec<OutputFragment> {
    dispatch(&record.app, &record.message, default_level, host)
}
