//! Relay statistics extraction from live/manager log payloads.

use std::collections::BTreeMap;
use serde_json::{Map, Value};

use super::literal;
use super::model::{RelaySummary, TelemetryError};

/// Bitrate tiers every summary reports, even when no stream uses them.
pub const KNOWN_LAYERS: [&str; 6] = [
    "Audio",
    "Video250kbps",
    "Video500kbps",
    "Video1000kbps",
    "Video1500kbps",
    "Video2500kbps",
];

/// The two packet layouts a statistics announcement can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketShape {
    /// `statistic` and `usersCount` at the top level
    Outer,
    /// statistic wrapped in a notification batch, under `broadcast`
    Notification,
}

impl PacketShape {
    pub const ALL: [PacketShape; 2] = [PacketShape::Outer, PacketShape::Notification];

    pub fn sentinel(&self) -> &'static str {
        match self {
            PacketShape::Outer => "%Relay.Statistic.Packet{",
            PacketShape::Notification => "%Relay.Notification.Batch{",
        }
    }

    fn of_payload(payload: &str) -> Option<PacketShape> {
        Self::ALL
            .into_iter()
            .find(|shape| payload.starts_with(shape.sentinel()))
    }
}

/// Find the earliest sentinel in `message` and return the payload from there.
pub fn locate_payload(message: &str) -> Option<(PacketShape, &str)> {
    PacketShape::ALL
        .into_iter()
        .filter_map(|shape| message.find(shape.sentinel()).map(|idx| (idx, shape)))
        .min_by_key(|(idx, _)| *idx)
        .map(|(idx, shape)| (shape, &message[idx..]))
}

/// Parse a statistics payload into a [`RelaySummary`].
///
/// `payload` must begin with one of the [`PacketShape`] sentinels. Text after
/// the packet literal is ignored. Missing counters read as zero; anything
/// structurally wrong fails the whole extraction.
pub fn extract(payload: &str) -> Result<RelaySummary, TelemetryError> {
    let payload = payload.trim_start();
    let shape = PacketShape::of_payload(payload)
        .ok_or_else(|| shape_error("payload does not start with a statistics sentinel", payload))?;

    let (packet, _) = literal::parse_prefix(payload).map_err(|source| TelemetryError::Literal {
        source,
        payload: payload.to_string(),
    })?;

    let (container, statistic) = match shape {
        PacketShape::Outer => {
            let container = packet
                .as_object()
                .ok_or_else(|| shape_error("packet is not a map", payload))?;
            let statistic = object_field(container, "statistic", payload)?;
            (container, statistic)
        }
        PacketShape::Notification => {
            let container = packet
                .pointer("/notifications/notifications/0/content/value")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    shape_error("missing notifications[0].content.value", payload)
                })?;
            let statistic = object_field(container, "broadcast", payload)?;
            (container, statistic)
        }
    };

    let relay = statistic
        .get("relay")
        .or_else(|| container.get("relay"))
        .and_then(Value::as_str)
        .ok_or_else(|| shape_error("missing relay identifier", payload))?;

    let users_count = count(container.get("usersCount"), "usersCount", payload)?;

    let (output_kbps, skip_kbps, output_per_user_kbps) = match statistic.get("network") {
        None | Some(Value::Null) => (0, 0, 0),
        Some(Value::Object(network)) => (
            count(network.get("outputKbps"), "network.outputKbps", payload)?,
            count(network.get("skipKbps"), "network.skipKbps", payload)?,
            count(network.get("outputPerUserKbps"), "network.outputPerUserKbps", payload)?,
        ),
        Some(_) => return Err(shape_error("network is not a map", payload)),
    };

    let mut layer_targets: BTreeMap<String, u64> = KNOWN_LAYERS
        .iter()
        .map(|name| (name.to_string(), 0))
        .collect();

    for session in members(statistic.get("sessions"), "sessions", payload)? {
        let session = session
            .as_object()
            .ok_or_else(|| shape_error("session is not a map", payload))?;
        for stream in members(session.get("streams"), "streams", payload)? {
            let stream = stream
                .as_object()
                .ok_or_else(|| shape_error("stream is not a map", payload))?;
            for layer in members(stream.get("layers"), "layers", payload)? {
                let name = layer
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| shape_error("layer without a name", payload))?;
                let targets = count(layer.get("targets"), "layer.targets", payload)?;

                let bucket = layer_targets.entry(name.to_string()).or_insert(0);
                *bucket = bucket
                    .checked_add(targets)
                    .ok_or_else(|| shape_error("layer targets overflow", payload))?;
            }
        }
    }

    Ok(RelaySummary {
        name: relay_name(relay).to_string(),
        users_count,
        output_kbps,
        skip_kbps,
        output_per_user_kbps,
        layer_targets,
    })
}

/// `relay-eu-1-7f3a` -> `relay-eu-1`
fn relay_name(relay: &str) -> &str {
    match relay.rfind('-') {
        Some(idx) => &relay[..idx],
        None => relay,
    }
}

fn shape_error(reason: &str, payload: &str) -> TelemetryError {
    TelemetryError::Shape {
        reason: reason.to_string(),
        payload: payload.to_string(),
    }
}

fn object_field<'v>(
    container: &'v Map<String, Value>,
    key: &str,
    payload: &str,
) -> Result<&'v Map<String, Value>, TelemetryError> {
    container
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| shape_error(&format!("missing or invalid '{}'", key), payload))
}

/// Children of a collection field. Lists and maps (keyed by id) are both
/// accepted; an absent field has no children.
fn members<'v>(
    value: Option<&'v Value>,
    field: &str,
    payload: &str,
) -> Result<Vec<&'v Value>, TelemetryError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(Value::Object(map)) => Ok(map.values().collect()),
        Some(_) => Err(shape_error(&format!("'{}' is not a collection", field), payload)),
    }
}

fn count(value: Option<&Value>, field: &str, payload: &str) -> Result<u64, TelemetryError> {
    let invalid = || shape_error(&format!("'{}' is not a non-negative number", field), payload);
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                Ok(v)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
                    _ => Err(invalid()),
                }
            }
        }
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
