/// Log normalization and classification
///
/// Turns raw process output into leveled fragments ready for the sink.
///
/// # Architecture
///
/// - `reconstruct.rs`: rebuilds multi-line records from a raw chunk
/// - `dispatcher.rs`: picks a [`Format`] per record and runs its handler
/// - `formats/`: one handler per application log format
/// - `severity.rs`: the [`Level`] scale and token parsing
/// - `telemetry.rs`: relay statistics extraction for live/manager
/// - `literal.rs`: parser for the actor runtime's term notation
///
/// Nothing here keeps state between calls; every function can be used
/// from any number of tasks at once.

pub mod traits;
pub mod model;
pub mod severity;
pub mod reconstruct;
pub mod dispatcher;
pub mod formats;
pub mod telemetry;
pub mod literal;

// Re-export commonly used types
pub use traits::FormatHandler;
pub use model::{Channel, Fields, Format, LogicalRecord, OutputFragment, RawChunk, RelaySummary, TelemetryError};
pub use severity::Level;
pub use reconstruct::{reconstruct, RecordReconstructor};
pub use dispatcher::{dispatch, dispatch_record, BROADCAST_RELAY_HOST};
