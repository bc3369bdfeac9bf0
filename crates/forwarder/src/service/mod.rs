//! Service: the forwarding pipeline between the record source and the sink.

pub mod enrich;
pub mod metrics;
pub mod pipeline;

pub use metrics::{PipelineMetrics, PipelineSnapshot};
pub use pipeline::Pipeline;
