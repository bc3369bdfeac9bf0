//! Conf module: configuration model, loading, and validation.

pub mod model;
pub mod load;

pub use model::{ConfigError, ConfigSource, EnrichmentConfig, ForwarderConfig, LogFormat};
