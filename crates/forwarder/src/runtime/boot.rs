//! Boot: config load and logging init.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::conf::{ForwarderConfig, LogFormat};

/// Initialise the tracing / logging subsystem.
///
/// Diagnostics go to stderr; stdout belongs to the record sink.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "forwarder=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

/// Load and validate config, then bring up logging in the configured format.
pub fn boot() -> Result<ForwarderConfig, Box<dyn std::error::Error>> {
    let (config, source) = ForwarderConfig::load()?;
    config.validate()?;
    init_logging(config.diagnostic_format()?);

    info!("Starting pm2 log forwarder v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", source);
    info!(
        "Loaded configuration: name={}, min_level={}, channel_capacity={}",
        config.log_name, config.log_level, config.channel_capacity
    );
    info!(
        "Enrichment: host={:?}, project={:?}, env={:?}",
        config.enrichment.host, config.enrichment.project, config.enrichment.env
    );

    Ok(config)
}
