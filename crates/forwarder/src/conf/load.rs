//! Load: config loading from file and environment variables.

use std::path::Path;

use super::model::{ConfigError, ConfigSource, ForwarderConfig};

const DEFAULT_CONFIG_FILE: &str = "/etc/forwarder/forwarder.toml";

impl ForwarderConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    ///
    /// Runs before logging is up, so nothing is logged here; the returned
    /// [`ConfigSource`] is reported by the caller.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        let config_path = std::env::var("FORWARDER_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&config_path, |key| std::env::var(key).ok())
    }

    /// [`ForwarderConfig::load`] with an explicit file path and variable lookup.
    pub fn load_from<F>(config_path: &str, var: F) -> Result<(Self, ConfigSource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, source) = if Path::new(config_path).exists() {
            (Self::from_file(config_path)?, ConfigSource::File(config_path.to_string()))
        } else {
            (Self::default(), ConfigSource::Defaults(config_path.to_string()))
        };

        config.apply_overrides(var)?;
        Ok((config, source))
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_string(),
            source,
        })
    }

    /// Overwrite settings from `var`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = var("FORWARDER_LOG_NAME") {
            self.log_name = name;
        }
        if let Some(level) = var("FORWARDER_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = var("FORWARDER_LOG_FORMAT") {
            self.log_format = format;
        }
        if let Some(host) = var("FORWARDER_HOST") {
            self.enrichment.host = Some(host);
        }
        if let Some(project) = var("FORWARDER_PROJECT") {
            self.enrichment.project = Some(project);
        }
        if let Some(env) = var("FORWARDER_ENV") {
            self.enrichment.env = Some(env);
        }
        if let Some(capacity) = var("FORWARDER_CHANNEL_CAPACITY") {
            self.channel_capacity = capacity.parse().map_err(|_| ConfigError::Env {
                key: "FORWARDER_CHANNEL_CAPACITY",
                value: capacity,
            })?;
        }
        Ok(())
    }
}
