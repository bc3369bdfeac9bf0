//! Model: ForwarderConfig and related structs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// `name` of every emitted record.
    pub log_name: String,
    /// Minimum level written to the sink.
    pub log_level: String,
    /// Diagnostic output on stderr: `pretty` or `json`.
    pub log_format: String,
    pub enrichment: EnrichmentConfig,
    pub channel_capacity: usize,
}

/// Static fields appended to every forwarded fragment.
///
/// `host` also identifies the machine; see
/// [`BROADCAST_RELAY_HOST`](crate::parser::BROADCAST_RELAY_HOST).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

/// Where [`ForwarderConfig::load`] found its base values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    /// No file at this path; defaults were used.
    Defaults(String),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "file {}", path),
            ConfigSource::Defaults(path) => write!(f, "defaults (no file at {})", path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<LogFormat> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            log_name: "pm2-forwarder".to_string(),
            log_level: "debug".to_string(),
            log_format: "pretty".to_string(),
            enrichment: EnrichmentConfig::default(),
            channel_capacity: 1024,
        }
    }
}

impl ForwarderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_name.trim().is_empty() {
            return Err(ConfigError::Invalid("log_name must not be empty".to_string()));
        }
        self.sink_level()?;
        self.diagnostic_format()?;
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn sink_level(&self) -> Result<Level, ConfigError> {
        Level::from_token(&self.log_level)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown log_level: {}", self.log_level)))
    }

    pub fn diagnostic_format(&self) -> Result<LogFormat, ConfigError> {
        LogFormat::parse(&self.log_format)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown log_format: {}", self.log_format)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ForwarderConfig Defaults ─────────────────────────────────

    #[test]
    fn test_forwarder_config_defaults() {
        let cfg = ForwarderConfig::default();
        assert_eq!(cfg.log_name, "pm2-forwarder");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.log_format, "pretty");
        assert_eq!(cfg.channel_capacity, 1024);
        assert_eq!(cfg.enrichment, EnrichmentConfig::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ForwarderConfig::default().validate().is_ok());
    }

    // ── Validation ───────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_empty_log_name() {
        let cfg = ForwarderConfig {
            log_name: "  ".to_string(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("log_name"), "Error should mention log_name: {}", err);
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let cfg = ForwarderConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"), "Error should mention log_level: {}", err);
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let cfg = ForwarderConfig {
            log_format: "xml".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let cfg = ForwarderConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_sink_level_accepts_aliases() {
        let cfg = ForwarderConfig {
            log_level: "WARNING".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.sink_level().unwrap(), Level::Warn);
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::File("/etc/f.toml".to_string()).to_string(), "file /etc/f.toml");
        assert_eq!(
            ConfigSource::Defaults("/etc/f.toml".to_string()).to_string(),
            "defaults (no file at /etc/f.toml)"
        );
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("plain"), None);
    }

    // ── Serialization Round-trip ─────────────────────────────────

    #[test]
    fn test_forwarder_config_toml_round_trip() {
        let cfg = ForwarderConfig {
            enrichment: EnrichmentConfig {
                host: Some("edge-1".to_string()),
                project: Some("live".to_string()),
                env: None,
            },
            ..Default::default()
        };
        let toml_str = toml::to_string(&cfg).expect("Should serialize to TOML");
        let deserialized: ForwarderConfig = toml::from_str(&toml_str).expect("Should deserialize from TOML");
        assert_eq!(deserialized, cfg);
    }

    #[test]
    fn test_forwarder_config_deserialize_partial_toml() {
        let toml_str = r#"
            log_level = "info"

            [enrichment]
            project = "streaming"
        "#;
        let cfg: ForwarderConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_name, "pm2-forwarder"); // default
        assert_eq!(cfg.enrichment.project.as_deref(), Some("streaming"));
        assert!(cfg.enrichment.host.is_none());
    }
}
