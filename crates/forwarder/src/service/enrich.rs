use serde_json::Value;

use crate::conf::EnrichmentConfig;
use crate::parser::Fields;

impl EnrichmentConfig {
    /// Append the configured `host`, `project` and `env` to `fields`.
    /// Unset entries are left out entirely.
    pub fn apply(&self, fields: &mut Fields) {
        let entries = [
            ("host", &self.host),
            ("project", &self.project),
            ("env", &self.env),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_all_configured() {
        let enrichment = EnrichmentConfig {
            host: Some("edge-1".to_string()),
            project: Some("live".to_string()),
            env: Some("production".to_string()),
        };
        let mut fields = Fields::new();
        fields.insert("thread".to_string(), json!("main"));
        enrichment.apply(&mut fields);

        assert_eq!(fields["host"], "edge-1");
        assert_eq!(fields["project"], "live");
        assert_eq!(fields["env"], "production");
        assert_eq!(fields["thread"], "main");
    }

    #[test]
    fn test_apply_skips_unset() {
        let enrichment = EnrichmentConfig {
            project: Some("live".to_string()),
            ..Default::default()
        };
        let mut fields = Fields::new();
        enrichment.apply(&mut fields);

        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("host"));
        assert!(!fields.contains_key("env"));
    }

    #[test]
    fn test_apply_empty_config_is_noop() {
        let mut fields = Fields::new();
        EnrichmentConfig::default().apply(&mut fields);
        assert!(fields.is_empty());
    }
}
