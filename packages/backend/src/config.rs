//! # Backend connection settings
//!
//! [`BackendConfig`] names the hosted backend the application talks to. It is read
//! either from the environment (a `.env` file is honoured via `dotenvy`) or from a
//! TOML document:
//!
//! ```toml
//! url = "https://project.example.co"
//! anon_key = "public-anon-key"
//! schema = "public"     # optional
//! ```
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `PARISHBOOK_URL` | `url` | required |
//! | `PARISHBOOK_ANON_KEY` | `anon_key` | required |
//! | `PARISHBOOK_SCHEMA` | `schema` | `public` |

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const URL_VAR: &str = "PARISHBOOK_URL";
pub const ANON_KEY_VAR: &str = "PARISHBOOK_ANON_KEY";
pub const SCHEMA_VAR: &str = "PARISHBOOK_SCHEMA";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub url: String,
    /// Public API key sent with every request.
    pub anon_key: String,
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "public".to_string()
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            schema: default_schema(),
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(URL_VAR).ok_or(ConfigError::Missing(URL_VAR))?;
        let anon_key = lookup(ANON_KEY_VAR).ok_or(ConfigError::Missing(ANON_KEY_VAR))?;
        let mut config = Self::new(url, anon_key);
        if let Some(schema) = lookup(SCHEMA_VAR).filter(|s| !s.trim().is_empty()) {
            config.schema = schema;
        }
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(s)?;
        config.url = config.url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url)
    }

    /// Websocket endpoint of the change feed.
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        };
        format!("{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", self.anon_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (URL_VAR, "https://db.example.org/"),
            (ANON_KEY_VAR, "anon"),
        ]
        .into_iter()
        .collect();
        let config = BackendConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.url, "https://db.example.org");
        assert_eq!(config.schema, "public");
        assert_eq!(config.rest_url(), "https://db.example.org/rest/v1");
        assert_eq!(
            config.realtime_url(),
            "wss://db.example.org/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
        assert_eq!(
            BackendConfig::new("http://127.0.0.1:54321", "k").realtime_url(),
            "ws://127.0.0.1:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
    }

    #[test]
    fn test_missing_key() {
        let err = BackendConfig::from_lookup(|k| {
            (k == URL_VAR).then(|| "https://db.example.org".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ANON_KEY_VAR)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = BackendConfig::from_toml(
            r#"
            url = "https://db.example.org/"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.url, "https://db.example.org");
        assert_eq!(config.schema, "public");

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert_eq!(BackendConfig::from_toml(&rendered).unwrap(), config);

        assert!(BackendConfig::from_toml("url = 3").is_err());
    }
}
