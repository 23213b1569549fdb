use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the configured rules engine URL
pub const ENGINE_URL_ENV: &str = "MTG_ASSIST_ENGINE_URL";

/// Config file read when no path is given and it exists
pub const DEFAULT_CONFIG_FILE: &str = "mtg-assist.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Where the rules engine lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub legality_path: String,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_url: "http://127.0.0.1:8080".to_string(),
            legality_path: "/api/legality/check".to_string(),
            timeout_secs: 5,
        }
    }
}

impl EngineConfig {
    pub fn legality_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.legality_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl AssistConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, else from `mtg-assist.toml` if present, else defaults;
    /// then apply the engine URL environment override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if default_path.exists() => Self::from_file(default_path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(ENGINE_URL_ENV) {
            if !url.is_empty() {
                config.engine.base_url = url;
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AssistConfig::from_toml_str(
            r#"
            [engine]
            base_url = "http://engine:9000/"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.base_url, "http://engine:9000/");
        assert_eq!(config.engine.timeout_secs, 5);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(
            config.engine.legality_url(),
            "http://engine:9000/api/legality/check"
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = AssistConfig::from_toml_str("[engine\nbase_url = 3");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AssistConfig::load(Some(Path::new("fixtures/missing.toml")));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
