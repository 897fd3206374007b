//! Backend configuration
//!
//! Settings are read from `config/fees.toml` when present and overridden by
//! `FEES__*` environment variables, e.g. `FEES__BACKEND__BASE_URL`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default location of the configuration file
pub const CONFIG_FILE: &str = "config/fees.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeesConfig {
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("FEES")
        .separator("__")
        .try_parsing(true)
}

impl FeesConfig {
    /// Load the configuration from [`CONFIG_FILE`], falling back to env vars
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load the configuration from a specific file, falling back to env vars
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = match Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment())
            .build()
        {
            Ok(settings) => settings,
            Err(err) => {
                if Path::new(path).exists() {
                    warn!(path, error = %err, "failed to load config file, falling back to env");
                }
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        settings.try_deserialize::<FeesConfig>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = FeesConfig::load_from("config/does-not-exist.toml").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8080/api");
        assert_eq!(config.backend.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("fees-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://school.example:9000/api\"\ntimeout_seconds = 5"
        )
        .unwrap();

        let config = FeesConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.backend.base_url, "http://school.example:9000/api");
        assert_eq!(config.backend.timeout_seconds, 5);

        std::fs::remove_file(&path).unwrap();
    }
}
