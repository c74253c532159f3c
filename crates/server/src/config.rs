//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `ESRB_*` environment variables and an
/// optional `esrb-server` config file in the working directory
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Model artifact loaded at startup
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_model_path() -> PathBuf {
    PathBuf::from(esrb_lib::DEFAULT_MODEL_FILE)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            model_path: default_model_path(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(config::Environment::with_prefix("ESRB"))
    }

    fn load_from(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("esrb-server").required(false))
            .add_source(env)
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("ESRB").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::load_from(env(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.model_path, PathBuf::from("Model.json"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::load_from(env(&[
            ("ESRB_PORT", "9000"),
            ("ESRB_MODEL_PATH", "/models/esrb.json"),
            ("ESRB_BIND_ADDRESS", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.model_path, PathBuf::from("/models/esrb.json"));
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
    }
}
