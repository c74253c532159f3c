//! Configuration management for the CLI
//!
//! Command-line flags win over `~/.config/esrb/config.json`, which wins over
//! built-in defaults.

use crate::output::OutputFormat;
use crate::GlobalArgs;
use anyhow::{Context, Result};
use esrb_lib::{OptimizingMetric, DEFAULT_MODEL_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TRAINING_FILE: &str = "ESRB.csv";
pub const DEFAULT_VALIDATION_FILE: &str = "ESRBTest.csv";

/// Contents of the config file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub model_path: Option<PathBuf>,
    pub training_data: Option<PathBuf>,
    pub validation_data: Option<PathBuf>,
    pub optimizing_metric: Option<OptimizingMetric>,
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from the user's config file, if there is one
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("esrb").join("config.json"))
    }
}

/// Effective settings after merging flags, config file and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub model_path: PathBuf,
    pub training_data: PathBuf,
    pub validation_data: PathBuf,
    pub optimizing_metric: OptimizingMetric,
    pub format: OutputFormat,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, config: Config) -> Self {
        let format = args
            .format
            .or_else(|| config.default_format.as_deref().and_then(OutputFormat::parse))
            .unwrap_or_default();

        Self {
            api_url: args
                .api_url
                .clone()
                .or(config.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model_path: args
                .model
                .clone()
                .or(config.model_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_FILE)),
            training_data: args
                .training_data
                .clone()
                .or(config.training_data)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TRAINING_FILE)),
            validation_data: args
                .validation_data
                .clone()
                .or(config.validation_data)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VALIDATION_FILE)),
            optimizing_metric: args
                .metric
                .or(config.optimizing_metric)
                .unwrap_or_default(),
            format,
        }
    }
}
