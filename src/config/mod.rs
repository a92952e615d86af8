//! YAML configuration with `${ENV_VAR}` substitution.
//!
//! Every section is optional and falls back to the defaults in
//! `crate::constants`. Effect parameters are deliberately absent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_PIXELS, DEFAULT_MAX_SOURCE_BYTES, DEFAULT_USER_AGENT, VALID_LOG_LEVELS,
};
use crate::error::ConfigError;

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_SOURCE_BYTES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_pixels() -> u64 {
    DEFAULT_MAX_PIXELS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source fetch limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Total request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds (default: 5)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum source body size in bytes (default: 10 MB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_bytes: default_max_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum `width * height` accepted before decoding (default: 40M)
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_pixels: default_max_pixels(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Wall-clock budget for a whole render; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_timeout_secs: Option<u64>,
}

impl PipelineConfig {
    pub fn processing_timeout(&self) -> Option<Duration> {
        self.processing_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });
        if let Some(var_name) = missing {
            return Err(ConfigError::MissingEnvVar(var_name));
        }

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetcher.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.fetcher.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetcher.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.fetcher.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "fetcher.max_bytes must be greater than 0".to_string(),
            ));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fetcher.user_agent cannot be empty".to_string(),
            ));
        }
        if self.decoder.max_pixels == 0 {
            return Err(ConfigError::Invalid(
                "decoder.max_pixels must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.processing_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "pipeline.processing_timeout_secs must be greater than 0".to_string(),
            ));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}
