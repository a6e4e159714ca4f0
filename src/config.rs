//! Process configuration from the environment and search parameters from YAML files.

use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::parallel::pool::DEFAULT_MAX_WORKERS;
use crate::parallel::SearchConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const BIND_ENV: &str = "TACTICIAN_BIND";
pub const MAX_WORKERS_ENV: &str = "TACTICIAN_MAX_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Cap on search workers regardless of what a request asks for.
    pub max_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](AppConfig::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(bind_addr) = lookup(BIND_ENV).filter(|value| !value.trim().is_empty()) {
            config.bind_addr = bind_addr.trim().to_string();
        }
        if let Some(raw) = lookup(MAX_WORKERS_ENV) {
            config.max_workers = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{MAX_WORKERS_ENV} must be a positive integer, got '{raw}'"
                    )))
                }
            };
        }
        Ok(config)
    }
}

/// Parses and validates a YAML search configuration. Omitted fields take their defaults.
pub fn parse_search_yaml(text: &str) -> Result<SearchConfig, ConfigError> {
    let config: SearchConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

pub fn load_search_file(path: impl AsRef<Path>) -> Result<SearchConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_search_yaml(&text)
}
