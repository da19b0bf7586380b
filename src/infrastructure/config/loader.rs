//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::LoadoutConfig;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid baseline_rate: {0}. Must be within [0, 1]")]
    InvalidBaselineRate(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.loadout/config.yaml` (project config)
    /// 3. `.loadout/local.yaml` (local overrides, optional)
    /// 4. Environment variables (`LOADOUT_*` prefix)
    pub fn load() -> Result<LoadoutConfig> {
        let config: LoadoutConfig = Figment::new()
            .merge(Serialized::defaults(LoadoutConfig::default()))
            .merge(Yaml::file(".loadout/config.yaml"))
            .merge(Yaml::file(".loadout/local.yaml"))
            .merge(Env::prefixed("LOADOUT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<LoadoutConfig> {
        let config: LoadoutConfig = Figment::new()
            .merge(Serialized::defaults(LoadoutConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &LoadoutConfig) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&config.baseline_rate) {
            return Err(ConfigError::InvalidBaselineRate(config.baseline_rate));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(0));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::InvalidLogLevel(other.to_string())),
        }

        match config.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        Ok(())
    }
}
