//! Configuration model for the selector.

use serde::{Deserialize, Serialize};

/// Operating phase of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Collect traces and learn, but do not enforce exclusion.
    Passive,
    /// Enforce the selected subset.
    Active,
}

/// Main configuration for the loadout selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoadoutConfig {
    /// Master switch; when false every turn is a pass-through.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Passive collects data without filtering; active enforces it.
    #[serde(default = "default_phase")]
    pub phase: Phase,

    /// Token budget available to candidate arms per turn.
    #[serde(default = "default_token_budget")]
    pub token_budget: u32,

    /// Probability that a turn runs as a counterfactual baseline.
    #[serde(default = "default_baseline_rate")]
    pub baseline_rate: f64,

    /// Observations below which an arm counts as underexplored.
    #[serde(default = "default_min_pulls")]
    pub min_pulls: u64,

    /// Arm ids that are never excluded while budget allows; the
    /// non-negotiable minimum capability set.
    #[serde(default = "default_seed_arm_ids")]
    pub seed_arm_ids: Vec<String>,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_enabled() -> bool {
    true
}

const fn default_phase() -> Phase {
    Phase::Passive
}

const fn default_token_budget() -> u32 {
    8000
}

const fn default_baseline_rate() -> f64 {
    0.10
}

const fn default_min_pulls() -> u64 {
    5
}

fn default_seed_arm_ids() -> Vec<String> {
    vec![
        "tool:fs:read".to_string(),
        "tool:fs:write".to_string(),
        "tool:exec:bash".to_string(),
    ]
}

impl Default for LoadoutConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            phase: default_phase(),
            token_budget: default_token_budget(),
            baseline_rate: default_baseline_rate(),
            min_pulls: default_min_pulls(),
            seed_arm_ids: default_seed_arm_ids(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".loadout/loadout.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
