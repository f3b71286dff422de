//! Configuration management for the estimator.
//!
//! The configuration file lives at `~/.estimator/config.json`. A missing file
//! is not an error; every section falls back to its defaults.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (ESTIMATOR_* prefix)
//! 3. Explicit config file values
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ESTIMATOR_LOG_LEVEL` → observability.log_level
//! - `ESTIMATOR_LOG_FORMAT` → observability.log_format
//! - `ESTIMATOR_THRESHOLD` → backtest.threshold
//! - `ESTIMATOR_HOLDING_PERIOD` → backtest.holding_period
//! - `ESTIMATOR_ALLOW_SHORT` → backtest.allow_short
//! - `ESTIMATOR_MAX_THREADS` → batch.max_threads

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".estimator"),
        |dirs| dirs.home_dir().join(".estimator"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Expand `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default strategy parameters for backtest runs
    #[serde(default)]
    pub backtest: BacktestDefaults,

    /// Feature catalogue defaults
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Parallel batch execution
    #[serde(default)]
    pub batch: BatchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Failures carry an [`Error`] so callers can tell a missing or malformed
    /// file (user-correctable) from an I/O fault.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let config = serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// An explicit path must exist; the default path may be absent.
    pub fn load_with_env(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ESTIMATOR_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ESTIMATOR_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Some(raw) = lookup("ESTIMATOR_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(v) => self.backtest.threshold = v,
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparsable ESTIMATOR_THRESHOLD"),
            }
        }
        if let Some(raw) = lookup("ESTIMATOR_HOLDING_PERIOD") {
            match raw.trim().parse::<usize>() {
                Ok(v) => self.backtest.holding_period = v,
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring unparsable ESTIMATOR_HOLDING_PERIOD")
                }
            }
        }
        if let Some(raw) = lookup("ESTIMATOR_ALLOW_SHORT") {
            match parse_bool(&raw) {
                Some(v) => self.backtest.allow_short = v,
                None => tracing::warn!(value = %raw, "Ignoring unparsable ESTIMATOR_ALLOW_SHORT"),
            }
        }
        if let Some(raw) = lookup("ESTIMATOR_MAX_THREADS") {
            match raw.trim().parse::<usize>() {
                Ok(v) => self.batch.max_threads = Some(v),
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparsable ESTIMATOR_MAX_THREADS"),
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Default strategy parameters.
///
/// `holding_period` is kept as a plain integer here so a bad value can be
/// reported by validation instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestDefaults {
    /// Minimum predicted return required to open a position
    #[serde(default)]
    pub threshold: f64,

    /// Days a position is held once opened (>= 1)
    #[serde(default = "default_holding_period")]
    pub holding_period: usize,

    /// Allow short positions when the prediction is below -threshold
    #[serde(default)]
    pub allow_short: bool,
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            holding_period: default_holding_period(),
            allow_short: false,
        }
    }
}

/// Feature catalogue defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Features requested when the caller names none. Empty means the full catalogue.
    #[serde(default)]
    pub default: Vec<String>,
}

/// Parallel batch execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker thread cap. `None` lets rayon pick one per core.
    #[serde(default)]
    pub max_threads: Option<usize>,
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets pinned to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_holding_period() -> usize {
    1
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
