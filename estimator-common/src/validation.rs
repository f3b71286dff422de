//! Configuration validation.
//!
//! Rejects values the backtest engine treats as preconditions (for example a
//! zero holding period) before a run is attempted.

use thiserror::Error;

use crate::config::{BacktestDefaults, BatchConfig, Config, ObservabilityConfig};
use crate::logging::LogFormat;

/// A configuration value the engine cannot run with.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{n} configuration problems: {0:?}", n = .0.len())]
    Multiple(Vec<ValidationError>),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Implemented by each configuration section.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.backtest.validate(),
            self.batch.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Load, apply environment overrides, then `overrides` (command-line
    /// flags), and validate the result.
    pub fn load_and_validate(
        explicit: Option<&std::path::Path>,
        overrides: impl FnOnce(&mut Self),
    ) -> anyhow::Result<Self> {
        let mut config = Self::load_with_env(explicit)?;
        overrides(&mut config);
        config.validate().map_err(crate::error::Error::from)?;
        Ok(config)
    }
}

impl Validate for BacktestDefaults {
    fn validate(&self) -> ValidationResult<()> {
        if self.holding_period < 1 {
            return Err(ValidationError::InvalidValue {
                field: "backtest.holding_period".into(),
                reason: "must be at least 1".into(),
            });
        }

        if !self.threshold.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "backtest.threshold".into(),
                reason: "must be a finite number".into(),
            });
        }

        Ok(())
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.max_threads == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "batch.max_threads".into(),
                reason: "must be greater than 0 when set".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", LEVELS.join(", ")),
            });
        }

        if let Err(reason) = self.log_format.parse::<LogFormat>() {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("{reason}; expected json or pretty"),
            });
        }

        if self.excluded_targets.iter().any(|t| t.trim().is_empty()) {
            return Err(ValidationError::MissingField {
                field: "observability.excluded_targets[]".into(),
            });
        }

        Ok(())
    }
}
