//! Shared plumbing for the estimator crates.
//!
//! - [`config`]: `~/.estimator/config.json` with `ESTIMATOR_*` overrides
//! - [`validation`]: per-section checks run before any backtest
//! - [`error`]: errors raised while preparing a run
//! - [`logging`]: `tracing` subscriber writing to stderr

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{BacktestDefaults, BatchConfig, Config, FeaturesConfig, ObservabilityConfig};
pub use error::Error;
pub use logging::LogFormat;
pub use validation::{Validate, ValidationError, ValidationResult};
