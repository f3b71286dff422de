//! Backtest engine for predicted-return strategies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use estimator_common::config::BacktestDefaults;

use super::metrics::{BacktestSummary, PerformanceAggregator};
use super::sanitize::{round_series, round_to, sanitize, SERIES_DECIMALS};
use super::signal::{self, Position};
use crate::data::BacktestInput;
use crate::error::{BacktestError, Result};

/// Backtest configuration
///
/// `holding_period` is non-zero by construction; callers reject a zero
/// period when converting from user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Minimum predicted return to open a long (its negation opens a short)
    pub threshold: f64,
    /// Days a position is held once opened
    pub holding_period: NonZeroUsize,
    /// Allow short positions
    pub allow_short: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            holding_period: NonZeroUsize::MIN,
            allow_short: false,
        }
    }
}

impl BacktestConfig {
    pub fn new(threshold: f64, holding_period: NonZeroUsize, allow_short: bool) -> Self {
        Self {
            threshold,
            holding_period,
            allow_short,
        }
    }
}

impl TryFrom<&BacktestDefaults> for BacktestConfig {
    type Error = BacktestError;

    fn try_from(defaults: &BacktestDefaults) -> Result<Self> {
        let holding_period = NonZeroUsize::new(defaults.holding_period).ok_or_else(|| {
            BacktestError::InvalidConfig("holding_period must be at least 1".into())
        })?;

        if !defaults.threshold.is_finite() {
            return Err(BacktestError::InvalidConfig(
                "threshold must be a finite number".into(),
            ));
        }

        Ok(Self::new(defaults.threshold, holding_period, defaults.allow_short))
    }
}

/// Backtest result
///
/// Field names are the serialization contract. Series are rounded to four
/// decimals, summary statistics to two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Trading dates, ascending
    pub dates: Vec<NaiveDate>,
    /// Position held on each date
    pub signals: Vec<Position>,
    /// Model forecasts
    pub predicted_returns: Vec<f64>,
    /// Realized next-day returns
    pub actual_returns: Vec<f64>,
    /// Signal x actual return
    pub strategy_returns: Vec<f64>,
    /// Buy-and-hold equity curve
    pub cumulative_market: Vec<f64>,
    /// Strategy equity curve
    pub cumulative_strategy: Vec<f64>,
    /// Summary statistics
    pub summary: BacktestSummary,
    /// Features the upstream model used
    pub features_used: Vec<String>,
    /// Configuration used
    #[serde(flatten)]
    pub config: BacktestConfig,
    /// Forecast for the day after the last date, when supplied
    #[serde(
        rename = "predicted_return",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_day_prediction: Option<f64>,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last trading date.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

/// Backtest engine
///
/// Stateless apart from its configuration: `run` is a pure function of its
/// input and may be called concurrently from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the backtest over one aligned input.
    ///
    /// Fails only when the series is empty.
    pub fn run(&self, input: &BacktestInput) -> Result<BacktestResult> {
        let series = &input.series;
        if series.is_empty() {
            return Err(BacktestError::EmptySeries);
        }

        let signals = signal::generate(series.predicted(), series.actual(), &self.config);
        let performance = PerformanceAggregator::aggregate(&signals, series.actual());
        let summary = BacktestSummary::from_performance(&performance);

        tracing::debug!(
            days = series.len(),
            threshold = self.config.threshold,
            holding_period = self.config.holding_period.get(),
            allow_short = self.config.allow_short,
            trades = summary.trades,
            strategy_return = summary.strategy_return,
            sharpe = summary.sharpe,
            "Backtest completed"
        );

        Ok(BacktestResult {
            dates: series.dates().to_vec(),
            predicted_returns: round_series(series.predicted()),
            actual_returns: round_series(series.actual()),
            strategy_returns: round_series(&signals.strategy_returns),
            cumulative_market: round_series(&performance.cumulative_market),
            cumulative_strategy: round_series(&performance.cumulative_strategy),
            signals: signals.signals,
            summary,
            features_used: input.features_used.clone(),
            config: self.config,
            next_day_prediction: input
                .next_day_prediction
                .map(|p| round_to(sanitize(p), SERIES_DECIMALS)),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
