//! Strategy backtesting module.
//!
//! Converts a predicted-return series into holding-period positions and
//! derives performance statistics. Leaf-first:
//!
//! - `sanitize`: NaN/Infinity normalization and rounding
//! - `signal`: `Scanning`/`Holding` state machine
//! - `metrics`: equity curves and summary statistics
//! - `engine`: orchestration into an immutable [`BacktestResult`]
//! - `report`: text reports and output envelopes

mod engine;
mod metrics;
mod report;
pub mod sanitize;
mod signal;

pub use engine::{BacktestConfig, BacktestEngine, BacktestResult};
pub use metrics::{BacktestSummary, Performance, PerformanceAggregator};
pub use report::{BacktestReport, Envelope, EquityPoint, StrategyParams, RECENT_POINTS};
pub use signal::{generate, Position, SignalGenerator, SignalSeries, SignalState};
