//! Estimator Backtest Library
//!
//! Deterministic backtesting of predicted-return trading signals. A model
//! upstream produces a predicted next-day return for every trading date; this
//! crate turns those predictions into holding-period positions, realizes them
//! against the actual next-day returns, and summarizes the performance.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     estimator-backtest                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐     │
//! │  │  Input Loader   │─▶│  Signal         │─▶│  Performance    │     │
//! │  │  (JSON / CSV)   │  │  Generator      │  │  Aggregator     │     │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘     │
//! │           │                                         │              │
//! │           ▼                                         ▼              │
//! │  ┌─────────────────┐                      ┌─────────────────┐      │
//! │  │  Batch Runner   │─────────────────────▶│  Sanitizer /    │      │
//! │  │  (rayon)        │                      │  Report         │      │
//! │  └─────────────────┘                      └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Holding period
//! - An entry opens a block of `holding_period` days
//! - Predictions inside a block are ignored, so blocks never overlap
//! - A block running past the last date is truncated
//!
//! ## Sanitized output
//! - No NaN or Infinity reaches the result; undefined statistics become `0.0`
//! - Statistics are rounded to two decimals, series to four

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod backtest;
pub mod batch;
pub mod data;
pub mod error;
pub mod features;

pub use backtest::{
    BacktestConfig, BacktestEngine, BacktestReport, BacktestResult, BacktestSummary, Envelope,
    Position,
};
pub use batch::{BacktestRequest, BatchOutcome, BatchRunner};
pub use data::{AlignedSeries, BacktestInput, InputDocument, InputFormat, InputLoader};
pub use error::{BacktestError, Result};
pub use features::{resolve_features, FEATURE_CATALOG};
