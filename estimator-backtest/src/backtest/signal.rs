//! Holding-period signal generator.
//!
//! A two-state machine. While `Scanning`, each day's prediction is compared
//! against the entry rule; an entry opens a block of `holding_period` days
//! during which the machine is `Holding` and predictions are ignored. A
//! block that runs past the end of the series is truncated.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use super::engine::BacktestConfig;

// ============================================================================
// Position
// ============================================================================

/// Directional exposure for one day, serialized as `-1`, `0` or `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

impl Position {
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
        }
    }

    /// Whether capital is exposed on this day.
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Flat)
    }

    /// Return realized by holding this position over a day with `actual` return.
    pub fn apply(self, actual: f64) -> f64 {
        match self {
            Self::Long => actual,
            Self::Short => -actual,
            Self::Flat => 0.0,
        }
    }
}

impl From<Position> for i8 {
    fn from(position: Position) -> Self {
        position.as_i8()
    }
}

impl TryFrom<i8> for Position {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Short),
            0 => Ok(Self::Flat),
            1 => Ok(Self::Long),
            other => Err(format!("signal must be -1, 0 or 1, got {other}")),
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Generator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    /// No open position; the next day's prediction is evaluated.
    Scanning,
    /// A block is open; `remaining` more days carry `position`.
    Holding { position: Position, remaining: usize },
}

/// Day-by-day signal generator.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    threshold: f64,
    holding_period: NonZeroUsize,
    allow_short: bool,
    state: SignalState,
}

impl SignalGenerator {
    pub fn new(config: &BacktestConfig) -> Self {
        Self {
            threshold: config.threshold,
            holding_period: config.holding_period,
            allow_short: config.allow_short,
            state: SignalState::Scanning,
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Advance one day and return the position held on it.
    pub fn step(&mut self, predicted: f64) -> Position {
        match self.state {
            SignalState::Holding {
                position,
                remaining,
            } => {
                self.state = if remaining > 1 {
                    SignalState::Holding {
                        position,
                        remaining: remaining - 1,
                    }
                } else {
                    SignalState::Scanning
                };
                position
            }
            SignalState::Scanning => {
                let position = self.entry_for(predicted);
                let remaining = self.holding_period.get() - 1;
                if position.is_open() && remaining > 0 {
                    self.state = SignalState::Holding {
                        position,
                        remaining,
                    };
                }
                position
            }
        }
    }

    /// Entry rule evaluated while scanning.
    fn entry_for(&self, predicted: f64) -> Position {
        if predicted > self.threshold {
            Position::Long
        } else if self.allow_short && predicted < -self.threshold {
            Position::Short
        } else {
            Position::Flat
        }
    }
}

// ============================================================================
// Series Generation
// ============================================================================

/// Per-day positions and the strategy returns they realize.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub signals: Vec<Position>,
    pub strategy_returns: Vec<f64>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Run the generator over aligned predicted and actual returns.
///
/// Callers guarantee `predicted.len() == actual.len()`.
pub fn generate(predicted: &[f64], actual: &[f64], config: &BacktestConfig) -> SignalSeries {
    debug_assert_eq!(predicted.len(), actual.len());

    let mut generator = SignalGenerator::new(config);
    let mut signals = Vec::with_capacity(predicted.len());
    let mut strategy_returns = Vec::with_capacity(predicted.len());

    for (&p, &a) in predicted.iter().zip(actual) {
        let position = generator.step(p);
        signals.push(position);
        strategy_returns.push(position.apply(a));
    }

    SignalSeries {
        signals,
        strategy_returns,
    }
}
