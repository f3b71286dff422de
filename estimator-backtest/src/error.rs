//! Backtest error types

use thiserror::Error;

/// Backtest result type alias
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Backtest errors
///
/// The engine itself only ever raises [`BacktestError::EmptySeries`]; every
/// other variant comes from building or loading the input series.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("No data available for the requested range; choose a wider date range")]
    EmptySeries,

    #[error(
        "Series length mismatch: {dates} dates, {predicted} predicted returns, {actual} actual returns"
    )]
    LengthMismatch {
        dates: usize,
        predicted: usize,
        actual: usize,
    },

    #[error("Non-finite value in {series} at index {index}")]
    NonFinite { series: &'static str, index: usize },

    #[error("Dates must be strictly increasing and unique (violated at index {index})")]
    UnorderedDates { index: usize },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl BacktestError {
    /// Whether the caller can fix this by changing their input or config.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::ThreadPool(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series_message() {
        let msg = BacktestError::EmptySeries.to_string();
        assert!(msg.contains("wider date range"));
        assert!(BacktestError::EmptySeries.is_user_correctable());
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = BacktestError::LengthMismatch {
            dates: 3,
            predicted: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Series length mismatch: 3 dates, 3 predicted returns, 2 actual returns"
        );
    }

    #[test]
    fn test_io_not_user_correctable() {
        let err: BacktestError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(!err.is_user_correctable());
    }
}
