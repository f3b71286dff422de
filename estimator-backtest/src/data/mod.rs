//! Input series for the backtest engine.
//!
//! The engine never sees prices or a model. It receives two index-aligned
//! return series produced upstream (predicted next-day return and realized
//! next-day return) keyed by trading date. [`AlignedSeries::new`] is the
//! boundary that enforces the engine's preconditions:
//!
//! - all three vectors have the same length
//! - dates are strictly increasing (therefore unique)
//! - every return is finite

mod loader;

pub use loader::{InputFormat, InputLoader};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};
use crate::features::resolve_features;

/// Date format used on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a trading date.
///
/// Accepts `YYYY-MM-DD` or any longer timestamp that starts with it
/// (`2024-01-02T00:00:00Z`, `2024-01-02 00:00:00`); only the date part is kept.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| BacktestError::InvalidDate(format!("{raw:?}: {e}")))
}

// ============================================================================
// Aligned Series
// ============================================================================

/// Index-aligned predicted and actual next-day returns.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    dates: Vec<NaiveDate>,
    predicted: Vec<f64>,
    actual: Vec<f64>,
}

impl AlignedSeries {
    /// Build a series, checking length, ordering and finiteness.
    pub fn new(dates: Vec<NaiveDate>, predicted: Vec<f64>, actual: Vec<f64>) -> Result<Self> {
        if dates.len() != predicted.len() || dates.len() != actual.len() {
            return Err(BacktestError::LengthMismatch {
                dates: dates.len(),
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }

        if let Some(index) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(BacktestError::UnorderedDates { index: index + 1 });
        }

        check_finite("predicted_returns", &predicted)?;
        check_finite("actual_returns", &actual)?;

        Ok(Self {
            dates,
            predicted,
            actual,
        })
    }

    /// Build a series from date strings.
    pub fn from_raw_dates(dates: &[String], predicted: Vec<f64>, actual: Vec<f64>) -> Result<Self> {
        let dates = dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>>>()?;
        Self::new(dates, predicted, actual)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    pub fn actual(&self) -> &[f64] {
        &self.actual
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last trading date, if any.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

fn check_finite(series: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(BacktestError::NonFinite { series, index }),
        None => Ok(()),
    }
}

// ============================================================================
// Backtest Input
// ============================================================================

/// Everything the engine needs for one run, apart from the strategy config.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestInput {
    /// Aligned return series
    pub series: AlignedSeries,
    /// Feature names the upstream model was fitted on (echoed in the result)
    pub features_used: Vec<String>,
    /// Model prediction for the day after the last date (echoed in the result)
    pub next_day_prediction: Option<f64>,
}

impl BacktestInput {
    pub fn new(series: AlignedSeries) -> Self {
        Self {
            series,
            features_used: Vec::new(),
            next_day_prediction: None,
        }
    }

    /// Attach the upstream feature list, resolved against the catalogue.
    pub fn with_features<S: AsRef<str>>(mut self, requested: &[S]) -> Self {
        self.features_used = resolve_features(requested);
        self
    }

    /// Attach the next-day prediction. Non-finite values are rejected.
    pub fn with_next_day_prediction(mut self, prediction: f64) -> Result<Self> {
        if !prediction.is_finite() {
            return Err(BacktestError::NonFinite {
                series: "next_day_prediction",
                index: 0,
            });
        }
        self.next_day_prediction = Some(prediction);
        Ok(self)
    }
}

/// Serialized form of [`BacktestInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputDocument {
    pub dates: Vec<String>,
    pub predicted_returns: Vec<f64>,
    pub actual_returns: Vec<f64>,
    #[serde(default)]
    pub features_used: Vec<String>,
    #[serde(default, alias = "predicted_return", skip_serializing_if = "Option::is_none")]
    pub next_day_prediction: Option<f64>,
}

impl TryFrom<InputDocument> for BacktestInput {
    type Error = BacktestError;

    fn try_from(doc: InputDocument) -> Result<Self> {
        let series =
            AlignedSeries::from_raw_dates(&doc.dates, doc.predicted_returns, doc.actual_returns)?;
        let input = BacktestInput::new(series).with_features(&doc.features_used);

        match doc.next_day_prediction {
            Some(p) => input.with_next_day_prediction(p),
            None => Ok(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_CATALOG;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date("2024-01-02").unwrap(), date(2024, 1, 2));
        assert_eq!(parse_date("2024-01-02T00:00:00.000Z").unwrap(), date(2024, 1, 2));
        assert_eq!(parse_date(" 2024-01-02 09:30:00 ").unwrap(), date(2024, 1, 2));
        assert!(matches!(parse_date("01/02/2024"), Err(BacktestError::InvalidDate(_))));
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_aligned_series_valid() {
        let series = AlignedSeries::new(
            vec![date(2024, 1, 2), date(2024, 1, 3)],
            vec![0.01, -0.02],
            vec![0.005, 0.01],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.period(), Some((date(2024, 1, 2), date(2024, 1, 3))));
    }

    #[test]
    fn test_aligned_series_length_mismatch() {
        let err = AlignedSeries::new(vec![date(2024, 1, 2)], vec![0.01, 0.02], vec![0.0])
            .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::LengthMismatch {
                dates: 1,
                predicted: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_aligned_series_duplicate_dates() {
        let err = AlignedSeries::new(
            vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 3)],
            vec![0.0; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::UnorderedDates { index: 2 }));
    }

    #[test]
    fn test_aligned_series_non_finite() {
        let err = AlignedSeries::new(
            vec![date(2024, 1, 2), date(2024, 1, 3)],
            vec![0.01, 0.02],
            vec![0.0, f64::NAN],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BacktestError::NonFinite {
                series: "actual_returns",
                index: 1
            }
        ));
    }

    #[test]
    fn test_empty_series_allowed_at_boundary() {
        let series = AlignedSeries::new(vec![], vec![], vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.period(), None);
    }

    #[test]
    fn test_document_conversion() {
        let doc = InputDocument {
            dates: vec!["2024-01-02".into(), "2024-01-03".into()],
            predicted_returns: vec![0.01, -0.01],
            actual_returns: vec![0.02, -0.01],
            features_used: vec!["MA_10".into(), "bogus".into()],
            next_day_prediction: Some(0.0012),
        };

        let input = BacktestInput::try_from(doc).unwrap();
        assert_eq!(input.series.len(), 2);
        assert_eq!(input.features_used, vec!["MA_10".to_string()]);
        assert_eq!(input.next_day_prediction, Some(0.0012));
    }

    #[test]
    fn test_document_without_features_uses_catalog() {
        let doc: InputDocument = serde_json::from_str(
            r#"{"dates": ["2024-01-02"], "predicted_returns": [0.0], "actual_returns": [0.0], "predicted_return": 0.5}"#,
        )
        .unwrap();
        let input = BacktestInput::try_from(doc).unwrap();
        assert_eq!(input.features_used.len(), FEATURE_CATALOG.len());
        assert_eq!(input.next_day_prediction, Some(0.5));
    }

    #[test]
    fn test_non_finite_next_day_prediction_rejected() {
        let series = AlignedSeries::new(vec![date(2024, 1, 2)], vec![0.0], vec![0.0]).unwrap();
        let err = BacktestInput::new(series)
            .with_next_day_prediction(f64::INFINITY)
            .unwrap_err();
        assert!(matches!(err, BacktestError::NonFinite { .. }));
    }
}
