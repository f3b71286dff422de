//! Input loading from JSON and CSV files.

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{AlignedSeries, BacktestInput, InputDocument};
use crate::error::{BacktestError, Result};

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// An [`InputDocument`] object
    Json,
    /// One row per date: `date,predicted_return,actual_return`
    Csv,
}

impl InputFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(BacktestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One CSV row. Column names from the upstream feature frame are accepted too.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Predicted_Return")]
    predicted_return: f64,
    #[serde(alias = "Return")]
    actual_return: f64,
}

/// Loader for backtest input files
pub struct InputLoader;

impl InputLoader {
    /// Load an input file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BacktestInput> {
        let path = path.as_ref();
        let format = InputFormat::from_path(path)?;
        let file = File::open(path)?;

        let input = match format {
            InputFormat::Json => Self::parse_json(file)?,
            InputFormat::Csv => Self::parse_csv(file)?,
        };

        tracing::debug!(
            path = %path.display(),
            rows = input.series.len(),
            features = input.features_used.len(),
            "Loaded backtest input"
        );

        Ok(input)
    }

    /// Parse an [`InputDocument`] from JSON.
    pub fn parse_json<R: Read>(reader: R) -> Result<BacktestInput> {
        let doc: InputDocument = serde_json::from_reader(reader)?;
        BacktestInput::try_from(doc)
    }

    /// Parse dated rows from CSV (extra columns are ignored).
    ///
    /// CSV carries no feature list, so the full catalogue is recorded.
    pub fn parse_csv<R: Read>(reader: R) -> Result<BacktestInput> {
        let mut reader = csv::Reader::from_reader(reader);

        let mut dates = Vec::new();
        let mut predicted = Vec::new();
        let mut actual = Vec::new();

        for row in reader.deserialize() {
            let row: CsvRow = row?;
            dates.push(row.date);
            predicted.push(row.predicted_return);
            actual.push(row.actual_return);
        }

        let series = AlignedSeries::from_raw_dates(&dates, predicted, actual)?;
        Ok(BacktestInput::new(series).with_features::<&str>(&[]))
    }
}
