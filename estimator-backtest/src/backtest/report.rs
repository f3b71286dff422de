//! Backtest report generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::engine::BacktestResult;
use super::metrics::BacktestSummary;

/// Number of trailing equity points included in a report.
pub const RECENT_POINTS: usize = 30;

/// Response envelope for command output.
///
/// Serializes as `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One trailing equity point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub market: f64,
    pub strategy: f64,
}

/// Strategy parameters section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub threshold: f64,
    pub holding_period: usize,
    pub allow_short: bool,
    pub features_used: Vec<String>,
}

/// Backtest report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Report title
    pub title: String,
    /// Test period
    pub period: String,
    /// Summary statistics
    pub summary: BacktestSummary,
    /// Strategy parameters
    pub params: StrategyParams,
    /// Trailing equity points, oldest first
    pub recent: Vec<EquityPoint>,
    /// Next-day forecast if one was supplied
    pub next_day_prediction: Option<f64>,
    /// Text report (formatted)
    pub text_report: String,
}

impl BacktestReport {
    /// Generate a report from a backtest result
    pub fn generate(label: &str, result: &BacktestResult) -> Self {
        let period = match result.period() {
            Some((start, end)) => format!("{} to {}", start, end),
            None => "n/a".to_string(),
        };

        let params = StrategyParams {
            threshold: result.config.threshold,
            holding_period: result.config.holding_period.get(),
            allow_short: result.config.allow_short,
            features_used: result.features_used.clone(),
        };

        let skip = result.len().saturating_sub(RECENT_POINTS);
        let recent: Vec<EquityPoint> = result
            .dates
            .iter()
            .zip(&result.cumulative_market)
            .zip(&result.cumulative_strategy)
            .skip(skip)
            .map(|((date, market), strategy)| EquityPoint {
                date: *date,
                market: *market,
                strategy: *strategy,
            })
            .collect();

        let title = if label.is_empty() {
            "Strategy Backtest Report".to_string()
        } else {
            format!("{} Strategy Backtest Report", label)
        };

        let text_report = Self::format_text_report(
            &title,
            &period,
            &result.summary,
            &params,
            &recent,
            result.next_day_prediction,
        );

        Self {
            title,
            period,
            summary: result.summary,
            params,
            recent,
            next_day_prediction: result.next_day_prediction,
            text_report,
        }
    }

    /// Format as text report
    fn format_text_report(
        title: &str,
        period: &str,
        summary: &BacktestSummary,
        params: &StrategyParams,
        recent: &[EquityPoint],
        next_day_prediction: Option<f64>,
    ) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str(&format!("  {}\n", title));
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!("Period: {}\n\n", period));

        report.push_str("Returns\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        report.push_str(&format!("  Market return:     {:>12.2}%\n", summary.market_return));
        report.push_str(&format!("  Strategy return:   {:>12.2}%\n", summary.strategy_return));
        report.push_str(&format!("  Excess return:     {:>12.2}%\n\n", summary.excess_return()));

        report.push_str("Risk\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        report.push_str(&format!("  Sharpe ratio:      {:>12.2}\n", summary.sharpe));
        report.push_str(&format!("  Max drawdown:      {:>12.2}%\n", summary.max_drawdown));
        report.push_str(&format!("  Position days:     {:>12}\n", summary.trades));
        report.push_str(&format!("  Win rate:          {:>12.2}%\n\n", summary.win_rate));

        report.push_str("Parameters\n");
        report.push_str("───────────────────────────────────────────────────────────────\n");
        report.push_str(&format!("  Threshold:         {:>12}\n", params.threshold));
        report.push_str(&format!("  Holding period:    {:>12}\n", params.holding_period));
        report.push_str(&format!(
            "  Short selling:     {:>12}\n",
            if params.allow_short { "enabled" } else { "disabled" }
        ));
        report.push_str(&format!("  Features:          {}\n", params.features_used.join(", ")));
        if let Some(prediction) = next_day_prediction {
            report.push_str(&format!("  Next-day forecast: {:>12.4}\n", prediction));
        }
        report.push('\n');

        if !recent.is_empty() {
            report.push_str(&format!("Recent equity (last {} days)\n", recent.len()));
            report.push_str("───────────────────────────────────────────────────────────────\n");
            report.push_str("  Date              Market      Strategy\n");
            for point in recent {
                report.push_str(&format!(
                    "  {}  {:>10.4}  {:>12.4}\n",
                    point.date, point.market, point.strategy
                ));
            }
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");

        report
    }

    /// One-line summary for logs and batch listings
    pub fn to_summary_line(&self) -> String {
        format!(
            "{} | {} | strategy {:.2}% vs market {:.2}% | sharpe {:.2} | days {} | win {:.2}% | mdd {:.2}%",
            self.title,
            self.period,
            self.summary.strategy_return,
            self.summary.market_return,
            self.summary.sharpe,
            self.summary.trades,
            self.summary.win_rate,
            self.summary.max_drawdown
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
