//! Backtest performance metrics.
//!
//! [`PerformanceAggregator`] derives raw statistics from a signal series.
//! Raw values may be NaN or infinite (for example a Sharpe ratio over zero
//! variance); [`BacktestSummary`] is the sanitized, rounded form that leaves
//! the engine.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::sanitize::round_stat;
use super::signal::{Position, SignalSeries};

/// Raw performance figures for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    /// Buy-and-hold equity curve
    pub cumulative_market: Vec<f64>,
    /// Strategy equity curve
    pub cumulative_strategy: Vec<f64>,
    /// Buy-and-hold total return (percentage)
    pub market_return_pct: f64,
    /// Strategy total return (percentage)
    pub strategy_return_pct: f64,
    /// Mean over sample standard deviation of strategy returns, unannualized
    pub sharpe: f64,
    /// Days with an open position
    pub trades: usize,
    /// Share of position-days with a positive return (percentage)
    pub win_rate: f64,
    /// Largest peak-to-trough drop of the strategy curve, equity units x 100
    pub max_drawdown: f64,
}

/// Relative deviation below which a return series is treated as constant.
pub const STD_DEV_NOISE: f64 = 1e-12;

/// Computes [`Performance`] from generator output.
pub struct PerformanceAggregator;

impl PerformanceAggregator {
    /// Aggregate a signal series against the actual returns it was built from.
    pub fn aggregate(series: &SignalSeries, actual: &[f64]) -> Performance {
        let cumulative_market = Self::equity_curve(actual);
        let cumulative_strategy = Self::equity_curve(&series.strategy_returns);
        let trades = Self::trade_count(&series.signals);

        Performance {
            market_return_pct: Self::total_return_pct(&cumulative_market),
            strategy_return_pct: Self::total_return_pct(&cumulative_strategy),
            sharpe: Self::sharpe_ratio(&series.strategy_returns),
            trades,
            win_rate: Self::win_rate(&series.signals, &series.strategy_returns),
            max_drawdown: Self::max_drawdown(&cumulative_strategy),
            cumulative_market,
            cumulative_strategy,
        }
    }

    /// Running product of `1 + r`, starting from a base of 1.0.
    ///
    /// No floor is applied; losses beyond 100% drive the curve negative.
    pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
        returns
            .iter()
            .scan(1.0_f64, |equity, r| {
                *equity *= 1.0 + r;
                Some(*equity)
            })
            .collect()
    }

    /// `(last - 1) x 100`; NaN for an empty curve.
    pub fn total_return_pct(curve: &[f64]) -> f64 {
        curve.last().map_or(f64::NAN, |last| (last - 1.0) * 100.0)
    }

    /// Mean over sample (n - 1) standard deviation.
    ///
    /// NaN when the deviation is undefined or zero. A deviation within
    /// [`STD_DEV_NOISE`] of the mean's magnitude is rounding residue from a
    /// constant series and counts as zero.
    pub fn sharpe_ratio(returns: &[f64]) -> f64 {
        let mean = returns.mean();
        let std_dev = returns.std_dev();
        if std_dev.is_nan() || std_dev <= mean.abs() * STD_DEV_NOISE {
            return f64::NAN;
        }
        mean / std_dev
    }

    /// Days with a nonzero signal. A block of `h` held days counts `h` times.
    pub fn trade_count(signals: &[Position]) -> usize {
        signals.iter().filter(|s| s.is_open()).count()
    }

    /// Winning position-days over position-days, as a percentage.
    pub fn win_rate(signals: &[Position], strategy_returns: &[f64]) -> f64 {
        let trades = Self::trade_count(signals);
        if trades == 0 {
            return 0.0;
        }

        let wins = signals
            .iter()
            .zip(strategy_returns)
            .filter(|&(s, &r)| s.is_open() && r > 0.0)
            .count();

        (wins as f64 / trades as f64) * 100.0
    }

    /// `max(running_max(curve) - curve) x 100`, never negative.
    pub fn max_drawdown(curve: &[f64]) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut max_dd = 0.0_f64;

        for &value in curve {
            if value > peak {
                peak = value;
            }
            let dd = peak - value;
            if dd > max_dd {
                max_dd = dd;
            }
        }

        max_dd * 100.0
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Summary statistics as returned to callers.
///
/// Every float is sanitized and rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Buy-and-hold total return (percentage)
    pub market_return: f64,
    /// Strategy total return (percentage)
    pub strategy_return: f64,
    /// Unannualized Sharpe ratio
    pub sharpe: f64,
    /// Days with an open position
    pub trades: usize,
    /// Winning position-days (percentage)
    pub win_rate: f64,
    /// Max drawdown (equity units x 100)
    pub max_drawdown: f64,
}

impl BacktestSummary {
    pub fn from_performance(performance: &Performance) -> Self {
        Self {
            market_return: round_stat(performance.market_return_pct),
            strategy_return: round_stat(performance.strategy_return_pct),
            sharpe: round_stat(performance.sharpe),
            trades: performance.trades,
            win_rate: round_stat(performance.win_rate),
            max_drawdown: round_stat(performance.max_drawdown),
        }
    }

    /// Strategy return minus market return (percentage points).
    pub fn excess_return(&self) -> f64 {
        round_stat(self.strategy_return - self.market_return)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn series(signals: &[i8], strategy_returns: &[f64]) -> SignalSeries {
        SignalSeries {
            signals: signals
                .iter()
                .map(|&s| Position::try_from(s).unwrap())
                .collect(),
            strategy_returns: strategy_returns.to_vec(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_equity_curve() {
        let curve = PerformanceAggregator::equity_curve(&[0.02, 0.0, 0.03]);
        assert!(approx(curve[0], 1.02));
        assert!(approx(curve[1], 1.02));
        assert!(approx(curve[2], 1.0506));
    }

    #[test]
    fn test_equity_curve_goes_negative() {
        let curve = PerformanceAggregator::equity_curve(&[-1.5, 0.1]);
        assert!(approx(curve[0], -0.5));
        assert!(approx(curve[1], -0.55));
    }

    #[test]
    fn test_total_return_pct() {
        assert!(approx(PerformanceAggregator::total_return_pct(&[1.02, 1.0506]), 5.06));
        assert!(PerformanceAggregator::total_return_pct(&[]).is_nan());
    }

    #[test]
    fn test_sharpe_uses_sample_std() {
        // mean = 0.02, sample std = 0.01
        let sharpe = PerformanceAggregator::sharpe_ratio(&[0.01, 0.02, 0.03]);
        assert!(approx(sharpe, 2.0));
    }

    #[test]
    fn test_sharpe_degenerate_inputs() {
        assert!(!PerformanceAggregator::sharpe_ratio(&[0.0, 0.0, 0.0]).is_finite());
        assert!(!PerformanceAggregator::sharpe_ratio(&[0.01]).is_finite());
        assert!(!PerformanceAggregator::sharpe_ratio(&[]).is_finite());
    }

    #[test]
    fn test_sharpe_constant_nonzero_returns_is_undefined() {
        for (n, r) in [(10, 0.1), (16, 0.002), (7, -0.03)] {
            let sharpe = PerformanceAggregator::sharpe_ratio(&vec![r; n]);
            assert!(sharpe.is_nan(), "n={n} r={r} sharpe={sharpe}");
        }
    }

    #[test]
    fn test_summary_zeroes_sharpe_for_constant_returns() {
        let s = series(&[1; 10], &[0.1; 10]);
        let perf = PerformanceAggregator::aggregate(&s, &[0.1; 10]);
        assert_eq!(BacktestSummary::from_performance(&perf).sharpe, 0.0);
    }

    #[test]
    fn test_trade_count_counts_days() {
        let signals = series(&[1, 1, 1, 0, -1], &[0.0; 5]).signals;
        assert_eq!(PerformanceAggregator::trade_count(&signals), 4);
    }

    #[test]
    fn test_win_rate() {
        let s = series(&[1, 0, 1, -1], &[0.02, 0.0, -0.01, 0.01]);
        let rate = PerformanceAggregator::win_rate(&s.signals, &s.strategy_returns);
        assert!(approx(rate, 200.0 / 3.0));
    }

    #[test]
    fn test_win_rate_ignores_flat_days_and_zero_returns() {
        let s = series(&[0, 1, 1], &[0.0, 0.0, 0.01]);
        let rate = PerformanceAggregator::win_rate(&s.signals, &s.strategy_returns);
        assert!(approx(rate, 50.0));
    }

    #[test]
    fn test_win_rate_no_trades() {
        let s = series(&[0, 0], &[0.0, 0.0]);
        assert_eq!(PerformanceAggregator::win_rate(&s.signals, &s.strategy_returns), 0.0);
    }

    #[test]
    fn test_max_drawdown_absolute_units() {
        // peak 1.2, trough 0.9 => 0.3 equity units
        let dd = PerformanceAggregator::max_drawdown(&[1.0, 1.2, 0.9, 1.1]);
        assert!(approx(dd, 30.0));
    }

    #[test]
    fn test_max_drawdown_monotonic_curve() {
        assert_eq!(PerformanceAggregator::max_drawdown(&[1.0, 1.01, 1.05]), 0.0);
        assert_eq!(PerformanceAggregator::max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_aggregate_and_summary() {
        let s = series(&[1, 0, 1], &[0.02, 0.0, 0.03]);
        let perf = PerformanceAggregator::aggregate(&s, &[0.02, -0.01, 0.03]);

        assert_eq!(perf.trades, 2);
        assert!(approx(perf.win_rate, 100.0));
        assert!(approx(perf.strategy_return_pct, 5.06));
        assert!(approx(perf.market_return_pct, (1.02 * 0.99 * 1.03 - 1.0) * 100.0));
        assert_eq!(perf.max_drawdown, 0.0);

        let summary = BacktestSummary::from_performance(&perf);
        assert_eq!(summary.strategy_return, 5.06);
        assert_eq!(summary.market_return, 4.01);
        assert_eq!(summary.trades, 2);
        assert_eq!(summary.win_rate, 100.0);
        assert_eq!(summary.excess_return(), 1.05);
    }

    #[test]
    fn test_summary_sanitizes_sharpe() {
        let s = series(&[0, 0, 0], &[0.0, 0.0, 0.0]);
        let perf = PerformanceAggregator::aggregate(&s, &[0.01, 0.02, -0.01]);
        let summary = BacktestSummary::from_performance(&perf);
        assert_eq!(summary.sharpe, 0.0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.trades, 0);
    }
}
