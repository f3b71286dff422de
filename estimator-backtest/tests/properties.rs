//! Property tests for the backtest engine.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::num::NonZeroUsize;

use estimator_backtest::{AlignedSeries, BacktestConfig, BacktestEngine, BacktestInput, Position};

fn build_input(days: &[(f64, f64)]) -> BacktestInput {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..days.len() as u64)
        .map(|i| start + chrono::Days::new(i))
        .collect();
    let predicted = days.iter().map(|d| d.0).collect();
    let actual = days.iter().map(|d| d.1).collect();
    BacktestInput::new(AlignedSeries::new(dates, predicted, actual).unwrap())
}

fn days_strategy(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-0.05f64..0.05, -0.08f64..0.08), 1..max_len)
}

fn config_strategy() -> impl Strategy<Value = BacktestConfig> {
    (0.0f64..0.03, 1usize..8, any::<bool>()).prop_map(|(threshold, h, allow_short)| {
        BacktestConfig::new(threshold, NonZeroUsize::new(h).unwrap(), allow_short)
    })
}

proptest! {
    #[test]
    fn degenerate_config_follows_sign_of_prediction(days in days_strategy(80)) {
        let result = BacktestEngine::default().run(&build_input(&days)).unwrap();

        for (signal, (predicted, _)) in result.signals.iter().zip(&days) {
            let expected = if *predicted > 0.0 { Position::Long } else { Position::Flat };
            prop_assert_eq!(*signal, expected);
        }
    }

    #[test]
    fn blocks_hold_their_entry_position(days in days_strategy(80), config in config_strategy()) {
        let result = BacktestEngine::new(config).run(&build_input(&days)).unwrap();
        let h = config.holding_period.get();
        let n = result.signals.len();

        let mut i = 0;
        while i < n {
            let predicted = days[i].0;
            let entry = if predicted > config.threshold {
                Position::Long
            } else if config.allow_short && predicted < -config.threshold {
                Position::Short
            } else {
                Position::Flat
            };
            prop_assert_eq!(result.signals[i], entry);

            if entry.is_open() {
                let end = (i + h).min(n);
                for j in i..end {
                    prop_assert_eq!(result.signals[j], entry);
                }
                i = end;
            } else {
                i += 1;
            }
        }
    }

    #[test]
    fn trades_match_open_days(days in days_strategy(80), config in config_strategy()) {
        let result = BacktestEngine::new(config).run(&build_input(&days)).unwrap();
        let open_days = result.signals.iter().filter(|s| s.is_open()).count();
        prop_assert_eq!(result.summary.trades, open_days);
    }

    #[test]
    fn outputs_are_bounded_and_finite(
        days in prop::collection::vec((-2.0f64..2.0, -2.0f64..2.0), 1..60),
        config in config_strategy(),
    ) {
        let result = BacktestEngine::new(config).run(&build_input(&days)).unwrap();
        let summary = result.summary;

        prop_assert!((0.0..=100.0).contains(&summary.win_rate));
        prop_assert!(summary.max_drawdown >= 0.0);

        for value in [
            summary.market_return,
            summary.strategy_return,
            summary.sharpe,
            summary.win_rate,
            summary.max_drawdown,
        ] {
            prop_assert!(value.is_finite());
        }
        for series in [
            &result.strategy_returns,
            &result.cumulative_market,
            &result.cumulative_strategy,
        ] {
            prop_assert_eq!(series.len(), days.len());
            prop_assert!(series.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn repeated_runs_are_identical(days in days_strategy(60), config in config_strategy()) {
        let engine = BacktestEngine::new(config);
        let input = build_input(&days);

        let first = serde_json::to_string(&engine.run(&input).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.run(&input).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn zero_strategy_returns_give_zero_sharpe(
        actual in prop::collection::vec(-0.05f64..0.05, 1..40),
        config in config_strategy(),
    ) {
        // Predictions that never clear the threshold keep every day flat.
        let days: Vec<_> = actual.iter().map(|&a| (0.0, a)).collect();
        let result = BacktestEngine::new(config).run(&build_input(&days)).unwrap();

        prop_assert!(result.strategy_returns.iter().all(|&r| r == 0.0));
        prop_assert_eq!(result.summary.sharpe, 0.0);
        prop_assert_eq!(result.summary.trades, 0);
    }

    #[test]
    fn constant_strategy_returns_give_zero_sharpe(
        a in (-0.2f64..0.2).prop_filter("nonzero", |a| a.abs() > 1e-6),
        n in 2usize..64,
        config in config_strategy(),
    ) {
        // Every prediction clears the threshold, so every day is long.
        let days = vec![(0.05, a); n];
        let result = BacktestEngine::new(config).run(&build_input(&days)).unwrap();

        prop_assert!(result.signals.iter().all(|s| *s == Position::Long));
        prop_assert_eq!(result.summary.sharpe, 0.0);
        prop_assert_eq!(result.summary.trades, n);
    }
}
