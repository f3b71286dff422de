//! Estimator Backtest CLI
//!
//! Runs the backtest engine over prediction files and prints the result as
//! a JSON envelope (default) or a text report. Logs go to stderr so stdout
//! carries only the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use estimator_backtest::{
    BacktestConfig, BacktestEngine, BacktestError, BacktestInput, BacktestReport, BacktestRequest,
    BatchOutcome, BatchRunner, Envelope, InputFormat, InputLoader, FEATURE_CATALOG,
};
use estimator_common::config::{expand_path, BacktestDefaults, Config};
use estimator_common::logging::init_logging;
use estimator_common::ValidationError;

/// Backtest predicted-return trading signals.
#[derive(Parser, Debug)]
#[command(name = "estimator-backtest")]
#[command(version)]
#[command(about = "Backtest a holding-period strategy over predicted returns.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.estimator/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Backtest a single input file
    Run {
        /// Input file (.json or .csv)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Backtest several input files in parallel
    Batch {
        /// Input files (.json or .csv)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Worker thread cap (overrides batch.max_threads)
        #[arg(long)]
        threads: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// List the feature catalogue
    Features,
}

/// Strategy flags shared by `run` and `batch`. Unset flags fall back to config.
#[derive(Args, Debug, Clone, Default)]
struct StrategyArgs {
    /// Minimum predicted return to open a position
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Days a position is held once opened
    #[arg(long)]
    holding_period: Option<usize>,

    /// Allow short positions (`--allow-short=false` turns a configured `true` off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    allow_short: Option<bool>,

    /// Features the upstream model used (comma separated)
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,
}

impl StrategyArgs {
    fn apply(&self, defaults: &mut BacktestDefaults) {
        if let Some(threshold) = self.threshold {
            defaults.threshold = threshold;
        }
        if let Some(holding_period) = self.holding_period {
            defaults.holding_period = holding_period;
        }
        if let Some(allow_short) = self.allow_short {
            defaults.allow_short = allow_short;
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            let _ = print_json(&Envelope::<()>::error(format!("{e:#}")));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| expand_path(&p.to_string_lossy()));
    let config = Config::load_and_validate(config_path.as_deref(), |config| {
        if let Some(level) = &cli.log_level {
            config.observability.log_level = level.clone();
        }
        if let Commands::Run { strategy, .. } | Commands::Batch { strategy, .. } = &cli.command {
            strategy.apply(&mut config.backtest);
        }
        if let Commands::Batch {
            threads: Some(n), ..
        } = &cli.command
        {
            config.batch.max_threads = Some(*n);
        }
    })?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    match cli.command {
        Commands::Run {
            input,
            strategy,
            format,
        } => run_single(&config, &input, &strategy, format),
        Commands::Batch {
            input,
            strategy,
            format,
            ..
        } => run_batch(&config, &input, &strategy, format),
        Commands::Features => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for name in FEATURE_CATALOG {
                writeln!(out, "{name}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_single(
    config: &Config,
    path: &Path,
    strategy: &StrategyArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let backtest_config = BacktestConfig::try_from(&config.backtest)?;
    let input = load_input(path, strategy, config)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let result = BacktestEngine::new(backtest_config).run(&input)?;
    let report = BacktestReport::generate(&label_for(path), &result);

    info!(
        days = result.len(),
        strategy_return = result.summary.strategy_return,
        market_return = result.summary.market_return,
        sharpe = result.summary.sharpe,
        trades = result.summary.trades,
        "{}",
        report.to_summary_line()
    );

    match format {
        OutputFormat::Json => print_json(&Envelope::success(&result))?,
        OutputFormat::Text => print!("{}", report.text_report),
    }

    Ok(ExitCode::SUCCESS)
}

fn run_batch(
    config: &Config,
    paths: &[PathBuf],
    strategy: &StrategyArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let backtest_config = BacktestConfig::try_from(&config.backtest)?;

    let mut requests = Vec::with_capacity(paths.len());
    let mut load_failures = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        let label = label_for(path);
        match load_input(path, strategy, config) {
            Ok(input) => requests.push((index, BacktestRequest::new(label, input, backtest_config))),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load input");
                load_failures.push((index, BatchOutcome::failed(label, e)));
            }
        }
    }

    let (indices, requests): (Vec<usize>, Vec<BacktestRequest>) = requests.into_iter().unzip();
    let runner = BatchRunner::new(config.batch.max_threads)?;
    let mut outcomes: Vec<_> = indices.into_iter().zip(runner.run_all(&requests)).collect();
    outcomes.extend(load_failures);
    outcomes.sort_by_key(|(index, _)| *index);

    let all_ok = outcomes.iter().all(|(_, o)| o.is_ok());

    match format {
        OutputFormat::Json => {
            let envelopes: Vec<_> = outcomes.iter().map(|(_, o)| o.envelope()).collect();
            print_json(&envelopes)?;
        }
        OutputFormat::Text => {
            for (_, outcome) in &outcomes {
                match &outcome.result {
                    Ok(result) => {
                        print!("{}", BacktestReport::generate(&outcome.label, result).text_report)
                    }
                    Err(e) => println!("{}: error: {}", outcome.label, e),
                }
            }
        }
    }

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Load one input file and apply feature overrides.
///
/// `--features` replaces whatever the file recorded. CSV files carry no
/// feature list, so `features.default` from config applies to them.
fn load_input(
    path: &Path,
    strategy: &StrategyArgs,
    config: &Config,
) -> Result<BacktestInput, BacktestError> {
    let input = InputLoader::load(path)?;

    if let Some(features) = &strategy.features {
        return Ok(input.with_features(features));
    }

    if InputFormat::from_path(path)? == InputFormat::Csv && !config.features.default.is_empty() {
        return Ok(input.with_features(&config.features.default));
    }

    Ok(input)
}

fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// 2 for errors the caller can fix, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<BacktestError>() {
        return if e.is_user_correctable() { 2 } else { 1 };
    }
    if let Some(e) = err.downcast_ref::<estimator_common::Error>() {
        return e.exit_code() as u8;
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return 2;
    }
    1
}
