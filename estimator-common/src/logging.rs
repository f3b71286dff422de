//! Logging setup.
//!
//! Everything is written to stderr; stdout is reserved for command output.
//! Targets in [`NOISY_MODULES`] and any configured exclusions are capped at
//! `warn`. `RUST_LOG`, when set, replaces the computed filter entirely.

use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Targets capped at `warn` regardless of the base level.
pub const NOISY_MODULES: &[&str] = &["rayon_core"];

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable, coloured
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// `"<level>,<target>=warn,..."` for the base level plus every capped target.
fn filter_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let capped = NOISY_MODULES
        .iter()
        .copied()
        .chain(excluded_targets.iter().map(String::as_str));

    std::iter::once(log_level.to_string())
        .chain(capped.map(|target| format!("{target}=warn")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Set up the global subscriber, capping `excluded_targets` at `warn`.
///
/// An unknown `log_format` falls back to pretty output. Only the first call
/// installs a subscriber; later calls are no-ops.
pub fn init_logging(log_level: &str, log_format: &str, excluded_targets: &[String]) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level, excluded_targets)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match log_format.parse::<LogFormat>().unwrap_or_default() {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true),
            )
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            log_level = %log_level,
            log_format = %log_format,
            capped_targets = NOISY_MODULES.len() + excluded_targets.len(),
            "Logging initialized"
        );
    }
}
