//! Parallel batch execution.
//!
//! Each request is an independent engine run, so a batch is a plain
//! `par_iter` over the requests. Output order matches input order.

use rayon::prelude::*;
use serde::Serialize;

use crate::backtest::{BacktestConfig, BacktestEngine, BacktestResult, Envelope};
use crate::data::BacktestInput;
use crate::error::{BacktestError, Result};

/// One labelled run.
#[derive(Debug, Clone)]
pub struct BacktestRequest {
    /// Caller-chosen name, usually the ticker or input path
    pub label: String,
    pub input: BacktestInput,
    pub config: BacktestConfig,
}

impl BacktestRequest {
    pub fn new(label: impl Into<String>, input: BacktestInput, config: BacktestConfig) -> Self {
        Self {
            label: label.into(),
            input,
            config,
        }
    }
}

/// Result of one request in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub label: String,
    pub result: Result<BacktestResult>,
}

/// Serialized form of a [`BatchOutcome`].
#[derive(Debug, Serialize)]
pub struct LabelledEnvelope<'a> {
    pub label: &'a str,
    pub response: Envelope<&'a BacktestResult>,
}

impl BatchOutcome {
    /// Outcome for a request that never reached the engine (for example a
    /// file that failed to load).
    pub fn failed(label: impl Into<String>, error: BacktestError) -> Self {
        Self {
            label: label.into(),
            result: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn envelope(&self) -> LabelledEnvelope<'_> {
        let response = match &self.result {
            Ok(result) => Envelope::success(result),
            Err(e) => Envelope::error(e.to_string()),
        };
        LabelledEnvelope {
            label: &self.label,
            response,
        }
    }
}

/// Runs backtest requests on a rayon pool.
#[derive(Default)]
pub struct BatchRunner {
    pool: Option<rayon::ThreadPool>,
}

impl BatchRunner {
    /// `max_threads` caps the worker count; `None` uses the global pool.
    pub fn new(max_threads: Option<usize>) -> Result<Self> {
        let pool = match max_threads {
            Some(n) => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };
        Ok(Self { pool })
    }

    /// Run every request and return outcomes in input order.
    pub fn run_all(&self, requests: &[BacktestRequest]) -> Vec<BatchOutcome> {
        let run = || {
            requests
                .par_iter()
                .map(|request| {
                    let result = BacktestEngine::new(request.config).run(&request.input);
                    if let Err(e) = &result {
                        tracing::warn!(label = %request.label, error = %e, "Backtest failed");
                    }
                    BatchOutcome {
                        label: request.label.clone(),
                        result,
                    }
                })
                .collect::<Vec<_>>()
        };

        let outcomes = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        tracing::info!(
            requests = requests.len(),
            succeeded = outcomes.iter().filter(|o| o.is_ok()).count(),
            "Batch completed"
        );

        outcomes
    }
}
