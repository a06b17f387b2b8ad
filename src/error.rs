//! Error types shared by the profiling and matching engine.
//!
//! Only failures that stop a run surface as [`MatchError`]. A single
//! candidate pair failing to score is not one of them: those are collected
//! as [`PairFailure`] values inside the [`ComparisonOutcome`] so the other
//! pairs still get reported.

use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

use crate::{pairs::CandidatePair, scheduler::ComparisonOutcome};

pub type BoxedSourceError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Failed to read {file}{}: {source}", row_suffix(.row))]
    RowSource {
        file: String,
        row: Option<usize>,
        #[source]
        source: BoxedSourceError,
    },
    #[error("Column '{column}' in {file} was profiled without its value set")]
    MissingValues { file: String, column: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unable to start comparison workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error(
        "Comparison timed out after {:.1}s with {} pair(s) completed and {} abandoned",
        .elapsed.as_secs_f64(),
        .completed.len(),
        .abandoned.len()
    )]
    Timeout {
        elapsed: Duration,
        completed: Vec<CandidatePair>,
        abandoned: Vec<CandidatePair>,
        partial: Box<ComparisonOutcome>,
    },
    #[error(
        "Comparison cancelled with {} pair(s) completed and {} abandoned",
        .completed.len(),
        .abandoned.len()
    )]
    Cancelled {
        completed: Vec<CandidatePair>,
        abandoned: Vec<CandidatePair>,
        partial: Box<ComparisonOutcome>,
    },
}

impl MatchError {
    pub fn row_source(
        file: impl Into<String>,
        row: Option<usize>,
        source: impl Into<BoxedSourceError>,
    ) -> Self {
        MatchError::RowSource {
            file: file.into(),
            row,
            source: source.into(),
        }
    }

    /// Results gathered before the run stopped, if it stopped early.
    pub fn partial_outcome(&self) -> Option<&ComparisonOutcome> {
        match self {
            MatchError::Timeout { partial, .. } | MatchError::Cancelled { partial, .. } => {
                Some(partial.as_ref())
            }
            _ => None,
        }
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at row {row}"),
        None => String::new(),
    }
}

/// A candidate pair whose scoring unit returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize)]
#[error("Comparing '{}' ({left_file}) with '{}' ({right_file}): {message}", .pair.left, .pair.right)]
pub struct PairFailure {
    pub pair: CandidatePair,
    pub left_file: String,
    pub right_file: String,
    pub message: String,
}
