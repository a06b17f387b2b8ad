//! Concurrent scoring of candidate pairs.
//!
//! Every candidate pair is an independent unit of work that only reads the
//! two (immutable, shared) value sets it refers to. Units are drained from a
//! shared cursor by a fixed number of workers on a `rayon` pool built for
//! one [`ComparisonScheduler::run`] call.
//!
//! Results come back over a channel tagged with the pair's position, so the
//! final outcome is ordered by pair identity and never by completion order.
//! A unit that errors or panics becomes a [`PairFailure`]; the other units
//! carry on. On cancellation no further units are claimed and the ones
//! already running finish. When the deadline passes the run returns at once
//! with [`MatchError::Timeout`]: units still running are abandoned and their
//! workers are detached, so a slow unit can never hold the caller past the
//! deadline.

use std::{
    any::Any,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    error::{MatchError, PairFailure},
    pairs::{self, CandidatePair},
    profile::{FileProfile, ValueSet},
    similarity::{self, DEFAULT_SIMILARITY_THRESHOLD, SimilarityResult},
};

pub const DEFAULT_COMPARISON_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Upper bound accepted for a comparison deadline (one year).
pub const MAX_COMPARISON_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

type UnitResult = Result<f64, String>;
type UnitInputs = Vec<(Arc<ValueSet>, Arc<ValueSet>)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    pub threshold: f64,
    /// Number of workers; 0 uses the available parallelism.
    pub worker_count: usize,
    pub timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            worker_count: 0,
            timeout: DEFAULT_COMPARISON_TIMEOUT,
        }
    }
}

/// Rejects deadlines that are zero or beyond [`MAX_COMPARISON_TIMEOUT`].
pub fn validate_timeout(timeout: Duration) -> Result<Duration, MatchError> {
    if timeout.is_zero() {
        return Err(MatchError::InvalidConfig(
            "Comparison timeout must be at least one second".to_string(),
        ));
    }
    if timeout > MAX_COMPARISON_TIMEOUT {
        return Err(MatchError::InvalidConfig(format!(
            "Comparison timeout must not exceed {}s (got {}s)",
            MAX_COMPARISON_TIMEOUT.as_secs(),
            timeout.as_secs()
        )));
    }
    Ok(timeout)
}

/// Stops new units from being dispatched. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub left_source: String,
    pub right_source: String,
    pub threshold: f64,
    /// Pairs scored successfully, whether or not they met the threshold.
    pub evaluated: usize,
    pub matches: Vec<SimilarityResult>,
    pub failures: Vec<PairFailure>,
}

impl ComparisonOutcome {
    fn empty(left: &FileProfile, right: &FileProfile, threshold: f64) -> Self {
        Self {
            left_source: left.source.clone(),
            right_source: right.source.clone(),
            threshold,
            evaluated: 0,
            matches: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Earliest failure by pair identity.
    pub fn first_failure(&self) -> Option<&PairFailure> {
        self.failures.first()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonScheduler {
    options: SchedulerOptions,
    cancel: CancelHandle,
}

impl ComparisonScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            options,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Workers actually started for `pair_count` units.
    pub fn worker_count(&self, pair_count: usize) -> usize {
        let requested = if self.options.worker_count == 0 {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            self.options.worker_count
        };
        requested.min(pair_count).max(1)
    }

    pub fn run(
        &self,
        left: &FileProfile,
        right: &FileProfile,
    ) -> Result<ComparisonOutcome, MatchError> {
        self.run_with(left, right, |_, left_values, right_values| {
            Ok(similarity::score(left_values, right_values))
        })
    }

    /// Runs every candidate pair through `scorer` instead of the default
    /// overlap score. The scorer is shared with the workers and may outlive
    /// this call when the deadline abandons a running unit.
    pub fn run_with<F>(
        &self,
        left: &FileProfile,
        right: &FileProfile,
        scorer: F,
    ) -> Result<ComparisonOutcome, MatchError>
    where
        F: Fn(&CandidatePair, &ValueSet, &ValueSet) -> anyhow::Result<f64>
            + Send
            + Sync
            + 'static,
    {
        let threshold = similarity::validate_threshold(self.options.threshold)?;
        let timeout = validate_timeout(self.options.timeout)?;
        let pairs = pairs::generate_for_profiles(left, right);
        let inputs = resolve_value_sets(left, right, &pairs)?;
        if pairs.is_empty() {
            info!(
                "No type-compatible columns between {} and {}",
                left.source, right.source
            );
            return Ok(ComparisonOutcome::empty(left, right, threshold));
        }

        let workers = self.worker_count(pairs.len());
        info!(
            "Scoring {} candidate pair(s) on {} worker(s)",
            pairs.len(),
            workers
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("colmatch-worker-{idx}"))
            .build()?;

        let started = Instant::now();
        let deadline = started.checked_add(timeout).ok_or_else(|| {
            MatchError::InvalidConfig(format!(
                "Comparison timeout of {}s cannot be represented",
                timeout.as_secs()
            ))
        })?;
        let shared_pairs = Arc::new(pairs.clone());
        let inputs = Arc::new(inputs);
        let scorer = Arc::new(scorer);
        let cursor = Arc::new(AtomicUsize::new(0));
        let deadline_passed = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel::<(usize, UnitResult)>();

        for _ in 0..workers {
            let sender = sender.clone();
            let cursor = Arc::clone(&cursor);
            let deadline_passed = Arc::clone(&deadline_passed);
            let cancel = self.cancel.clone();
            let pairs = Arc::clone(&shared_pairs);
            let inputs = Arc::clone(&inputs);
            let scorer = Arc::clone(&scorer);
            pool.spawn(move || {
                loop {
                    if deadline_passed.load(Ordering::Acquire) || cancel.is_cancelled() {
                        break;
                    }
                    let idx = cursor.fetch_add(1, Ordering::AcqRel);
                    let Some(pair) = pairs.get(idx) else {
                        break;
                    };
                    let (left_values, right_values) = &inputs[idx];
                    let result = run_unit(&*scorer, pair, left_values, right_values);
                    if sender.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(sender);

        let mut slots: Vec<Option<UnitResult>> = vec![None; pairs.len()];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(RecvTimeoutError::Timeout) => {
                    deadline_passed.store(true, Ordering::Release);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let timed_out = deadline_passed.load(Ordering::Acquire);
        if timed_out {
            // Results already queued when the deadline fired; running units
            // are not waited for.
            for (idx, result) in receiver.try_iter() {
                slots[idx] = Some(result);
            }
        }
        // Dropping the pool does not wait for running units.
        drop(pool);
        let elapsed = started.elapsed();

        let mut outcome = ComparisonOutcome::empty(left, right, threshold);
        let mut completed = Vec::new();
        let mut abandoned = Vec::new();
        for (pair, slot) in pairs.into_iter().zip(slots) {
            match slot {
                Some(Ok(score)) => {
                    debug!("'{}' vs '{}': {score:.4}", pair.left, pair.right);
                    outcome.evaluated += 1;
                    if similarity::is_similar(score, threshold) {
                        outcome.matches.push(SimilarityResult {
                            pair: pair.clone(),
                            score,
                        });
                    }
                    completed.push(pair);
                }
                Some(Err(message)) => {
                    let failure = PairFailure {
                        pair: pair.clone(),
                        left_file: left.source.clone(),
                        right_file: right.source.clone(),
                        message,
                    };
                    warn!("{failure}");
                    outcome.failures.push(failure);
                    completed.push(pair);
                }
                None => abandoned.push(pair),
            }
        }

        info!(
            "Scored {} pair(s) in {:.3}s: {} match(es), {} failure(s), {} abandoned",
            outcome.evaluated,
            elapsed.as_secs_f64(),
            outcome.matches.len(),
            outcome.failures.len(),
            abandoned.len()
        );

        if timed_out {
            Err(MatchError::Timeout {
                elapsed,
                completed,
                abandoned,
                partial: Box::new(outcome),
            })
        } else if !abandoned.is_empty() {
            Err(MatchError::Cancelled {
                completed,
                abandoned,
                partial: Box::new(outcome),
            })
        } else {
            Ok(outcome)
        }
    }
}

fn resolve_value_sets(
    left: &FileProfile,
    right: &FileProfile,
    pairs: &[CandidatePair],
) -> Result<UnitInputs, MatchError> {
    pairs
        .iter()
        .map(|pair| {
            let left_values = left.shared_values(pair.left_index).ok_or_else(|| {
                MatchError::MissingValues {
                    file: left.source.clone(),
                    column: pair.left.clone(),
                }
            })?;
            let right_values = right.shared_values(pair.right_index).ok_or_else(|| {
                MatchError::MissingValues {
                    file: right.source.clone(),
                    column: pair.right.clone(),
                }
            })?;
            Ok((left_values, right_values))
        })
        .collect()
}

fn run_unit<F>(scorer: &F, pair: &CandidatePair, left: &ValueSet, right: &ValueSet) -> UnitResult
where
    F: Fn(&CandidatePair, &ValueSet, &ValueSet) -> anyhow::Result<f64>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| scorer(pair, left, right))) {
        Ok(Ok(score)) if (0.0..=1.0).contains(&score) => Ok(score),
        Ok(Ok(score)) => Err(format!("score {score} is outside [0, 1]")),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
