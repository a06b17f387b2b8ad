//! The `compare` command: profile two files, score their same-typed column
//! pairs and report the similar ones.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::CompareArgs,
    config::MatchConfig,
    error::MatchError,
    io_utils,
    profile::{FileProfile, build_profile},
    report::{self, ComparisonReport, OutputFormat},
    rows::{CsvRowSource, RowSource},
    scheduler::{ComparisonOutcome, ComparisonScheduler},
};

/// Profiles both sources (types and value sets) and scores every candidate
/// pair with the configured scheduler.
pub fn match_files(
    left: &mut dyn RowSource,
    right: &mut dyn RowSource,
    config: &MatchConfig,
) -> Result<(FileProfile, FileProfile, ComparisonOutcome), MatchError> {
    let (left, right) = profile_sources(left, right, config)?;
    let outcome = ComparisonScheduler::new(config.scheduler_options()).run(&left, &right)?;
    Ok((left, right, outcome))
}

pub fn profile_sources(
    left: &mut dyn RowSource,
    right: &mut dyn RowSource,
    config: &MatchConfig,
) -> Result<(FileProfile, FileProfile), MatchError> {
    config.validate()?;
    let classifier = config.classifier()?;
    let options = config.profile_options(true);
    let left = build_profile(left, &classifier, &options)?;
    let right = build_profile(right, &classifier, &options)?;
    Ok((left, right))
}

pub fn execute(args: &CompareArgs) -> Result<()> {
    let config = resolve_config(args)?;
    info!(
        "Comparing '{}' with '{}' (threshold {}, delimiter '{}')",
        args.left.display(),
        args.right.display(),
        config.similarity_threshold,
        args.delimiter
            .map(io_utils::printable_delimiter)
            .unwrap_or_else(|| "auto".to_string())
    );

    let left_encoding = io_utils::resolve_encoding(args.left_encoding.as_deref())?;
    let right_encoding = io_utils::resolve_encoding(args.right_encoding.as_deref())?;
    let mut left = CsvRowSource::open(&args.left, args.delimiter, left_encoding)
        .with_context(|| format!("Opening left input {:?}", args.left))?;
    let mut right = CsvRowSource::open(&args.right, args.delimiter, right_encoding)
        .with_context(|| format!("Opening right input {:?}", args.right))?;

    let (left, right) = profile_sources(&mut left, &mut right, &config)?;
    let scheduler = ComparisonScheduler::new(config.scheduler_options());
    match scheduler.run(&left, &right) {
        Ok(outcome) => {
            print_report(args.format, &left, &right, &outcome)?;
            if !outcome.is_clean() {
                warn!(
                    "{} of {} candidate pair(s) failed to score",
                    outcome.failures.len(),
                    outcome.failures.len() + outcome.evaluated
                );
            }
            Ok(())
        }
        Err(err) => {
            if let Some(partial) = err.partial_outcome() {
                print_report(args.format, &left, &right, partial)?;
            }
            Err(err.into())
        }
    }
}

/// Defaults, then the `--config` file, then individual flags.
pub fn resolve_config(args: &CompareArgs) -> Result<MatchConfig> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(timeout) = args.timeout_secs {
        config.comparison_timeout_secs = timeout;
    }
    if let Some(sample_rows) = args.sample_rows {
        config.sample_rows = sample_rows;
    }
    if !args.date_formats.is_empty() {
        config.date_formats = args.date_formats.clone();
    }
    if args.all {
        config.similarity_threshold = 0.0;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(
    format: OutputFormat,
    left: &FileProfile,
    right: &FileProfile,
    outcome: &ComparisonOutcome,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", report::render_types(left));
            println!("{}", report::render_types(right));
            print!("{}", report::render_matches(outcome));
            let failures = report::render_failures(outcome);
            if !failures.is_empty() {
                println!();
                print!("{failures}");
            }
        }
        OutputFormat::Json => {
            let report = ComparisonReport {
                left,
                right,
                outcome,
            };
            println!("{}", report::render_json(&report)?);
        }
    }
    Ok(())
}
