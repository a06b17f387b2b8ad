pub mod classify;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod io_utils;
pub mod pairs;
pub mod profile;
pub mod report;
pub mod rows;
pub mod scheduler;
pub mod similarity;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    classify::{DateFormats, TypeClassifier},
    profile::ProfileOptions,
    report::OutputFormat,
    rows::CsvRowSource,
};

pub use crate::{
    classify::TypeLabel,
    compare::match_files,
    config::MatchConfig,
    error::{MatchError, PairFailure},
    pairs::CandidatePair,
    profile::{FileProfile, ValueSet},
    scheduler::{CancelHandle, ComparisonOutcome, ComparisonScheduler, SchedulerOptions},
    similarity::SimilarityResult,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_colmatch", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => handle_probe(&args),
        Commands::Compare(args) => compare::execute(&args),
    }
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    info!(
        "Probing '{}' with delimiter '{}'",
        args.input.display(),
        args.delimiter
            .map(io_utils::printable_delimiter)
            .unwrap_or_else(|| "auto".to_string())
    );
    let date_formats = if args.date_formats.is_empty() {
        DateFormats::default()
    } else {
        DateFormats::new(&args.date_formats)?
    };
    let classifier = TypeClassifier::new(date_formats);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut source = CsvRowSource::open(&args.input, args.delimiter, encoding)
        .with_context(|| format!("Opening input {:?}", args.input))?;
    let options = ProfileOptions {
        sample_rows: args.sample_rows,
        collect_values: true,
    };
    let profile = profile::build_profile(&mut source, &classifier, &options)
        .with_context(|| format!("Inferring column types from {:?}", args.input))?;
    match args.format {
        OutputFormat::Table => print!("{}", report::render_types(&profile)),
        OutputFormat::Json => println!("{}", report::render_json(&profile)?),
    }
    info!(
        "Inferred types for {} column(s) over {} row(s)",
        profile.columns.len(),
        profile.rows_read
    );
    Ok(())
}
