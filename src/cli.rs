use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{io_utils, report::OutputFormat};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Find columns that hold the same values across two CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer the data type of every column in a CSV file
    Probe(ProbeArgs),
    /// Compare the columns of two CSV files by value overlap
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV file to inspect (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring types (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Accepted date pattern such as `yyyy-MM-dd` (repeatable; replaces the defaults)
    #[arg(long = "date-format", action = clap::ArgAction::Append)]
    pub date_formats: Vec<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Left-hand CSV file
    #[arg(short = 'l', long = "left")]
    pub left: PathBuf,
    /// Right-hand CSV file
    #[arg(short = 'r', long = "right")]
    pub right: PathBuf,
    /// YAML file with matching settings; flags below override it
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Minimum similarity (0 to 1) for a pair to be reported
    #[arg(short = 't', long)]
    pub threshold: Option<f64>,
    /// Worker threads used for scoring (0 uses all available cores)
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,
    /// Abandon the comparison after this many seconds
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,
    /// Number of rows to sample when inferring types (0 means full scan)
    #[arg(long)]
    pub sample_rows: Option<usize>,
    /// Accepted date pattern such as `yyyy-MM-dd` (repeatable; replaces the configured list)
    #[arg(long = "date-format", action = clap::ArgAction::Append)]
    pub date_formats: Vec<String>,
    /// CSV delimiter character for both inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the left file (defaults to utf-8)
    #[arg(long = "left-encoding")]
    pub left_encoding: Option<String>,
    /// Character encoding of the right file (defaults to utf-8)
    #[arg(long = "right-encoding")]
    pub right_encoding: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Report every evaluated pair regardless of the threshold
    #[arg(long)]
    pub all: bool,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    io_utils::parse_delimiter(value).map_err(|err| err.to_string())
}
