//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use sharketl::OutputFormat;
use std::path::PathBuf;

/// Sharketl: extract, transform and load shark incident records
#[derive(Parser)]
#[command(name = "sharketl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a new incident file and write it out with a diagnostic log
    Run(RunArgs),

    /// Show a diagnostic log written by a previous run
    Report {
        /// Path to the diagnostic log
        #[arg(value_name = "LOG", default_value = "logging/log.json")]
        log: PathBuf,

        /// Output the raw JSON record
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the new incident file (CSV/TSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Master dataset of already-ingested records
    #[arg(short, long, default_value = "data/master.csv")]
    pub master: PathBuf,

    /// Column identifying a record across datasets
    #[arg(short, long, default_value = sharketl::input::DEFAULT_KEY_COLUMN)]
    pub key_column: String,

    /// Output path for the cleaned table
    #[arg(short, long, default_value = "data/cleaned.csv")]
    pub output: PathBuf,

    /// Output path for the diagnostic log
    #[arg(short, long, default_value = "logging/log.json")]
    pub log: PathBuf,

    /// Output format (default: from the output extension)
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,

    /// Keep records already present in the master
    #[arg(long)]
    pub no_rationalize: bool,

    /// Keep exact duplicate rows
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Keep rows with every cell empty
    #[arg(long)]
    pub keep_empty_rows: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: sharketl::EtlError| e.to_string())
}
