//! Run command - extract, transform and load one incident file.

use colored::Colorize;
use sharketl::{Pipeline, PipelineConfig, Severity};
use tracing::debug;

use crate::cli::RunArgs;

pub fn run(args: RunArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    println!(
        "{} {}",
        "Processing".cyan().bold(),
        args.file.display().to_string().white()
    );

    let mut config = PipelineConfig::default()
        .with_master_path(&args.master)
        .with_key_column(&args.key_column)
        .with_output_path(&args.output)
        .with_log_path(&args.log);
    if let Some(format) = args.format {
        config = config.with_output_format(format);
    }
    if args.no_rationalize {
        config = config.without_rationalize();
    }
    if args.keep_duplicates {
        config = config.keep_duplicates();
    }
    if args.keep_empty_rows {
        config = config.keep_empty_rows();
    }

    debug!(?config, "pipeline configuration");
    let outcome = Pipeline::with_config(config).run(&args.file)?;

    if outcome.rationalized {
        println!(
            "Rationalized against {}: {} of {} rows are new",
            args.master.display(),
            outcome.rationalized_rows.to_string().white().bold(),
            outcome.input_rows
        );
    } else if args.no_rationalize {
        println!("{}", "Rationalization skipped".yellow());
    } else {
        println!(
            "{} {}",
            "No master found at".yellow(),
            args.master.display().to_string().white()
        );
    }

    let counts = outcome.report.severity_counts();
    println!(
        "Found {} diagnostics ({} errors, {} warnings, {} info)",
        outcome.report.len().to_string().white().bold(),
        counts.error.to_string().red(),
        counts.warning.to_string().yellow(),
        counts.info.to_string().blue()
    );

    if verbose {
        println!();
        for entry in outcome.report.entries() {
            let key = match entry.severity {
                Severity::Error => entry.key().red(),
                Severity::Warning => entry.key().yellow(),
                Severity::Info => entry.key().blue(),
            };
            println!("  {:8} {:24} {}", entry.severity.label(), key, entry.finding);
        }
    }

    println!();
    for (key, value) in outcome.report.to_flat_record() {
        println!("  {:24} {}", key, value);
    }

    println!();
    println!(
        "{} {} rows to {} ({})",
        "Wrote".green().bold(),
        outcome.output_rows.to_string().white().bold(),
        outcome.output_path.display().to_string().white(),
        outcome.output_format
    );
    println!(
        "{} {}",
        "Log saved to".green().bold(),
        args.log.display().to_string().white()
    );

    Ok(())
}
