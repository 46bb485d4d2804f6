//! Report command - show a diagnostic log.

use std::path::PathBuf;

use colored::Colorize;
use serde_json::Value as JsonValue;
use sharketl::DiagnosticReport;

pub fn run(log: PathBuf, json_output: bool, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !log.exists() {
        return Err(format!(
            "Log not found: {}\nRun 'sharketl run <FILE>' first.",
            log.display()
        )
        .into());
    }

    let record = DiagnosticReport::load_flat(&log)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Diagnostics in".cyan().bold(),
        log.display().to_string().white()
    );
    println!();

    if record.is_empty() {
        println!("{}", "No issues found - data looks clean!".green());
        return Ok(());
    }

    for (key, value) in &record {
        match value {
            JsonValue::String(msg) => println!("  {:24} {}", key, msg.yellow()),
            other => println!("  {:24} {}", key, other.to_string().white().bold()),
        }
    }

    Ok(())
}
