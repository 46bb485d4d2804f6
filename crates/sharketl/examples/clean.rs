//! Example: clean an incident file with the default pipeline.
//!
//! Usage:
//!   cargo run --example clean -- <file_path> [master_path]

use std::env;

use sharketl::{Pipeline, PipelineConfig};

fn main() -> sharketl::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example clean -- <file_path> [master_path]");
        std::process::exit(1);
    }

    let mut config = PipelineConfig::default();
    if let Some(master) = args.get(2) {
        config = config.with_master_path(master);
    }

    let outcome = Pipeline::with_config(config).run(&args[1])?;

    println!("Source:      {} ({})", outcome.source.file, outcome.source.format);
    println!("Input rows:  {}", outcome.input_rows);
    println!("New rows:    {}", outcome.rationalized_rows);
    println!("Output rows: {}", outcome.output_rows);
    println!();
    for (key, value) in outcome.report.to_flat_record() {
        println!("{:24} {}", key, value);
    }

    Ok(())
}
