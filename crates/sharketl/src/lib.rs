//! Sharketl: extract, transform and load for shark incident records.
//!
//! A run loads a delimited file of incident records, drops the records already
//! present in a master dataset, cleans the remainder and writes it out along
//! with a diagnostic report of everything the checks found.
//!
//! # Stages
//!
//! - **Extract**: [`Extractor`] parses the input and rationalizes it against
//!   the master by case number
//! - **Transform**: [`Transformer`] removes duplicates and empty rows, fills
//!   missing values, checks column types and normalizes dates
//! - **Load**: [`Loader`] writes csv, tsv, json, xlsx or parquet
//!
//! # Example
//!
//! ```no_run
//! use sharketl::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default().with_output_path("data/cleaned.json");
//! let outcome = Pipeline::with_config(config).run("data/new.csv").unwrap();
//!
//! println!("Rows written: {}", outcome.output_rows);
//! println!("Duplicates: {:?}", outcome.report.count("Duplicates"));
//! ```

pub mod error;
pub mod input;
pub mod output;
pub mod report;
pub mod schema;
pub mod transform;

mod pipeline;

pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
pub use error::{EtlError, Result};
pub use input::{DataTable, Extractor, SourceMetadata};
pub use output::{Loader, OutputFormat};
pub use report::{CheckKind, Diagnostic, DiagnosticReport, Severity};
pub use schema::{ColumnType, Value};
pub use transform::{FillMethod, FillStrategy, Transformer, clean_date};
