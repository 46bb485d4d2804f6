//! End-to-end extract, transform and load run.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::{EtlError, Result};
use crate::input::{Extractor, ParserConfig, SourceMetadata, DEFAULT_KEY_COLUMN};
use crate::output::{Loader, OutputFormat};
use crate::report::DiagnosticReport;
use crate::schema::{ColumnType, Value};
use crate::transform::{FillStrategy, Transformer};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parser configuration for the input and master files.
    pub parser: ParserConfig,
    /// Master dataset used to drop already-known records.
    pub master_path: PathBuf,
    /// Column identifying a record across datasets.
    pub key_column: String,
    /// Skip rationalization against the master entirely.
    pub rationalize: bool,
    /// Where the diagnostic report is written.
    pub log_path: PathBuf,
    /// Where the cleaned table is written.
    pub output_path: PathBuf,
    /// Output format (None = infer from the output extension).
    pub output_format: Option<OutputFormat>,
    pub remove_duplicates: bool,
    pub remove_empty_rows: bool,
    /// Declared column types.
    pub expected_types: IndexMap<String, ColumnType>,
    /// Convert columns whose type differs from the declared one.
    pub coerce_types: bool,
    /// Missing-value fills, applied in order.
    pub fills: Vec<(String, FillStrategy)>,
    /// Column cleaned with the lenient date parser (None = skip).
    pub date_column: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut expected_types = IndexMap::new();
        expected_types.insert("Year".to_string(), ColumnType::Float);

        Self {
            parser: ParserConfig::default(),
            master_path: PathBuf::from("data/master.csv"),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            rationalize: true,
            log_path: PathBuf::from("logging/log.json"),
            output_path: PathBuf::from("data/cleaned.csv"),
            output_format: None,
            remove_duplicates: true,
            remove_empty_rows: true,
            expected_types,
            coerce_types: true,
            fills: vec![("Area".to_string(), FillStrategy::Value(Value::from("Unknown")))],
            date_column: Some("Date".to_string()),
        }
    }
}

impl PipelineConfig {
    pub fn with_master_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.master_path = path.into();
        self
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn without_rationalize(mut self) -> Self {
        self.rationalize = false;
        self
    }

    pub fn keep_duplicates(mut self) -> Self {
        self.remove_duplicates = false;
        self
    }

    pub fn keep_empty_rows(mut self) -> Self {
        self.remove_empty_rows = false;
        self
    }

    /// Declare the expected type of a column.
    pub fn expect_type(mut self, column: impl Into<String>, dtype: ColumnType) -> Self {
        self.expected_types.insert(column.into(), dtype);
        self
    }

    /// Append a missing-value fill.
    pub fn fill(mut self, column: impl Into<String>, strategy: FillStrategy) -> Self {
        self.fills.push((column.into(), strategy));
        self
    }

    pub fn with_date_column(mut self, column: Option<String>) -> Self {
        self.date_column = column;
        self
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Metadata about the input file.
    pub source: SourceMetadata,
    /// Rows read from the input.
    pub input_rows: usize,
    /// Rows left after dropping records already in the master.
    pub rationalized_rows: usize,
    /// Rows written to the output.
    pub output_rows: usize,
    /// Whether a master file was found and applied.
    pub rationalized: bool,
    pub report: DiagnosticReport,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
}

/// Runs extract, transform and load with one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Extractor,
}

impl Pipeline {
    /// Create a pipeline with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let extractor = Extractor::new()
            .with_parser_config(config.parser.clone())
            .with_key_column(config.key_column.clone());
        Self { config, extractor }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `input` and write the cleaned table and diagnostic report.
    ///
    /// A missing master file is not an error: the run continues with the
    /// full input. Every other failure is returned.
    pub fn run(&self, input: impl AsRef<Path>) -> Result<PipelineOutcome> {
        let config = &self.config;
        let output_format = match config.output_format {
            Some(format) => format,
            None => OutputFormat::from_path(&config.output_path)?,
        };

        let (table, source) = self.extractor.load(input)?;
        let input_rows = table.row_count();

        let (table, rationalized) = if config.rationalize {
            match self.extractor.rationalize(&table, &config.master_path) {
                Ok(reduced) => (reduced, true),
                Err(EtlError::MasterNotFound { path }) => {
                    warn!(
                        master = %path.display(),
                        "master not found, continuing with the full input"
                    );
                    (table, false)
                }
                Err(e) => return Err(e),
            }
        } else {
            (table, false)
        };
        let rationalized_rows = table.row_count();

        let mut transformer = Transformer::new(table, &config.log_path)
            .check_duplicates(config.remove_duplicates)
            .check_row_na(config.remove_empty_rows);

        if !config.expected_types.is_empty() {
            transformer = transformer.check_type(&config.expected_types, config.coerce_types);
        }
        for (column, strategy) in &config.fills {
            transformer = transformer.fill_na_vals(column, strategy.clone());
        }
        if let Some(column) = &config.date_column {
            transformer = transformer.clean_date_column(column);
        }

        let (table, report) = transformer.complete()?;
        Loader::new(&table).write(&config.output_path, output_format)?;

        info!(
            input = input_rows,
            rationalized = rationalized_rows,
            output = table.row_count(),
            "pipeline complete"
        );

        Ok(PipelineOutcome {
            source,
            input_rows,
            rationalized_rows,
            output_rows: table.row_count(),
            rationalized,
            report,
            output_path: config.output_path.clone(),
            output_format,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_in(dir: &Path) -> PipelineConfig {
        PipelineConfig::default()
            .with_master_path(dir.join("master.csv"))
            .with_log_path(dir.join("logging").join("log.json"))
            .with_output_path(dir.join("cleaned.csv"))
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.key_column, "CaseNumber");
        assert_eq!(config.master_path, PathBuf::from("data/master.csv"));
        assert_eq!(config.expected_types.get("Year"), Some(&ColumnType::Float));
        assert_eq!(config.fills.len(), 1);
        assert_eq!(config.date_column.as_deref(), Some("Date"));
    }

    #[test]
    fn test_run_without_master() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("new.csv");
        fs::write(
            &input,
            ",CaseNumber,Year,Area,Date\n0,a,2001,,05-Jun-2001\n1,b,2002,Florida,bogus\n",
        )
        .unwrap();

        let outcome = Pipeline::with_config(config_in(dir.path())).run(&input).unwrap();
        assert!(!outcome.rationalized);
        assert_eq!(outcome.input_rows, 2);
        assert_eq!(outcome.output_rows, 2);
        assert_eq!(outcome.report.count("FilledNA"), Some(1));
        assert_eq!(outcome.report.count("UnknownDates"), Some(1));
        assert!(dir.path().join("logging").join("log.json").exists());

        let written = fs::read_to_string(dir.path().join("cleaned.csv")).unwrap();
        assert!(written.starts_with("CaseNumber,Year,Area,Date\n"));
        assert!(written.contains("a,2001,Unknown,2001-06-05"));
        assert!(written.contains("b,2002,Florida,Unknown"));
    }

    #[test]
    fn test_run_with_master() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("master.csv"), ",CaseNumber\n0,a\n").unwrap();
        let input = dir.path().join("new.csv");
        fs::write(&input, ",CaseNumber,Year\n0,a,2001\n1,b,2002\n").unwrap();

        let outcome = Pipeline::with_config(config_in(dir.path())).run(&input).unwrap();
        assert!(outcome.rationalized);
        assert_eq!(outcome.rationalized_rows, 1);
        assert_eq!(outcome.output_rows, 1);
    }

    #[test]
    fn test_custom_checks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("new.csv");
        fs::write(
            &input,
            ",CaseNumber,Year,Area,Date\n0,a,2001,X,bogus\n1,b,,Y,also bogus\n",
        )
        .unwrap();

        let config = config_in(dir.path())
            .expect_type("Area", ColumnType::Float)
            .fill("Year", FillStrategy::method("ffill"))
            .with_date_column(None);
        let outcome = Pipeline::with_config(config).run(&input).unwrap();

        assert_eq!(outcome.report.count("FilledNA Year"), Some(1));
        assert!(outcome.report.message("DTypes Area").is_some());
        assert_eq!(outcome.report.count("UnknownDates"), None);

        let written = fs::read_to_string(dir.path().join("cleaned.csv")).unwrap();
        assert!(written.contains("b,2001,Y,also bogus"));
    }

    #[test]
    fn test_unknown_output_extension_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("new.csv");
        fs::write(&input, ",CaseNumber\n0,a\n").unwrap();

        let config = config_in(dir.path()).with_output_path(dir.path().join("out.pkl"));
        let err = Pipeline::with_config(config).run(&input).unwrap_err();
        assert!(matches!(err, EtlError::UnsupportedFormat(_)));
        assert!(!dir.path().join("logging").exists());
    }
}
