//! Error types for the sharketl library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input bytes are not valid UTF-8 text.
    #[error("Encoding error in '{path}': {source}. Check the file is UTF-8 encoded")]
    Decoding {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// No master file exists to rationalize against.
    #[error("No master file found at '{path}'")]
    MasterNotFound { path: PathBuf },

    /// Error parsing delimited data.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A named column does not exist in the table.
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A column could not be converted to the requested type.
    #[error("Cannot convert '{value}' in column '{column}' to {target}")]
    Coercion {
        column: String,
        value: String,
        target: String,
    },

    /// Output or type name not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Saving or loading a diagnostic report failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet writer error.
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow batch construction error.
    #[cfg(feature = "parquet")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Spreadsheet writer error.
    #[cfg(feature = "excel")]
    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

impl EtlError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;
