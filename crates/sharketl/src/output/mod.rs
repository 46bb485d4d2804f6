//! Persisting cleaned tables.

mod loader;

use std::path::Path;

use crate::error::{EtlError, Result};

pub use loader::Loader;

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
    #[cfg(feature = "excel")]
    Excel,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl OutputFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .ok_or_else(|| {
                EtlError::UnsupportedFormat(format!(
                    "cannot infer output format from '{}'",
                    path.display()
                ))
            })?;
        ext.parse()
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
            #[cfg(feature = "excel")]
            OutputFormat::Excel => "xlsx",
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            #[cfg(feature = "excel")]
            "xlsx" | "excel" => Ok(OutputFormat::Excel),
            #[cfg(not(feature = "excel"))]
            "xlsx" | "excel" => Err(EtlError::UnsupportedFormat(
                "Excel support not enabled. Rebuild with --features excel".to_string(),
            )),
            #[cfg(feature = "parquet")]
            "parquet" | "pq" => Ok(OutputFormat::Parquet),
            #[cfg(not(feature = "parquet"))]
            "parquet" | "pq" => Err(EtlError::UnsupportedFormat(
                "Parquet support not enabled. Rebuild with --features parquet".to_string(),
            )),
            _ => Err(EtlError::UnsupportedFormat(format!(
                "{}. Use csv, tsv, json, xlsx or parquet.",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
