//! Loading source tables and rationalizing them against a master dataset.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EtlError, Result};
use super::parser::{Parser, ParserConfig};
use super::source::{DataTable, SourceMetadata};

/// Default name of the column identifying a record across runs.
pub const DEFAULT_KEY_COLUMN: &str = "CaseNumber";

/// Loads tables from disk and filters out records that were already ingested.
pub struct Extractor {
    parser: Parser,
    key_column: String,
}

impl Extractor {
    /// Create an extractor keyed on `CaseNumber`.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }

    /// Use a custom parser configuration.
    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser = Parser::with_config(config);
        self
    }

    /// Use a different key column for rationalization.
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    /// Name of the key column.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Load a delimited file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let (table, source) = self.parser.parse_file(path)?;

        info!(
            file = %source.file,
            format = %source.format,
            rows = source.row_count,
            columns = source.column_count,
            hash = %source.hash,
            "loaded source table"
        );

        Ok((table, source))
    }

    /// Drop every row whose key already appears in the master file.
    ///
    /// Returns [`EtlError::MasterNotFound`] when the master file does not exist;
    /// callers treat that as "nothing ingested yet" and keep the full table.
    pub fn rationalize(&self, table: &DataTable, master_path: impl AsRef<Path>) -> Result<DataTable> {
        let master_path = master_path.as_ref();
        if !master_path.exists() {
            return Err(EtlError::MasterNotFound {
                path: master_path.to_path_buf(),
            });
        }

        let (master, _) = self.parser.parse_file(master_path)?;
        let master_keys = key_set(&master, &self.key_column)?;

        debug!(
            master = %master_path.display(),
            known_keys = master_keys.len(),
            "rationalizing against master"
        );

        exclude_keys(table.clone(), &self.key_column, &master_keys)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the distinct key values of a table.
fn key_set(table: &DataTable, key_column: &str) -> Result<HashSet<String>> {
    let index = table
        .column_index(key_column)
        .ok_or_else(|| EtlError::MissingColumn(key_column.to_string()))?;

    Ok(table
        .column_values(index)
        .map(|v| v.as_text().into_owned())
        .collect())
}

/// Keep the rows of `table` whose key is not in `known`, in original order.
pub fn exclude_keys(
    mut table: DataTable,
    key_column: &str,
    known: &HashSet<String>,
) -> Result<DataTable> {
    let index = table
        .column_index(key_column)
        .ok_or_else(|| EtlError::MissingColumn(key_column.to_string()))?;

    let before = table.row_count();
    table.retain_rows(|row| !known.contains(&*row[index].as_text()));

    info!(
        kept = table.row_count(),
        excluded = before - table.row_count(),
        "rationalized input against master keys"
    );

    Ok(table)
}
