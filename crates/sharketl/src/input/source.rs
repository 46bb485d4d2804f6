//! In-memory table and source file metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};
use crate::schema::{ColumnType, Value};

/// Metadata about a loaded source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Detected encoding.
    pub encoding: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            encoding: "utf-8".to_string(),
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// A named column and its storage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// Tabular data held in memory, row-major.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    /// Column names and storage types, in order.
    pub columns: Vec<Column>,
    /// Row data.
    pub rows: Vec<Vec<Value>>,
    /// The delimiter the table was read with.
    pub delimiter: u8,
}

impl DataTable {
    /// Create a table from already-typed cells, inferring each column's type.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>, delimiter: u8) -> Self {
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                dtype: ColumnType::infer(rows.iter().filter_map(|r| r.get(idx))),
                name,
            })
            .collect();

        Self {
            columns,
            rows,
            delimiter,
        }
    }

    /// Create a table from raw text fields.
    ///
    /// NA-like tokens become missing; a column whose remaining fields all parse
    /// as numbers is stored as `Float`.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>, delimiter: u8) -> Self {
        let mut rows: Vec<Vec<Value>> = records
            .iter()
            .map(|record| record.iter().map(|raw| Value::from_raw(raw)).collect())
            .collect();

        for col in 0..headers.len() {
            let numeric = rows
                .iter()
                .filter_map(|row| match row.get(col) {
                    Some(Value::Text(s)) => Some(s),
                    _ => None,
                })
                .all(|s| s.trim().parse::<f64>().is_ok());

            if numeric {
                for row in rows.iter_mut() {
                    let parsed = match row.get(col) {
                        Some(Value::Text(s)) => s.trim().parse::<f64>().ok(),
                        _ => None,
                    };
                    if let Some(f) = parsed {
                        row[col] = Value::Float(f);
                    }
                }
            }
        }

        Self::new(headers, rows, delimiter)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names in order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Storage type of a column by name.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.dtype)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Replace a whole column's cells and storage type.
    pub fn replace_column(&mut self, index: usize, values: Vec<Value>, dtype: ColumnType) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(EtlError::Parse {
                row: values.len(),
                column: index,
                message: format!(
                    "replacement column has {} values for {} rows",
                    values.len(),
                    self.rows.len()
                ),
            });
        }
        let column = self
            .columns
            .get_mut(index)
            .ok_or_else(|| EtlError::MissingColumn(format!("#{}", index)))?;
        column.dtype = dtype;

        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        Ok(())
    }

    /// Remove a column by name, returning its definition if it existed.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let index = self.column_index(name)?;
        for row in self.rows.iter_mut() {
            row.remove(index);
        }
        Some(self.columns.remove(index))
    }

    /// Keep only the rows matching the predicate, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Check whether every cell in a row is missing.
    pub fn is_row_empty(row: &[Value]) -> bool {
        row.iter().all(Value::is_missing)
    }
}
