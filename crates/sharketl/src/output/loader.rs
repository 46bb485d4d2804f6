//! Writers for each output format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::input::DataTable;
use crate::report::ensure_parent_dir;
use crate::schema::Value;

use super::OutputFormat;

/// Serializes a table to disk. No validation, no transformation.
pub struct Loader<'a> {
    table: &'a DataTable,
}

impl<'a> Loader<'a> {
    pub fn new(table: &'a DataTable) -> Self {
        Self { table }
    }

    /// Write the table to `path` in `format`, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        match format {
            OutputFormat::Csv => self.write_delimited(path, b',')?,
            OutputFormat::Tsv => self.write_delimited(path, b'\t')?,
            OutputFormat::Json => self.write_json(path)?,
            #[cfg(feature = "excel")]
            OutputFormat::Excel => self.write_excel(path)?,
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => self.write_parquet(path)?,
        }

        info!(
            path = %path.display(),
            %format,
            rows = self.table.row_count(),
            "wrote output table"
        );
        Ok(())
    }

    /// Delimited text with a header row.
    pub fn write_delimited(&self, path: &Path, delimiter: u8) -> Result<()> {
        let file = File::create(path).map_err(|e| EtlError::io(path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(BufWriter::new(file));

        writer.write_record(self.table.headers())?;
        for row in &self.table.rows {
            writer.write_record(row.iter().map(|v| v.as_text().into_owned()))?;
        }
        writer.flush().map_err(|e| EtlError::io(path, e))?;
        Ok(())
    }

    /// A JSON array with one object per row, keys in column order.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let headers = self.table.headers();
        let records: Vec<IndexMap<&str, &Value>> = self
            .table
            .rows
            .iter()
            .map(|row| headers.iter().copied().zip(row.iter()).collect())
            .collect();

        let file = File::create(path).map_err(|e| EtlError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush().map_err(|e| EtlError::io(path, e))?;
        Ok(())
    }

    /// A single-sheet workbook: header row, then one row per record.
    #[cfg(feature = "excel")]
    pub fn write_excel(&self, path: &Path) -> Result<()> {
        use rust_xlsxwriter::Workbook;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, name) in self.table.headers().into_iter().enumerate() {
            worksheet.write_string(0, sheet_column(col)?, name)?;
        }

        for (row_idx, row) in self.table.rows.iter().enumerate() {
            let sheet_row = u32::try_from(row_idx + 1).map_err(|_| {
                EtlError::UnsupportedFormat("too many rows for a spreadsheet".to_string())
            })?;
            for (col, value) in row.iter().enumerate() {
                match value {
                    Value::Missing => {}
                    Value::Float(f) => {
                        worksheet.write_number(sheet_row, sheet_column(col)?, *f)?;
                    }
                    other => {
                        worksheet.write_string(sheet_row, sheet_column(col)?, other.as_text())?;
                    }
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    /// A parquet snapshot: float columns as float64, everything else as text.
    #[cfg(feature = "parquet")]
    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        use std::sync::Arc;

        use arrow::array::{ArrayRef, Float64Array, StringArray};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        use crate::schema::ColumnType;

        let mut fields = Vec::with_capacity(self.table.column_count());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.table.column_count());

        for (idx, column) in self.table.columns.iter().enumerate() {
            if column.dtype == ColumnType::Float {
                fields.push(Field::new(column.name.as_str(), DataType::Float64, true));
                let values: Vec<Option<f64>> =
                    self.table.column_values(idx).map(Value::as_f64).collect();
                arrays.push(Arc::new(Float64Array::from(values)));
            } else {
                fields.push(Field::new(column.name.as_str(), DataType::Utf8, true));
                let values: Vec<Option<String>> = self
                    .table
                    .column_values(idx)
                    .map(|v| (!v.is_missing()).then(|| v.as_text().into_owned()))
                    .collect();
                arrays.push(Arc::new(StringArray::from(values)));
            }
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let file = File::create(path).map_err(|e| EtlError::io(path, e))?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

#[cfg(feature = "excel")]
fn sheet_column(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| EtlError::UnsupportedFormat("too many columns for a spreadsheet".to_string()))
}
