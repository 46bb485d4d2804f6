//! Transformer that runs data-quality checks over a table.
//!
//! The table is owned by the transformer and threaded through each check by
//! value. Stage ordering is part of the type: the positional index column is
//! dropped by [`Transformer::check_row_na`], which turns a
//! `Transformer<Loaded>` into a `Transformer<Reindexed>`. Date cleanup and
//! [`Transformer::complete`] only exist on the reindexed stage.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{EtlError, Result};
use crate::input::DataTable;
use crate::report::{CheckKind, Diagnostic, DiagnosticReport, Severity};
use crate::schema::{ColumnType, Value};

use super::dates::clean_date_value;
use super::operations::{FillMethod, FillStrategy, coerce_values, fill_with_method};

/// Name given to the unnamed positional index column on load.
pub const INDEX_COLUMN: &str = "Unnamed: 0";

/// Report message for a column stored with an unexpected type.
pub const INCORRECT_DTYPE: &str = "Incorrect datatype in col";

/// Report message for a column that could not be converted.
pub const CONVERSION_FAILED: &str = "Error in converting col please check this is a valid conversion";

/// Stage before the positional index column has been dropped.
#[derive(Debug)]
pub struct Loaded;

/// Stage after the positional index column has been dropped.
#[derive(Debug)]
pub struct Reindexed;

/// A column whose storage type differs from the declared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub column: String,
    pub expected: ColumnType,
    /// `None` when the column does not exist.
    pub actual: Option<ColumnType>,
}

/// Applies checks and cleanups to a table, accumulating a diagnostic report.
#[derive(Debug)]
pub struct Transformer<S = Loaded> {
    table: DataTable,
    report: DiagnosticReport,
    log_path: PathBuf,
    index_column: String,
    _stage: PhantomData<S>,
}

impl Transformer<Loaded> {
    /// Start a run over `table`, writing the report to `log_path` on completion.
    pub fn new(table: DataTable, log_path: impl Into<PathBuf>) -> Self {
        Self {
            table,
            report: DiagnosticReport::new(),
            log_path: log_path.into(),
            index_column: INDEX_COLUMN.to_string(),
            _stage: PhantomData,
        }
    }

    /// Use a different name for the positional index column.
    pub fn with_index_column(mut self, name: impl Into<String>) -> Self {
        self.index_column = name.into();
        self
    }
}

impl<S> Transformer<S> {
    /// The table in its current state.
    pub fn table(&self) -> &DataTable {
        &self.table
    }

    /// The findings so far.
    pub fn report(&self) -> &DiagnosticReport {
        &self.report
    }

    /// Where the report is written on completion.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        debug!(key = %diagnostic.key(), finding = ?diagnostic.finding, "recorded diagnostic");
        self.report.push(diagnostic);
    }

    fn into_stage<T>(self) -> Transformer<T> {
        Transformer {
            table: self.table,
            report: self.report,
            log_path: self.log_path,
            index_column: self.index_column,
            _stage: PhantomData,
        }
    }

    /// Count exact duplicate rows and optionally drop all but the first.
    ///
    /// The positional index column is ignored when comparing rows, since it
    /// is unique by construction.
    pub fn check_duplicates(mut self, remove: bool) -> Self {
        let skip = self.table.column_index(&self.index_column);
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut keep = Vec::with_capacity(self.table.row_count());

        for row in &self.table.rows {
            let key: Vec<String> = row
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .map(|(_, v)| fingerprint(v))
                .collect();
            keep.push(seen.insert(key));
        }

        let duplicates = keep.iter().filter(|k| !**k).count();
        if duplicates > 0 {
            self.record(Diagnostic::count(CheckKind::Duplicates, duplicates));
        }

        if remove && duplicates > 0 {
            let mut flags = keep.into_iter();
            self.table.retain_rows(|_| flags.next().unwrap_or(true));
        }

        info!(duplicates, removed = remove, "duplicate check");
        self
    }

    /// Drop the positional index column, then count rows with every cell
    /// missing and optionally remove them.
    pub fn check_row_na(mut self, remove: bool) -> Transformer<Reindexed> {
        if self.table.drop_column(&self.index_column).is_some() {
            debug!(column = %self.index_column, "dropped positional index column");
        }

        let empty = self
            .table
            .rows
            .iter()
            .filter(|row| DataTable::is_row_empty(row))
            .count();

        if empty > 0 {
            self.record(Diagnostic::count(CheckKind::MissingRows, empty));
        }

        if remove && empty > 0 {
            self.table.retain_rows(|row| !DataTable::is_row_empty(row));
        }

        info!(empty_rows = empty, removed = remove, "missing-row check");
        self.into_stage()
    }

    /// Count the missing cells of `column` and fill them.
    ///
    /// Bad method names, a mean over a non-numeric column and an unknown
    /// column are recorded in the report and leave the table untouched.
    pub fn fill_na_vals(mut self, column: &str, strategy: FillStrategy) -> Self {
        let Some(index) = self.table.column_index(column) else {
            warn!(column, "fill requested for missing column");
            self.record(
                Diagnostic::message(CheckKind::FillFailed, format!("Column '{}' not found", column))
                    .with_column(column)
                    .with_severity(Severity::Error),
            );
            return self;
        };

        let values: Vec<Value> = self.table.column_values(index).cloned().collect();
        let missing = values.iter().filter(|v| v.is_missing()).count();
        self.record(Diagnostic::count(CheckKind::FilledMissing, missing).with_column(column));

        let dtype = self.table.columns[index].dtype;
        let filled = match strategy {
            FillStrategy::Method(ref name) => {
                let method = match name.parse::<FillMethod>() {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(column, method = %name, error = %e, "unsupported fill method");
                        self.record(
                            Diagnostic::message(
                                CheckKind::FillFailed,
                                format!("Failed on filling {}. Please use valid method.", column),
                            )
                            .with_column(column)
                            .with_severity(Severity::Error),
                        );
                        return self;
                    }
                };
                match fill_with_method(column, &values, dtype, method) {
                    Ok(filled) => filled,
                    Err(e) => {
                        warn!(column, %method, error = %e, "fill method not applicable");
                        self.record(
                            Diagnostic::message(CheckKind::FillFailed, e.to_string())
                                .with_column(column)
                                .with_severity(Severity::Error),
                        );
                        return self;
                    }
                }
            }
            FillStrategy::Value(ref value) => values
                .into_iter()
                .map(|v| if v.is_missing() { value.clone() } else { v })
                .collect(),
        };

        let dtype = ColumnType::infer(&filled);
        if let Err(e) = self.table.replace_column(index, filled, dtype) {
            warn!(column, error = %e, "could not write filled column");
            self.record(
                Diagnostic::message(CheckKind::FillFailed, e.to_string())
                    .with_column(column)
                    .with_severity(Severity::Error),
            );
        }

        debug!(column, missing, "filled missing values");
        self
    }

    /// Compare each declared column type with the stored one.
    pub fn validate_types(&self, expected: &IndexMap<String, ColumnType>) -> Vec<TypeMismatch> {
        expected
            .iter()
            .filter_map(|(column, &expected)| {
                let actual = self.table.column_type(column);
                (actual != Some(expected)).then(|| TypeMismatch {
                    column: column.clone(),
                    expected,
                    actual,
                })
            })
            .collect()
    }

    /// Convert each declared column to its type.
    ///
    /// A failed conversion is recorded and leaves that column unchanged; the
    /// remaining columns are still converted.
    pub fn coerce_types(mut self, expected: &IndexMap<String, ColumnType>) -> Self {
        for (column, &target) in expected {
            let converted = match self.table.column_index(column) {
                Some(index) => {
                    let values: Vec<Value> = self.table.column_values(index).cloned().collect();
                    coerce_values(column, &values, target)
                        .and_then(|values| self.table.replace_column(index, values, target))
                }
                None => Err(EtlError::MissingColumn(column.clone())),
            };

            if let Err(e) = converted {
                warn!(column = %column, %target, error = %e, "type conversion failed");
                self.record(
                    Diagnostic::message(CheckKind::DataType, CONVERSION_FAILED)
                        .with_column(column.as_str())
                        .with_severity(Severity::Error),
                );
            }
        }
        self
    }

    /// Validate declared column types and, if `coerce`, convert them.
    pub fn check_type(mut self, expected: &IndexMap<String, ColumnType>, coerce: bool) -> Self {
        for mismatch in self.validate_types(expected) {
            debug!(
                column = %mismatch.column,
                expected = %mismatch.expected,
                actual = ?mismatch.actual,
                "column type mismatch"
            );
            self.record(Diagnostic::message(CheckKind::DataType, INCORRECT_DTYPE).with_column(mismatch.column));
        }

        if coerce {
            self = self.coerce_types(expected);
        }
        self
    }
}

impl Transformer<Reindexed> {
    /// Replace every value of a date column with its cleaned form.
    ///
    /// Unparsable values become the `"Unknown"` sentinel; their number is
    /// recorded under `UnknownDates`.
    pub fn clean_date_column(mut self, column: &str) -> Self {
        let Some(index) = self.table.column_index(column) else {
            warn!(column, "date column not found, skipping cleanup");
            return self;
        };

        let cleaned: Vec<_> = self.table.column_values(index).map(clean_date_value).collect();
        let unknown = cleaned.iter().filter(|c| c.is_unknown()).count();
        let values: Vec<Value> = cleaned.into_iter().map(Value::from).collect();
        let dtype = if unknown == 0 { ColumnType::Date } else { ColumnType::String };

        if unknown > 0 {
            self.record(Diagnostic::count(CheckKind::UnknownDates, unknown).with_column(column));
        }

        if let Err(e) = self.table.replace_column(index, values, dtype) {
            warn!(column, error = %e, "could not write cleaned dates");
        }

        info!(column, unknown, "cleaned date column");
        self
    }

    /// The incident-record cleanups: tidy the `Date` column.
    pub fn bespoke_format_columns(self) -> Self {
        self.clean_date_column("Date")
    }

    /// Write the report to the log path and hand back the table and report.
    pub fn complete(self) -> Result<(DataTable, DiagnosticReport)> {
        self.report.save(&self.log_path)?;
        info!(
            log = %self.log_path.display(),
            entries = self.report.len(),
            rows = self.table.row_count(),
            "transform complete"
        );
        Ok((self.table, self.report))
    }
}

/// Text used to compare cells for duplicate detection.
fn fingerprint(value: &Value) -> String {
    match value {
        // Keep missing distinct from an empty string
        Value::Missing => "\u{0}".to_string(),
        other => other.as_text().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Finding;

    fn table(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::from_records(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            b',',
        )
    }

    fn sharks() -> DataTable {
        table(
            &["Unnamed: 0", "CaseNumber", "Year", "Area"],
            &[
                &["0", "a", "2018", "Queensland"],
                &["1", "a", "2018", "Queensland"],
                &["2", "b", "", ""],
                &["3", "", "", ""],
                &["4", "c", "1995", "Florida"],
            ],
        )
    }

    fn expected(pairs: &[(&str, ColumnType)]) -> IndexMap<String, ColumnType> {
        pairs.iter().map(|(c, t)| (c.to_string(), *t)).collect()
    }

    #[test]
    fn test_duplicates_ignore_index_column() {
        let t = Transformer::new(sharks(), "log.json").check_duplicates(true);
        assert_eq!(t.report().count("Duplicates"), Some(1));
        assert_eq!(t.table().row_count(), 4);
    }

    #[test]
    fn test_duplicates_idempotent() {
        let t = Transformer::new(sharks(), "log.json")
            .check_duplicates(true)
            .check_duplicates(true);
        assert_eq!(t.report().by_check(CheckKind::Duplicates).count(), 1);
        assert_eq!(t.table().row_count(), 4);
    }

    #[test]
    fn test_duplicates_without_removal_keeps_rows() {
        let t = Transformer::new(sharks(), "log.json").check_duplicates(false);
        assert_eq!(t.report().count("Duplicates"), Some(1));
        assert_eq!(t.table().row_count(), 5);
    }

    #[test]
    fn test_row_na_drops_index_then_counts() {
        let t = Transformer::new(sharks(), "log.json").check_row_na(true);
        assert!(t.table().column_index(INDEX_COLUMN).is_none());
        assert_eq!(t.report().count("NA"), Some(1));
        assert_eq!(t.table().row_count(), 4);

        let t = t.check_row_na(true);
        assert_eq!(t.report().count("NA"), Some(1));
        assert_eq!(t.report().by_check(CheckKind::MissingRows).count(), 1);
    }

    #[test]
    fn test_repeated_checks_without_removal_do_not_double_count() {
        let t = Transformer::new(sharks(), "log.json")
            .check_duplicates(false)
            .check_duplicates(false)
            .check_row_na(false)
            .check_row_na(false);

        assert_eq!(t.report().count("Duplicates"), Some(1));
        assert_eq!(t.report().count("NA"), Some(1));
        assert_eq!(t.table().row_count(), 5);
    }

    #[test]
    fn test_custom_index_column() {
        let data = table(
            &["idx", "CaseNumber", "Area"],
            &[&["10", "a", "Queensland"], &["11", "a", "Queensland"], &["12", "", ""]],
        );

        let t = Transformer::new(data, "log.json")
            .with_index_column("idx")
            .check_duplicates(true)
            .check_row_na(true);

        assert_eq!(t.report().count("Duplicates"), Some(1));
        assert_eq!(t.report().count("NA"), Some(1));
        assert_eq!(t.table().headers(), vec!["CaseNumber", "Area"]);
        assert_eq!(t.table().row_count(), 1);
    }

    #[test]
    fn test_fill_with_value() {
        let t = Transformer::new(sharks(), "log.json")
            .check_row_na(true)
            .fill_na_vals("Area", FillStrategy::value("Unknown"));

        assert_eq!(t.report().count("FilledNA"), Some(1));
        let area = t.table().column_by_name("Area").unwrap();
        assert!(area.iter().all(|v| !v.is_missing()));
        assert_eq!(t.table().column_type("Area"), Some(ColumnType::String));
    }

    #[test]
    fn test_fill_invalid_method_leaves_column() {
        let before = sharks();
        let t = Transformer::new(before.clone(), "log.json")
            .fill_na_vals("Area", FillStrategy::method("invalid_method"));

        assert_eq!(t.table(), &before);
        assert_eq!(
            t.report().message("FillNA Area").as_deref(),
            Some("Failed on filling Area. Please use valid method.")
        );
        let failure = t.report().by_check(CheckKind::FillFailed).next().unwrap();
        assert_eq!(failure.severity, Severity::Error);
    }

    #[test]
    fn test_fill_mean_on_text_is_recorded() {
        let before = sharks();
        let t = Transformer::new(before.clone(), "log.json")
            .fill_na_vals("Area", FillStrategy::method("mean"));
        assert_eq!(t.table(), &before);
        assert!(t.report().message("FillNA Area").is_some());
    }

    #[test]
    fn test_fill_missing_column() {
        let t = Transformer::new(sharks(), "log.json").fill_na_vals("Injury", FillStrategy::value(""));
        assert!(t.report().message("FillNA Injury").is_some());
    }

    #[test]
    fn test_fill_counts_accumulate() {
        let t = Transformer::new(sharks(), "log.json")
            .fill_na_vals("Area", FillStrategy::value("Unknown"))
            .fill_na_vals("Year", FillStrategy::method("ffill"));

        assert_eq!(t.report().count("FilledNA"), Some(4));
        assert_eq!(t.report().count("FilledNA Area"), Some(2));
        assert_eq!(t.report().count("FilledNA Year"), Some(2));
        assert_eq!(t.table().get(2, 2), Some(&Value::Float(2018.0)));
    }

    #[test]
    fn test_validate_types_separately() {
        let t = Transformer::new(sharks(), "log.json");
        let mismatches = t.validate_types(&expected(&[
            ("Year", ColumnType::Float),
            ("Area", ColumnType::Float),
            ("Nope", ColumnType::String),
        ]));

        let columns: Vec<_> = mismatches.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(columns, vec!["Area", "Nope"]);
        assert_eq!(mismatches[1].actual, None);
        assert!(t.report().is_empty());
    }

    #[test]
    fn test_type_check_garbage_year() {
        let data = table(
            &["Year", "Area"],
            &[&["1995", "Florida"], &["circa 1900s", "Hawaii"]],
        );
        let t = Transformer::new(data.clone(), "log.json")
            .check_type(&expected(&[("Year", ColumnType::Float)]), true);

        assert_eq!(t.report().message("DTypes Year").as_deref(), Some(CONVERSION_FAILED));
        assert_eq!(t.table(), &data);
    }

    #[test]
    fn test_type_check_failure_does_not_stop_others() {
        let data = table(&["Year", "Area"], &[&["bad", "Florida"], &["1995", "Hawaii"]]);
        let t = Transformer::new(data, "log.json").check_type(
            &expected(&[("Year", ColumnType::Float), ("Area", ColumnType::Date)]),
            false,
        );
        assert_eq!(t.report().message("DTypes Year").as_deref(), Some(INCORRECT_DTYPE));
        assert_eq!(t.report().message("DTypes Area").as_deref(), Some(INCORRECT_DTYPE));

        let t = t.coerce_types(&expected(&[("Area", ColumnType::String), ("Year", ColumnType::String)]));
        assert_eq!(t.table().column_type("Year"), Some(ColumnType::String));
        assert_eq!(t.table().column_type("Area"), Some(ColumnType::String));
    }

    #[test]
    fn test_type_check_matching_column_is_silent() {
        let t = Transformer::new(sharks(), "log.json")
            .check_type(&expected(&[("Year", ColumnType::Float)]), true);
        assert!(t.report().is_empty());
    }

    #[test]
    fn test_clean_date_column() {
        let data = table(
            &["CaseNumber", "Date"],
            &[&["a", "Reported 03-Jan-2015"], &["b", "unknown date!!"], &["c", ""]],
        );
        let t = Transformer::new(data, "log.json")
            .check_row_na(false)
            .bespoke_format_columns();

        let dates: Vec<String> = t
            .table()
            .column_by_name("Date")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(dates, vec!["2015-01-03", "Unknown", "Unknown"]);
        assert_eq!(t.report().count("UnknownDates"), Some(2));
        assert_eq!(t.table().column_type("Date"), Some(ColumnType::String));
    }

    #[test]
    fn test_complete_writes_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logging").join("log.json");

        let (data, report) = Transformer::new(sharks(), &log)
            .check_duplicates(true)
            .check_row_na(true)
            .complete()
            .unwrap();

        assert_eq!(data.row_count(), 3);
        assert_eq!(report.len(), 2);
        let flat = DiagnosticReport::load_flat(&log).unwrap();
        assert_eq!(flat["Duplicates"], 1);
        assert_eq!(flat["NA"], 1);
        assert!(report.entries().iter().all(|e| matches!(e.finding, Finding::Count(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_complete_fails_when_log_cannot_be_written() {
        let result = Transformer::new(sharks(), "/dev/full")
            .check_row_na(true)
            .complete();
        assert!(matches!(result, Err(EtlError::Io { .. })));
    }
}
