//! Persistence for diagnostic reports - save/load the flat JSON log.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{EtlError, Result};

use super::diagnostic::DiagnosticReport;

impl DiagnosticReport {
    /// Save the report as one flat JSON object, replacing any existing file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use sharketl::DiagnosticReport;
    /// # fn example(report: &DiagnosticReport) -> sharketl::Result<()> {
    /// report.save("logging/log.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let file = File::create(path).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_flat_record()).map_err(|e| {
            EtlError::Persistence(format!("Failed to serialize diagnostic report: {}", e))
        })?;
        writer.flush().map_err(|e| EtlError::io(path, e))?;

        Ok(())
    }

    /// Load a flat log record written by [`DiagnosticReport::save`].
    pub fn load_flat(path: impl AsRef<Path>) -> Result<IndexMap<String, JsonValue>> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            EtlError::Persistence(format!(
                "Failed to parse diagnostic log '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CheckKind, Diagnostic};

    #[test]
    fn test_save_is_flat_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging").join("log.json");

        let mut report = DiagnosticReport::new();
        report.push(Diagnostic::count(CheckKind::Duplicates, 2));
        report.save(&path).unwrap();

        let mut second = DiagnosticReport::new();
        second.push(Diagnostic::count(CheckKind::MissingRows, 1));
        second.save(&path).unwrap();

        let flat = DiagnosticReport::load_flat(&path).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["NA"], 1);
    }

    #[test]
    fn test_empty_report_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        DiagnosticReport::new().save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "{}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_reports_write_failure() {
        let mut report = DiagnosticReport::new();
        report.push(Diagnostic::count(CheckKind::Duplicates, 2));

        let err = report.save("/dev/full").unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
