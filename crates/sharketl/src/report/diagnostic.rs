//! Diagnostic entries recorded by the transform checks.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Which check produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Exact duplicate rows.
    Duplicates,
    /// Rows where every cell is missing.
    MissingRows,
    /// Missing cells counted (and possibly filled) in a column.
    FilledMissing,
    /// A fill request that could not be honoured.
    FillFailed,
    /// Column storage type mismatch or failed conversion.
    DataType,
    /// Dates that could not be parsed and became the sentinel.
    UnknownDates,
}

impl CheckKind {
    /// Key used in the flat log record.
    pub fn key(&self, column: Option<&str>) -> String {
        let base = match self {
            CheckKind::Duplicates => "Duplicates",
            CheckKind::MissingRows => "NA",
            CheckKind::FilledMissing => "FilledNA",
            CheckKind::FillFailed => "FillNA",
            CheckKind::DataType => "DTypes",
            CheckKind::UnknownDates => "UnknownDates",
        };
        match (self, column) {
            (CheckKind::FillFailed | CheckKind::DataType, Some(col)) => format!("{} {}", base, col),
            _ => base.to_string(),
        }
    }

    /// Whether repeated counts add up. State checks report the table as it
    /// is now, so a later count replaces an earlier one.
    pub fn accumulates(&self) -> bool {
        !matches!(
            self,
            CheckKind::Duplicates | CheckKind::MissingRows | CheckKind::UnknownDates
        )
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only, may not require action.
    Info,
    /// Potential issue that should be reviewed.
    Warning,
    /// The requested operation could not be carried out.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// What a check found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Finding {
    Count(usize),
    Message(String),
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::Count(n) => write!(f, "{}", n),
            Finding::Message(msg) => f.write_str(msg),
        }
    }
}

/// A single finding from one check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Check that produced this entry.
    pub check: CheckKind,
    /// Affected column, when the check is column-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Severity level.
    pub severity: Severity,
    /// Count or message.
    pub finding: Finding,
    /// When recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Diagnostic {
    /// A counted finding.
    pub fn count(check: CheckKind, count: usize) -> Self {
        Self::new(check, Finding::Count(count), Severity::Info)
    }

    /// A message finding.
    pub fn message(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, Finding::Message(message.into()), Severity::Warning)
    }

    fn new(check: CheckKind, finding: Finding, severity: Severity) -> Self {
        Self {
            check,
            column: None,
            severity,
            finding,
            recorded_at: Utc::now(),
        }
    }

    /// Set the column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Key in the flat log record.
    pub fn key(&self) -> String {
        self.check.key(self.column.as_deref())
    }
}

/// Counts of diagnostics by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

/// Append-only collection of diagnostics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    entries: Vec<Diagnostic>,
}

impl DiagnosticReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// All diagnostics in the order they were recorded.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics produced by one check.
    pub fn by_check(&self, check: CheckKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.check == check)
    }

    /// Count diagnostics per severity.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for entry in &self.entries {
            match entry.severity {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// Render the report as one flat key → value record.
    ///
    /// Fill counts under the same key are summed and also appear per column
    /// as `FilledNA <column>`. Duplicate, empty-row and unknown-date counts
    /// keep the latest value. For messages under the same key the most severe
    /// wins, the later one among equals.
    pub fn to_flat_record(&self) -> IndexMap<String, JsonValue> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut messages: IndexMap<String, (Severity, String)> = IndexMap::new();
        let mut order: Vec<String> = Vec::new();

        for entry in &self.entries {
            let base = entry.key();
            let mut keys = vec![base.clone()];
            if entry.check == CheckKind::FilledMissing {
                if let Some(ref col) = entry.column {
                    keys.push(format!("{} {}", base, col));
                }
            }

            for key in keys {
                if !order.contains(&key) {
                    order.push(key.clone());
                }
                match &entry.finding {
                    Finding::Count(n) if entry.check.accumulates() => {
                        *counts.entry(key).or_insert(0) += n
                    }
                    Finding::Count(n) => {
                        counts.insert(key, *n);
                    }
                    Finding::Message(msg) => {
                        let replace = messages
                            .get(&key)
                            .map(|(severity, _)| entry.severity >= *severity)
                            .unwrap_or(true);
                        if replace {
                            messages.insert(key, (entry.severity, msg.clone()));
                        }
                    }
                }
            }
        }

        order
            .into_iter()
            .filter_map(|key| {
                let value = match messages.get(&key) {
                    Some((_, msg)) => JsonValue::from(msg.clone()),
                    None => JsonValue::from(*counts.get(&key)?),
                };
                Some((key, value))
            })
            .collect()
    }

    /// Count recorded under a flat key.
    pub fn count(&self, key: &str) -> Option<usize> {
        self.to_flat_record().get(key).and_then(|v| v.as_u64()).map(|n| n as usize)
    }

    /// Message recorded under a flat key.
    pub fn message(&self, key: &str) -> Option<String> {
        self.to_flat_record()
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}
