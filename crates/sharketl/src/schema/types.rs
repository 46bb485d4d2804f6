//! Core type definitions for column storage types and cell values.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EtlError;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Floating-point numbers.
    Float,
    /// Text/string values.
    String,
    /// Calendar dates.
    Date,
    /// Every cell is missing, so nothing can be inferred.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Float)
    }

    /// Short lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::Unknown => "unknown",
        }
    }

    /// Infer the storage type of a column from its cells.
    ///
    /// Mixed content falls back to `String`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let mut inferred = ColumnType::Unknown;
        for value in values {
            let cell = match value.column_type() {
                Some(t) => t,
                None => continue,
            };
            inferred = match inferred {
                ColumnType::Unknown => cell,
                current if current == cell => current,
                _ => return ColumnType::String,
            };
        }
        inferred
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ColumnType {
    type Err = EtlError;

    /// Accepts the usual dataframe dtype spellings as well as our own labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "float" | "float64" | "f64" | "number" => Ok(ColumnType::Float),
            "string" | "str" | "object" | "text" => Ok(ColumnType::String),
            "date" | "datetime" | "datetime64" | "datetime64[ns]" => Ok(ColumnType::Date),
            other => Err(EtlError::UnsupportedFormat(format!(
                "unknown column type '{}'",
                other
            ))),
        }
    }
}

/// A single cell in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value present.
    #[default]
    Missing,
    /// Numeric value.
    Float(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Free text.
    Text(String),
}

impl Value {
    /// Build a cell from a raw field, treating NA-like tokens as missing.
    pub fn from_raw(raw: &str) -> Value {
        if Self::is_null_token(raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Check if a raw field represents a missing value.
    pub fn is_null_token(raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
    }

    /// Returns true for a missing cell.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Storage type this cell belongs to (`None` for missing).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Missing => None,
            Value::Float(_) => Some(ColumnType::Float),
            Value::Date(_) => Some(ColumnType::Date),
            Value::Text(_) => Some(ColumnType::String),
        }
    }

    /// Numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Canonical text form, used for keys, equality checks and text output.
    ///
    /// Missing cells render as the empty string.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Missing => Cow::Borrowed(""),
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
