//! Column-level operations used by the transformer.

use std::fmt;
use std::str::FromStr;

use crate::error::{EtlError, Result};
use crate::schema::{ColumnType, Value};

use super::dates::parse_lenient;

/// A supported way of filling missing cells from their neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    /// Take the next non-missing value below.
    Backfill,
    /// Take the last non-missing value above.
    ForwardFill,
    /// Use the column mean (numeric columns only).
    Mean,
}

impl FromStr for FillMethod {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "backfill" | "bfill" => Ok(FillMethod::Backfill),
            "ffill" | "pad" => Ok(FillMethod::ForwardFill),
            "mean" => Ok(FillMethod::Mean),
            other => Err(EtlError::UnsupportedFormat(format!(
                "fill method '{}'. Use backfill, bfill, ffill, pad or mean",
                other
            ))),
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillMethod::Backfill => write!(f, "backfill"),
            FillMethod::ForwardFill => write!(f, "ffill"),
            FillMethod::Mean => write!(f, "mean"),
        }
    }
}

/// How to fill the missing cells of one column: a named method or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStrategy {
    /// Method name, validated when the fill runs.
    Method(String),
    /// Literal replacement for every missing cell.
    Value(Value),
}

impl FillStrategy {
    pub fn method(name: impl Into<String>) -> Self {
        FillStrategy::Method(name.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        FillStrategy::Value(value.into())
    }
}

/// Fill the missing cells of a column using `method`.
pub fn fill_with_method(
    column: &str,
    values: &[Value],
    dtype: ColumnType,
    method: FillMethod,
) -> Result<Vec<Value>> {
    let mut filled = values.to_vec();

    match method {
        FillMethod::ForwardFill => {
            let mut last: Option<Value> = None;
            for cell in filled.iter_mut() {
                if cell.is_missing() {
                    if let Some(ref v) = last {
                        *cell = v.clone();
                    }
                } else {
                    last = Some(cell.clone());
                }
            }
        }
        FillMethod::Backfill => {
            let mut next: Option<Value> = None;
            for cell in filled.iter_mut().rev() {
                if cell.is_missing() {
                    if let Some(ref v) = next {
                        *cell = v.clone();
                    }
                } else {
                    next = Some(cell.clone());
                }
            }
        }
        FillMethod::Mean => {
            if !dtype.is_numeric() {
                return Err(EtlError::UnsupportedFormat(format!(
                    "cannot take the mean of {} column '{}'",
                    dtype, column
                )));
            }
            let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            if !numbers.is_empty() {
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                for cell in filled.iter_mut().filter(|c| c.is_missing()) {
                    *cell = Value::Float(mean);
                }
            }
        }
    }

    Ok(filled)
}

/// Convert every cell of a column to `target`.
///
/// Missing cells stay missing. The first cell that cannot be converted fails
/// the whole column.
pub fn coerce_values(column: &str, values: &[Value], target: ColumnType) -> Result<Vec<Value>> {
    let fail = |value: &Value| EtlError::Coercion {
        column: column.to_string(),
        value: value.to_string(),
        target: target.to_string(),
    };

    values
        .iter()
        .map(|value| match (value, target) {
            (Value::Missing, _) => Ok(Value::Missing),
            (_, ColumnType::Unknown) => Err(fail(value)),
            (Value::Float(_), ColumnType::Float) => Ok(value.clone()),
            (Value::Text(s), ColumnType::Float) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| fail(value)),
            (Value::Date(_), ColumnType::Float) => Err(fail(value)),
            (_, ColumnType::String) => Ok(Value::Text(value.to_string())),
            (Value::Date(_), ColumnType::Date) => Ok(value.clone()),
            (_, ColumnType::Date) => parse_lenient(&value.as_text())
                .map(Value::Date)
                .ok_or_else(|| fail(value)),
        })
        .collect()
}
