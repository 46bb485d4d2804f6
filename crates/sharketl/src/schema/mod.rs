//! Column storage types and cell values.

mod types;

pub use types::{ColumnType, Value};
