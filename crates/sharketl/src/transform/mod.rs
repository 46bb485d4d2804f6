//! Data-quality checks and cleanups applied between extract and load.

pub mod dates;
mod engine;
mod operations;

pub use dates::{DateOrSentinel, UNKNOWN_DATE, clean_date, clean_date_value};
pub use engine::{
    CONVERSION_FAILED, INCORRECT_DTYPE, INDEX_COLUMN, Loaded, Reindexed, Transformer, TypeMismatch,
};
pub use operations::{FillMethod, FillStrategy, coerce_values, fill_with_method};
