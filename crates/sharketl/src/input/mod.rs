//! Input parsing, source loading and rationalization.

mod extract;
mod parser;
mod source;

pub use extract::{exclude_keys, Extractor, DEFAULT_KEY_COLUMN};
pub use parser::{Parser, ParserConfig};
pub use source::{Column, DataTable, SourceMetadata};
