//! Diagnostic report accumulated over one transform run.

mod diagnostic;
mod persistence;

pub use diagnostic::{CheckKind, Diagnostic, DiagnosticReport, Finding, Severity, SeverityCounts};
pub(crate) use persistence::ensure_parent_dir;
