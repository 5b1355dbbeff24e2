//! Terminal output formatting.

pub mod format;

pub use format::{format_run_summary, format_sample_line, RunSummary};
