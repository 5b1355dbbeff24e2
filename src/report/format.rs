//! Reporting utilities: per-sample lines and the end-of-run summary.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{Cell, FitStyle, SampleRecord};

/// End-of-run tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Samples fitted and recorded (any accepted style).
    pub fitted: usize,
    /// Samples recorded as Noisy.
    pub noisy: usize,
    /// Samples already present in the ledger.
    pub duplicates: usize,
    /// Samples skipped because of unreadable or degenerate input.
    pub skipped: usize,
}

impl RunSummary {
    pub fn count(&mut self, record: &SampleRecord) {
        match record.fit_style {
            FitStyle::Noisy => self.noisy += 1,
            _ => self.fitted += 1,
        }
    }
}

/// One terminal line per finalized sample.
pub fn format_sample_line(record: &SampleRecord) -> String {
    match record.fit_style {
        FitStyle::Noisy => format!(
            "{:<24} {:<12} snr={} (below threshold, not fitted)",
            record.name,
            record.fit_style.ledger_label(),
            record.snr
        ),
        _ => format!(
            "{:<24} {:<12} snr={} R2={} T={}C iters={}",
            record.name,
            record.fit_style.ledger_label(),
            record.snr,
            fmt_cell(record.r2_ratio, 3),
            fmt_cell(record.plot_temp, 0),
            record.iterations.ledger_text(0),
        ),
    }
}

/// End-of-run summary block.
pub fn format_run_summary(summary: &RunSummary, ledger_rows: usize) -> String {
    let mut out = String::new();
    out.push_str("=== rcm - Raman CM decomposition ===\n");
    out.push_str(&format!(
        "Fitted: {} | Noisy: {} | Duplicates: {} | Skipped: {}\n",
        summary.fitted, summary.noisy, summary.duplicates, summary.skipped
    ));
    out.push_str(&format!("Ledger rows: {ledger_rows}\n"));
    out
}

fn fmt_cell(cell: Cell, precision: usize) -> String {
    cell.ledger_text(precision)
}
