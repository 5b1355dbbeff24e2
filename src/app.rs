//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - optionally resets the ledger (with confirmation)
//! - processes the input files strictly sequentially
//! - triggers rendering/export side effects after each finalization
//! - appends records to the ledger and prints the run summary

use std::path::Path;

use clap::Parser;
use log::{debug, warn};

use crate::cli::Cli;
use crate::error::AppError;
use crate::io::ledger::{Ledger, NameMatch};
use crate::report::RunSummary;

pub mod pipeline;

/// Entry point for the `rcm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    env_logger::init();

    if cli.reset {
        let cleared = Ledger::reset(&cli.ledger, cli.threshold)?;
        if cleared {
            println!("Ledger '{}' cleared.", cli.ledger.display());
        } else {
            println!("Reset aborted; ledger unchanged.");
            return Ok(());
        }
    }

    let match_mode = if cli.exact_names {
        NameMatch::Exact
    } else {
        NameMatch::Substring
    };
    let mut ledger = Ledger::open(&cli.ledger, match_mode, cli.threshold)?;
    let config = cli.fit_config();
    let mut summary = RunSummary::default();

    // Strictly sequential: samples are independent and the ledger is the
    // only shared mutable resource.
    for path in &cli.inputs {
        process_file(path, &cli, &config, &mut ledger, &mut summary);
    }

    print!("{}", crate::report::format_run_summary(&summary, ledger.len()));
    Ok(())
}

/// Process a single input file. Per-sample failures (unreadable input,
/// degenerate spectra, render or append errors) are logged and counted,
/// never fatal: the batch keeps going and the process still exits 0 after
/// the last file.
fn process_file(
    path: &Path,
    cli: &Cli,
    config: &crate::domain::FitConfig,
    ledger: &mut Ledger,
    summary: &mut RunSummary,
) {
    // Duplicate check first: re-running a completed sample must be a cheap,
    // safe no-op.
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if !name.is_empty() && ledger.contains(name) {
        debug!("{name}: already in the ledger, skipping");
        summary.duplicates += 1;
        return;
    }

    let spectrum = match crate::io::spectrum::read_spectrum(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("{}: {e}", path.display());
            summary.skipped += 1;
            return;
        }
    };

    let output = match pipeline::process_spectrum(&spectrum, config) {
        Ok(o) => o,
        Err(e) => {
            warn!("{}: {e}", spectrum.name);
            summary.skipped += 1;
            return;
        }
    };

    // Side effects run strictly after finalization and never fail the sample.
    if !cli.quiet {
        let plot_path = cli.plot_dir.join(format!("{}.svg", spectrum.name));
        let rendered = match &output.selection {
            None => crate::plot::render_raw(&plot_path, &spectrum),
            Some(selection) => {
                crate::plot::render_decomposition(&plot_path, &spectrum, selection.final_model())
            }
        };
        if let Err(e) = rendered {
            warn!("{}: {e}", spectrum.name);
        }
    }
    if let (Some(dir), Some(selection)) = (&cli.export_fit, &output.selection) {
        if let Err(e) =
            crate::io::fitfile::write_fit_json(dir, &spectrum, selection.style, selection.final_model())
        {
            warn!("{}: {e}", spectrum.name);
        }
    }

    println!("{}", crate::report::format_sample_line(&output.record));

    match ledger.append(&output.record) {
        Ok(true) => summary.count(&output.record),
        Ok(false) => {
            debug!("{}: already in the ledger, skipping", output.record.name);
            summary.duplicates += 1;
        }
        Err(e) => {
            warn!("{}: {e}", output.record.name);
            summary.skipped += 1;
        }
    }
}
