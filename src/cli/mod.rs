//! Command-line parsing for the Raman CM decomposition tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! modeling/math code. The short flags (`-d`, `-q`, `-t`) keep interface
//! compatibility with the tool this pipeline replaces.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::FitConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "rcm",
    version,
    about = "Decompose Raman spectra of carbonaceous material and derive geothermometer ratios"
)]
pub struct Cli {
    /// Reset the ledger before processing (asks for confirmation).
    #[arg(short = 'd', long = "delete")]
    pub reset: bool,

    /// Quiet mode: skip chart rendering.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Integer signal-to-noise threshold; spectra below it are recorded as
    /// Noisy and never fitted.
    #[arg(short = 't', long = "threshold", default_value_t = 2)]
    pub threshold: i64,

    /// R2 acceptance limit for the Voigt branches (strict `<`).
    #[arg(long = "r2-limit", default_value_t = 0.6)]
    pub r2_limit: f64,

    /// Match ledger keys exactly instead of the historical substring lookup
    /// (under which a name contained in an already-processed name counts as
    /// a duplicate).
    #[arg(long = "exact-names")]
    pub exact_names: bool,

    /// Ledger file path.
    #[arg(long, default_value = "results.txt")]
    pub ledger: PathBuf,

    /// Directory for per-sample SVG renders (must already exist).
    #[arg(long = "plot-dir", default_value = "plots")]
    pub plot_dir: PathBuf,

    /// Also export per-sample fit JSON into this directory (must already
    /// exist).
    #[arg(long = "export-fit", value_name = "DIR")]
    pub export_fit: Option<PathBuf>,

    /// Input spectrum files (two-column whitespace-separated ASCII,
    /// high-wavenumber end first).
    #[arg(value_name = "SPECTRUM")]
    pub inputs: Vec<PathBuf>,
}

impl Cli {
    /// Decision thresholds derived from the flags (everything not exposed on
    /// the command line keeps its documented default).
    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            snr_threshold: self.threshold,
            r2_limit: self.r2_limit,
            ..FitConfig::default()
        }
    }
}
