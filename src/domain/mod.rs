//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and derived spectrum data (`Spectrum`, `LinearBackground`)
//! - peak/model vocabulary (`PeakKind`, `ModelFamily`, `PeakParams`)
//! - fit outputs (`FittedModel`, `FitOutcome`, `FitStyle`)
//! - the ledger row (`SampleRecord`, `Cell`) and decision thresholds (`FitConfig`)

pub mod types;

pub use types::*;
