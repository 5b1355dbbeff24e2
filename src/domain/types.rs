//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - threaded through the pipeline stages as immutable values
//! - exported to the ledger and to fit JSON files
//! - reloaded later for plotting or comparisons

use serde::{Deserialize, Serialize};

/// A single `(wavenumber, intensity)` record of a spectrum file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    /// Raman shift in cm⁻¹.
    pub wavenumber: f64,
    /// Measured counts at this shift.
    pub intensity: f64,
}

/// A whole spectrum, in file order.
///
/// Ordering convention (load-bearing, see `fit::background`): the *first*
/// record is the high-wavenumber end of the scan, the *last* record the
/// low-wavenumber end.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Sample name (input file stem); the ledger key.
    pub name: String,
    pub points: Vec<SpectrumPoint>,
}

impl Spectrum {
    /// The point with the maximum intensity inside `[lo, hi]` (inclusive).
    pub fn max_in_window(&self, lo: f64, hi: f64) -> Option<SpectrumPoint> {
        self.points
            .iter()
            .filter(|p| p.wavenumber >= lo && p.wavenumber <= hi)
            .copied()
            .reduce(|a, b| if b.intensity > a.intensity { b } else { a })
    }

    /// The point with the minimum intensity inside `[lo, hi]` (inclusive).
    pub fn min_in_window(&self, lo: f64, hi: f64) -> Option<SpectrumPoint> {
        self.points
            .iter()
            .filter(|p| p.wavenumber >= lo && p.wavenumber <= hi)
            .copied()
            .reduce(|a, b| if b.intensity < a.intensity { b } else { a })
    }
}

/// Linear baseline under the spectrum, derived once per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearBackground {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearBackground {
    pub fn value_at(&self, wavenumber: f64) -> f64 {
        self.intercept + self.slope * wavenumber
    }
}

/// The five recognized bands of carbonaceous material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakKind {
    G,
    D1,
    D2,
    D3,
    D4,
}

/// Which decomposition model a fit uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// 3-peak Voigt model: G, D1, D2.
    Voigt3,
    /// 5-peak Lorentzian model: G, D1, D2, D3, D4.
    Lorentz5,
}

impl ModelFamily {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelFamily::Voigt3 => "3-peak Voigt",
            ModelFamily::Lorentz5 => "5-peak Lorentzian",
        }
    }

    /// Bands fitted by this model, in parameter order.
    pub fn peaks(self) -> &'static [PeakKind] {
        match self {
            ModelFamily::Voigt3 => &[PeakKind::G, PeakKind::D1, PeakKind::D2],
            ModelFamily::Lorentz5 => &[
                PeakKind::G,
                PeakKind::D1,
                PeakKind::D2,
                PeakKind::D3,
                PeakKind::D4,
            ],
        }
    }

    /// Optimizer iteration cap for this model.
    ///
    /// The 5-peak system is larger and stiffer, so it gets a higher cap and a
    /// looser stopping tolerance.
    pub fn iteration_cap(self) -> u64 {
        match self {
            ModelFamily::Voigt3 => 500,
            ModelFamily::Lorentz5 => 2000,
        }
    }

    /// Relative SSE-reduction tolerance for convergence.
    pub fn ftol(self) -> f64 {
        match self {
            ModelFamily::Voigt3 => 1e-9,
            ModelFamily::Lorentz5 => 1e-4,
        }
    }
}

/// Physical (bound-mapped) parameters of one fitted peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParams {
    /// Fitted amplitude; recorded as the band height.
    pub amplitude: f64,
    /// Band center in cm⁻¹.
    pub location: f64,
    /// Half width at half maximum. Doubled to FWHM only at finalization.
    pub width: f64,
}

/// Iteration count of a finished fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationCount {
    Count(u64),
    /// The optimizer hit its cap; parameters are best-effort, not an error.
    ExceededCap(u64),
}

/// Outcome of a single optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub converged: bool,
    pub iterations: IterationCount,
    /// Final sum of squared residuals.
    pub sse: f64,
}

/// A complete fitted model for one spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    pub family: ModelFamily,
    pub background: LinearBackground,
    /// One entry per `family.peaks()`, same order.
    pub peaks: Vec<PeakParams>,
    pub outcome: FitOutcome,
}

/// Terminal state of the model-selection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStyle {
    /// Voigt fit accepted: R2 below the limit and D1 narrow.
    Voigt1,
    /// Lorentzian fit rejected (RA2 out of range); Voigt parameters reused.
    Voigt2,
    /// Voigt fit accepted: R2 below the limit and R1 small.
    Voigt3,
    /// 5-peak Lorentzian fit accepted.
    Lorentzians,
    /// Signal-to-noise below threshold; no fit was attempted.
    Noisy,
}

impl FitStyle {
    /// Label written to the ledger's `fitstyle` column.
    pub fn ledger_label(self) -> &'static str {
        match self {
            FitStyle::Voigt1 => "Voigt1",
            FitStyle::Voigt2 => "Voigt2",
            FitStyle::Voigt3 => "Voigt3",
            FitStyle::Lorentzians => "Lorentzians",
            FitStyle::Noisy => "Noisy",
        }
    }
}

/// One cell of a `SampleRecord`.
///
/// The ledger never contains empty fields: a ratio whose division produced no
/// numeric result, or a field the accepted model does not populate, is an
/// explicit `NotApplicable`; an optimizer that hit its iteration cap records
/// `ExceededCap` instead of a count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Value(f64),
    NotApplicable,
    ExceededCap(u64),
}

impl Cell {
    /// Wrap a computed value, demoting non-finite results to `NotApplicable`.
    pub fn from_computed(value: f64) -> Self {
        if value.is_finite() {
            Cell::Value(value)
        } else {
            Cell::NotApplicable
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Ledger text for this cell. `precision` applies to `Value` only.
    pub fn ledger_text(self, precision: usize) -> String {
        match self {
            Cell::Value(v) => format!("{v:.precision$}"),
            Cell::NotApplicable => "na".to_string(),
            Cell::ExceededCap(cap) => format!(">{cap}"),
        }
    }
}

impl From<IterationCount> for Cell {
    fn from(value: IterationCount) -> Self {
        match value {
            IterationCount::Count(n) => Cell::Value(n as f64),
            IterationCount::ExceededCap(cap) => Cell::ExceededCap(cap),
        }
    }
}

/// Height/location/width/area cells of one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCells {
    pub height: Cell,
    pub location: Cell,
    pub width: Cell,
    pub area: Cell,
}

impl PeakCells {
    pub fn not_applicable() -> Self {
        Self {
            height: Cell::NotApplicable,
            location: Cell::NotApplicable,
            width: Cell::NotApplicable,
            area: Cell::NotApplicable,
        }
    }
}

/// The full per-sample result row, immutable once appended to the ledger.
///
/// Widths here are FWHM: the finalization step doubles every fitted half
/// width exactly once, after model selection (`fit::metrics`).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub name: String,
    pub g: PeakCells,
    pub d1: PeakCells,
    pub d2: PeakCells,
    pub d3: PeakCells,
    pub d4: PeakCells,
    pub r1_ratio: Cell,
    pub r2_ratio: Cell,
    pub r2_temp: Cell,
    pub ra1_ratio: Cell,
    pub ra1_temp: Cell,
    pub ra2_ratio: Cell,
    pub ra2_temp: Cell,
    /// R2 from the Voigt fit, kept even when the Lorentzian fit is accepted.
    pub r2_voigt: Cell,
    /// The reported temperature for this sample (calibration matching the
    /// accepted model).
    pub plot_temp: Cell,
    pub total_width: Cell,
    pub total_width_voigt: Cell,
    pub fit_style: FitStyle,
    pub snr: i64,
    pub iterations: Cell,
}

/// Decision thresholds for noise gating and model selection.
///
/// Every threshold in the selection state machine lives here with its
/// documented default; the boundary semantics (strict `<`, floored percents)
/// are unit-tested at the exact limits in `fit::selection`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    /// Minimum integer SNR for a spectrum to be fitted at all.
    pub snr_threshold: i64,
    /// R2 acceptance limit for the Voigt branches (strict `<`).
    pub r2_limit: f64,
    /// `floor(100·R1)` must be below this for Voigt3 acceptance.
    pub r1_percent_limit: i64,
    /// `floor(100·RA2)` above this rejects the Lorentzian fit (Voigt2 fallback).
    pub ra2_percent_limit: i64,
    /// `floor(D1 width)` must be below this for Voigt1 acceptance.
    pub d1_width_limit: i64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            snr_threshold: 2,
            r2_limit: 0.6,
            r1_percent_limit: 50,
            ra2_percent_limit: 200,
            d1_width_limit: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(points: &[(f64, f64)]) -> Spectrum {
        Spectrum {
            name: "t".to_string(),
            points: points
                .iter()
                .map(|&(wavenumber, intensity)| SpectrumPoint {
                    wavenumber,
                    intensity,
                })
                .collect(),
        }
    }

    #[test]
    fn window_extrema_are_inclusive() {
        let s = spectrum(&[(1200.0, 5.0), (1100.0, 9.0), (1000.0, 1.0)]);
        let max = s.max_in_window(1100.0, 1200.0).unwrap();
        assert_eq!(max.wavenumber, 1100.0);
        let min = s.min_in_window(1000.0, 1100.0).unwrap();
        assert_eq!(min.wavenumber, 1000.0);
        assert!(s.max_in_window(1300.0, 1400.0).is_none());
    }

    #[test]
    fn window_max_keeps_first_on_ties() {
        // Two equal maxima: the earlier record (file order) wins, which keeps
        // initial guesses deterministic.
        let s = spectrum(&[(1600.0, 7.0), (1590.0, 7.0)]);
        let max = s.max_in_window(1500.0, 1700.0).unwrap();
        assert_eq!(max.wavenumber, 1600.0);
    }

    #[test]
    fn cell_ledger_text_covers_all_variants() {
        assert_eq!(Cell::Value(1.25).ledger_text(4), "1.2500");
        assert_eq!(Cell::NotApplicable.ledger_text(4), "na");
        assert_eq!(Cell::ExceededCap(500).ledger_text(4), ">500");
    }

    #[test]
    fn non_finite_computed_values_become_not_applicable() {
        assert_eq!(Cell::from_computed(f64::NAN), Cell::NotApplicable);
        assert_eq!(Cell::from_computed(f64::INFINITY), Cell::NotApplicable);
        assert_eq!(Cell::from_computed(2.0), Cell::Value(2.0));
    }
}
