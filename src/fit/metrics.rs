//! Derived band metrics, empirical calibrations, and record assembly.
//!
//! All ratios and temperatures are computed from a fitted model's bands:
//!
//! - `R1 = D1h / Gh`, `R2 = D1a / (D1a + Ga + D2a)`
//! - `RA1 = (D1a + D4a) / total area`, `RA2 = (D1a + D4a) / (Ga + D2a + D3a)`
//! - `r2Temp = -445·R2 + 641` (°C)
//! - `ra1Temp = (RA1 - 0.3758) / 0.0008`, `ra2Temp = (RA2 - 0.27) / 0.0045`
//!
//! Band areas depend on the family: the Lorentzian area is `height·π·width`;
//! the Voigt area is the exact integral of the fitted shape, `amp·√π`
//! (DESIGN.md). Widths are HWHM throughout the fit and selection; record
//! assembly is the single finalization point where every reported width
//! (including the total widths) is doubled to FWHM.
//!
//! A division with no numeric result (zero-height bands and the like) becomes
//! an explicit `NotApplicable` cell, never an empty field.

use std::f64::consts::PI;

use crate::domain::{
    Cell, FitStyle, FittedModel, ModelFamily, PeakCells, PeakKind, SampleRecord,
};

/// Height/location/width/area of one fitted band (width still HWHM).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMetrics {
    pub height: f64,
    pub location: f64,
    pub width: f64,
    pub area: f64,
}

/// All band metrics of one fitted model, plus the ratio formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetrics {
    pub family: ModelFamily,
    bands: Vec<(PeakKind, BandMetrics)>,
}

impl ModelMetrics {
    pub fn from_model(model: &FittedModel) -> Self {
        let bands = model
            .family
            .peaks()
            .iter()
            .zip(model.peaks.iter())
            .map(|(&kind, p)| {
                let area = match model.family {
                    ModelFamily::Voigt3 => p.amplitude * PI.sqrt(),
                    ModelFamily::Lorentz5 => p.amplitude * PI * p.width,
                };
                (
                    kind,
                    BandMetrics {
                        height: p.amplitude,
                        location: p.location,
                        width: p.width,
                        area,
                    },
                )
            })
            .collect();
        Self {
            family: model.family,
            bands,
        }
    }

    pub fn band(&self, kind: PeakKind) -> Option<BandMetrics> {
        self.bands
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, b)| *b)
    }

    fn height(&self, kind: PeakKind) -> f64 {
        self.band(kind).map(|b| b.height).unwrap_or(0.0)
    }

    fn area(&self, kind: PeakKind) -> f64 {
        self.band(kind).map(|b| b.area).unwrap_or(0.0)
    }

    fn width(&self, kind: PeakKind) -> f64 {
        self.band(kind).map(|b| b.width).unwrap_or(0.0)
    }

    /// `R1 = D1 height / G height`. May be non-finite.
    pub fn r1(&self) -> f64 {
        self.height(PeakKind::D1) / self.height(PeakKind::G)
    }

    /// `R2 = D1 area / (D1 + G + D2 areas)`. May be non-finite.
    pub fn r2(&self) -> f64 {
        let d1 = self.area(PeakKind::D1);
        d1 / (d1 + self.area(PeakKind::G) + self.area(PeakKind::D2))
    }

    /// `RA1 = (D1 + D4 areas) / total area`. Meaningful for the 5-peak model.
    pub fn ra1(&self) -> f64 {
        let num = self.area(PeakKind::D1) + self.area(PeakKind::D4);
        let total: f64 = self.bands.iter().map(|(_, b)| b.area).sum();
        num / total
    }

    /// `RA2 = (D1 + D4 areas) / (G + D2 + D3 areas)`.
    pub fn ra2(&self) -> f64 {
        let num = self.area(PeakKind::D1) + self.area(PeakKind::D4);
        num / (self.area(PeakKind::G) + self.area(PeakKind::D2) + self.area(PeakKind::D3))
    }

    /// `G + D1 + D2` half widths; doubled with everything else at finalization.
    pub fn total_width(&self) -> f64 {
        self.width(PeakKind::G) + self.width(PeakKind::D1) + self.width(PeakKind::D2)
    }
}

/// Empirical R2 temperature calibration (°C).
pub fn r2_temp(r2: f64) -> f64 {
    -445.0 * r2 + 641.0
}

/// Empirical RA1 temperature calibration (°C).
pub fn ra1_temp(ra1: f64) -> f64 {
    (ra1 - 0.3758) / 0.0008
}

/// Empirical RA2 temperature calibration (°C).
pub fn ra2_temp(ra2: f64) -> f64 {
    (ra2 - 0.27) / 0.0045
}

/// FWHM cells for one band (the HWHM→FWHM doubling happens here).
fn peak_cells(b: BandMetrics) -> PeakCells {
    PeakCells {
        height: Cell::from_computed(b.height),
        location: Cell::from_computed(b.location),
        width: Cell::from_computed(2.0 * b.width),
        area: Cell::from_computed(b.area),
    }
}

fn band_cells(metrics: &ModelMetrics, kind: PeakKind) -> PeakCells {
    metrics
        .band(kind)
        .map(peak_cells)
        .unwrap_or_else(PeakCells::not_applicable)
}

/// Record for a spectrum that failed the noise gate: every fit-derived field
/// is `NotApplicable`; only the name, style, and SNR carry information.
pub fn noisy_record(name: &str, snr: i64) -> SampleRecord {
    SampleRecord {
        name: name.to_string(),
        g: PeakCells::not_applicable(),
        d1: PeakCells::not_applicable(),
        d2: PeakCells::not_applicable(),
        d3: PeakCells::not_applicable(),
        d4: PeakCells::not_applicable(),
        r1_ratio: Cell::NotApplicable,
        r2_ratio: Cell::NotApplicable,
        r2_temp: Cell::NotApplicable,
        ra1_ratio: Cell::NotApplicable,
        ra1_temp: Cell::NotApplicable,
        ra2_ratio: Cell::NotApplicable,
        ra2_temp: Cell::NotApplicable,
        r2_voigt: Cell::NotApplicable,
        plot_temp: Cell::NotApplicable,
        total_width: Cell::NotApplicable,
        total_width_voigt: Cell::NotApplicable,
        fit_style: FitStyle::Noisy,
        snr,
        iterations: Cell::NotApplicable,
    }
}

/// Record for an accepted Voigt branch (Voigt1, Voigt3, or the Voigt2
/// fallback; all three report the same numeric fields from the Voigt fit).
pub fn voigt_record(
    name: &str,
    style: FitStyle,
    voigt: &ModelMetrics,
    iterations: Cell,
    snr: i64,
) -> SampleRecord {
    debug_assert!(matches!(
        style,
        FitStyle::Voigt1 | FitStyle::Voigt2 | FitStyle::Voigt3
    ));
    let r2 = Cell::from_computed(voigt.r2());
    let temp = Cell::from_computed(r2_temp(voigt.r2()));
    let total = Cell::from_computed(2.0 * voigt.total_width());

    SampleRecord {
        name: name.to_string(),
        g: band_cells(voigt, PeakKind::G),
        d1: band_cells(voigt, PeakKind::D1),
        d2: band_cells(voigt, PeakKind::D2),
        d3: PeakCells::not_applicable(),
        d4: PeakCells::not_applicable(),
        r1_ratio: Cell::from_computed(voigt.r1()),
        r2_ratio: r2,
        r2_temp: temp,
        ra1_ratio: Cell::NotApplicable,
        ra1_temp: Cell::NotApplicable,
        ra2_ratio: Cell::NotApplicable,
        ra2_temp: Cell::NotApplicable,
        r2_voigt: r2,
        plot_temp: temp,
        total_width: total,
        total_width_voigt: total,
        fit_style: style,
        snr,
        iterations,
    }
}

/// Record for an accepted 5-peak Lorentzian fit. The Voigt metrics are still
/// consulted for the `r2voigt` and `totalwidthvoigt` columns.
pub fn lorentz_record(
    name: &str,
    lorentz: &ModelMetrics,
    voigt: &ModelMetrics,
    iterations: Cell,
    snr: i64,
) -> SampleRecord {
    SampleRecord {
        name: name.to_string(),
        g: band_cells(lorentz, PeakKind::G),
        d1: band_cells(lorentz, PeakKind::D1),
        d2: band_cells(lorentz, PeakKind::D2),
        d3: band_cells(lorentz, PeakKind::D3),
        d4: band_cells(lorentz, PeakKind::D4),
        r1_ratio: Cell::from_computed(lorentz.r1()),
        r2_ratio: Cell::from_computed(lorentz.r2()),
        r2_temp: Cell::from_computed(r2_temp(lorentz.r2())),
        ra1_ratio: Cell::from_computed(lorentz.ra1()),
        ra1_temp: Cell::from_computed(ra1_temp(lorentz.ra1())),
        ra2_ratio: Cell::from_computed(lorentz.ra2()),
        ra2_temp: Cell::from_computed(ra2_temp(lorentz.ra2())),
        r2_voigt: Cell::from_computed(voigt.r2()),
        plot_temp: Cell::from_computed(ra2_temp(lorentz.ra2())),
        total_width: Cell::from_computed(2.0 * lorentz.total_width()),
        total_width_voigt: Cell::from_computed(2.0 * voigt.total_width()),
        fit_style: FitStyle::Lorentzians,
        snr,
        iterations,
    }
}
