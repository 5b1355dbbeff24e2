//! Peak-shape evaluation for the two model families.
//!
//! The fitter relies on two primitive operations:
//! - evaluate a single peak at a wavenumber (for residuals/Jacobians)
//! - predict the full model `background(x) + Σ peak_i(x)` (for residuals,
//!   plots, and exports)
//!
//! Shapes:
//! - Voigt family: `amp · K(x - loc, w)` with `K` the Voigt function
//!   (`math::voigt`). `amp` is the recorded band height.
//! - Lorentzian family: `amp · w² / ((x - loc)² + w²)`, so `amp` is exactly
//!   the height at the center.
//!
//! `w` is the half width at half maximum throughout the fit; the HWHM→FWHM
//! conversion happens once, at record finalization (`fit::metrics`).

use crate::domain::{LinearBackground, ModelFamily, PeakParams};
use crate::math::voigt;

/// Evaluate one peak of the given family at `x`.
pub fn peak_value(family: ModelFamily, x: f64, p: &PeakParams) -> f64 {
    match family {
        ModelFamily::Voigt3 => p.amplitude * voigt(x - p.location, p.width),
        ModelFamily::Lorentz5 => {
            let dx = x - p.location;
            p.amplitude * p.width * p.width / (dx * dx + p.width * p.width)
        }
    }
}

/// Predict the full model value at `x`.
pub fn predict(
    family: ModelFamily,
    x: f64,
    background: &LinearBackground,
    peaks: &[PeakParams],
) -> f64 {
    let mut y = background.value_at(x);
    for p in peaks {
        y += peak_value(family, x, p);
    }
    y
}
