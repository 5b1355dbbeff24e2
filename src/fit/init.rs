//! Initial-parameter estimation for each peak family.
//!
//! For every band the initializer scans a fixed wavenumber window for the
//! maximum intensity, subtracts the local background to get a height
//! estimate, and records the location of that maximum. The physical guesses
//! are then inverted through the bound map (`math::bound`) to seed the
//! optimizer's unconstrained variables.
//!
//! Seeding conventions:
//! - amplitude seeds are deliberately biased upward (×10 for the Voigt
//!   model, ×15 for the stiffer 5-peak Lorentzian model) so the optimizer's
//!   first step moves downhill quickly; the scale never affects the fitted
//!   value, only the starting point
//! - width seeds start at `z = 0`, the exact midpoint of the width bound
//! - the D4 search window sits below its location bound; its seed passes
//!   through the non-injective branch of the bound map unmodified (see
//!   DESIGN.md)

use crate::domain::{LinearBackground, ModelFamily, PeakKind, Spectrum};
use crate::error::AppError;
use crate::math::Bound;

/// Per-peak windows, bounds, and seeded optimizer variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSeed {
    pub kind: PeakKind,
    pub location_bound: Bound,
    pub width_bound: Bound,
    /// Unconstrained seed for the amplitude variable (`amp(z) = |z|`).
    pub z_amplitude: f64,
    /// Unconstrained seed for the location variable.
    pub z_location: f64,
    /// Unconstrained seed for the width variable.
    pub z_width: f64,
}

/// Fixed search window and bounds for one band under one model family.
#[derive(Debug, Clone, Copy)]
struct PeakSetup {
    search_window: (f64, f64),
    location_bound: Bound,
    width_bound: Bound,
}

/// The fixed, non-negotiable per-band tables.
fn peak_setup(family: ModelFamily, kind: PeakKind) -> PeakSetup {
    let (search_window, location_bound, width_bound) = match (family, kind) {
        (ModelFamily::Voigt3, PeakKind::G) => ((1575.0, 1600.0), (1563.0, 1605.0), (0.1, 40.1)),
        (ModelFamily::Voigt3, PeakKind::D1) => ((1200.0, 1450.0), (1345.0, 1365.0), (0.1, 100.1)),
        (ModelFamily::Voigt3, PeakKind::D2) => ((1605.0, 1640.0), (1605.0, 1625.0), (0.1, 16.1)),
        (ModelFamily::Lorentz5, PeakKind::G) => ((1575.0, 1600.0), (1567.0, 1605.0), (1.0, 41.0)),
        (ModelFamily::Lorentz5, PeakKind::D1) => ((1350.0, 1370.0), (1300.0, 1450.0), (1.0, 101.0)),
        (ModelFamily::Lorentz5, PeakKind::D2) => ((1610.0, 1640.0), (1590.0, 1630.0), (1.0, 41.0)),
        (ModelFamily::Lorentz5, PeakKind::D3) => ((1490.0, 1510.0), (1475.0, 1525.0), (1.0, 101.0)),
        (ModelFamily::Lorentz5, PeakKind::D4) => ((1140.0, 1150.0), (1200.0, 1250.0), (1.0, 101.0)),
        (ModelFamily::Voigt3, PeakKind::D3 | PeakKind::D4) => {
            unreachable!("the Voigt model does not fit D3/D4")
        }
    };
    PeakSetup {
        search_window,
        location_bound: Bound::new(location_bound.0, location_bound.1),
        width_bound: Bound::new(width_bound.0, width_bound.1),
    }
}

/// Amplitude-seed bias factor for a model family.
fn amplitude_scale(family: ModelFamily) -> f64 {
    match family {
        ModelFamily::Voigt3 => 10.0,
        ModelFamily::Lorentz5 => 15.0,
    }
}

/// Build initial seeds for every band of the given family.
pub fn initial_guesses(
    family: ModelFamily,
    spectrum: &Spectrum,
    background: &LinearBackground,
) -> Result<Vec<PeakSeed>, AppError> {
    let scale = amplitude_scale(family);
    family
        .peaks()
        .iter()
        .map(|&kind| {
            let setup = peak_setup(family, kind);
            let (lo, hi) = setup.search_window;
            let best = spectrum.max_in_window(lo, hi).ok_or_else(|| {
                AppError::new(
                    3,
                    format!(
                        "Spectrum '{}' has no points in the {:?} search window [{lo}, {hi}] cm⁻¹.",
                        spectrum.name, kind
                    ),
                )
            })?;

            let height = best.intensity - background.value_at(best.wavenumber);

            Ok(PeakSeed {
                kind,
                location_bound: setup.location_bound,
                width_bound: setup.width_bound,
                // amp(z) = |z|, so the seed is the biased height itself.
                z_amplitude: scale * height,
                z_location: setup.location_bound.invert(best.wavenumber),
                z_width: 0.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpectrumPoint;
    use approx::assert_relative_eq;

    fn flat_spectrum_with_peak(center: f64, height: f64) -> Spectrum {
        // 800..2200 in 1 cm⁻¹ steps, high end first, with a narrow triangular
        // bump at `center`.
        let points = (0..=1400)
            .map(|i| {
                let wavenumber = 2200.0 - i as f64;
                let d = (wavenumber - center).abs();
                let intensity = if d < 5.0 { height * (1.0 - d / 5.0) } else { 0.0 };
                SpectrumPoint {
                    wavenumber,
                    intensity,
                }
            })
            .collect();
        Spectrum {
            name: "synthetic".to_string(),
            points,
        }
    }

    #[test]
    fn voigt_model_seeds_three_bands() {
        let s = flat_spectrum_with_peak(1360.0, 100.0);
        let bg = LinearBackground {
            intercept: 0.0,
            slope: 0.0,
        };
        let seeds = initial_guesses(ModelFamily::Voigt3, &s, &bg).unwrap();
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].kind, PeakKind::G);
        assert_eq!(seeds[1].kind, PeakKind::D1);
        assert_eq!(seeds[2].kind, PeakKind::D2);

        // D1's window max is the synthetic bump at 1360 with height 100,
        // biased ×10 into the amplitude seed.
        assert_relative_eq!(seeds[1].z_amplitude, 1000.0, max_relative = 1e-12);
        // Location seed round-trips to the found maximum.
        assert_relative_eq!(
            seeds[1].location_bound.apply(seeds[1].z_location),
            1360.0,
            max_relative = 1e-9
        );
        // Width seed starts at the bound midpoint.
        assert_relative_eq!(
            seeds[1].width_bound.apply(seeds[1].z_width),
            50.1,
            max_relative = 1e-12
        );
    }

    #[test]
    fn lorentzian_model_uses_the_stronger_bias() {
        let s = flat_spectrum_with_peak(1360.0, 100.0);
        let bg = LinearBackground {
            intercept: 0.0,
            slope: 0.0,
        };
        let seeds = initial_guesses(ModelFamily::Lorentz5, &s, &bg).unwrap();
        assert_eq!(seeds.len(), 5);
        let d1 = seeds.iter().find(|s| s.kind == PeakKind::D1).unwrap();
        assert_relative_eq!(d1.z_amplitude, 1500.0, max_relative = 1e-12);
    }

    #[test]
    fn d4_seed_reenters_its_location_bound() {
        let s = flat_spectrum_with_peak(1360.0, 100.0);
        let bg = LinearBackground {
            intercept: 0.0,
            slope: 0.0,
        };
        let seeds = initial_guesses(ModelFamily::Lorentz5, &s, &bg).unwrap();
        let d4 = seeds.iter().find(|s| s.kind == PeakKind::D4).unwrap();
        // The search window [1140, 1150] lies outside the bound [1200, 1250];
        // the mapped seed must still land inside the bound.
        let loc = d4.location_bound.apply(d4.z_location);
        assert!(loc > 1200.0 && loc < 1250.0, "D4 seed location {loc}");
    }

    #[test]
    fn height_below_background_seeds_a_negative_z() {
        // A window whose maximum sits below the baseline yields a negative
        // height estimate; amp(z) = |z| still keeps the amplitude physical.
        let s = flat_spectrum_with_peak(1360.0, 100.0);
        let bg = LinearBackground {
            intercept: 50.0,
            slope: 0.0,
        };
        let seeds = initial_guesses(ModelFamily::Voigt3, &s, &bg).unwrap();
        let g = seeds.iter().find(|s| s.kind == PeakKind::G).unwrap();
        assert!(g.z_amplitude < 0.0);
        assert!(crate::math::amp(g.z_amplitude) > 0.0);
    }
}
