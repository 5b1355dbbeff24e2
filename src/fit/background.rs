//! Linear background estimation and the noise gate.
//!
//! The baseline is a straight line through the spectrum's two endpoints.
//! Spectrum files are stored high-wavenumber-first, so the *first* record is
//! the high end and the *last* record the low end; the slope/intercept
//! formulas below assume exactly that ordering and must not be "fixed" to be
//! order-independent.
//!
//! The noise gate compares the strongest background-subtracted signal in the
//! first-order region against the peak-to-peak excursion of a flat reference
//! window with no Raman bands. Spectra below the integer SNR threshold are
//! classified, recorded, and never fitted.

use crate::domain::{LinearBackground, Spectrum};
use crate::error::AppError;

/// Flat reference region used as the noise yardstick (cm⁻¹).
const NOISE_WINDOW: (f64, f64) = (1740.0, 1830.0);

/// First-order region scanned for the strongest band (cm⁻¹).
const SIGNAL_WINDOW: (f64, f64) = (1200.0, 1790.0);

/// Estimate the linear background from the spectrum's endpoints.
pub fn estimate_background(spectrum: &Spectrum) -> Result<LinearBackground, AppError> {
    if spectrum.points.len() < 2 {
        return Err(AppError::new(
            3,
            format!(
                "Spectrum '{}' has {} point(s); need at least 2 to estimate a background.",
                spectrum.name,
                spectrum.points.len()
            ),
        ));
    }

    let first = spectrum.points[0];
    let last = spectrum.points[spectrum.points.len() - 1];

    let slope = (first.intensity - last.intensity) / (first.wavenumber - last.wavenumber);
    let intercept = last.intensity - slope * last.wavenumber;

    Ok(LinearBackground { intercept, slope })
}

/// Result of the signal-to-noise check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseCheck {
    /// Integer SNR, truncated toward zero.
    pub snr: i64,
    /// Max intensity in the flat reference window.
    pub noise_high: f64,
    /// Min intensity in the flat reference window.
    pub noise_low: f64,
    /// Strongest background-subtracted intensity in the signal window.
    pub signal_peak: f64,
}

impl NoiseCheck {
    pub fn is_noisy(&self, threshold: i64) -> bool {
        self.snr < threshold
    }
}

/// Compute the integer SNR of a spectrum against its background.
pub fn check_noise(
    spectrum: &Spectrum,
    background: &LinearBackground,
) -> Result<NoiseCheck, AppError> {
    let noise_high = spectrum
        .max_in_window(NOISE_WINDOW.0, NOISE_WINDOW.1)
        .ok_or_else(|| no_window_err(spectrum, "noise reference", NOISE_WINDOW))?
        .intensity;
    let noise_low = spectrum
        .min_in_window(NOISE_WINDOW.0, NOISE_WINDOW.1)
        .ok_or_else(|| no_window_err(spectrum, "noise reference", NOISE_WINDOW))?
        .intensity;

    let signal = spectrum
        .max_in_window(SIGNAL_WINDOW.0, SIGNAL_WINDOW.1)
        .ok_or_else(|| no_window_err(spectrum, "signal", SIGNAL_WINDOW))?;
    let signal_peak = signal.intensity - background.value_at(signal.wavenumber);

    // Integer truncation toward zero, per the SNR definition. A perfectly
    // flat reference window makes the quotient non-finite; the cast then
    // saturates, which never classifies the spectrum as noisy.
    let snr = (signal_peak / (noise_high - noise_low)) as i64;

    Ok(NoiseCheck {
        snr,
        noise_high,
        noise_low,
        signal_peak,
    })
}

fn no_window_err(spectrum: &Spectrum, what: &str, window: (f64, f64)) -> AppError {
    AppError::new(
        3,
        format!(
            "Spectrum '{}' has no points in the {what} window [{}, {}] cm⁻¹.",
            spectrum.name, window.0, window.1
        ),
    )
}
