//! Spectrum file ingest.
//!
//! Input files are two-column whitespace-separated ASCII text, one
//! `(wavenumber, intensity)` pair per line, with the high-wavenumber end on
//! the *first* line. The order is preserved exactly: the background formula
//! depends on which endpoint is which.
//!
//! Design goals (shared with the ledger):
//! - line-level validation with line numbers in every error
//! - deterministic behavior, no normalization or resampling
//! - no fitting logic here

use std::fs;
use std::path::Path;

use crate::domain::{Spectrum, SpectrumPoint};
use crate::error::AppError;

/// Load a spectrum file. The sample name is the file stem.
pub fn read_spectrum(path: &Path) -> Result<Spectrum, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new(
            3,
            format!("Failed to read spectrum '{}': {e}", path.display()),
        )
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    if name.is_empty() {
        return Err(AppError::new(
            3,
            format!("Cannot derive a sample name from '{}'.", path.display()),
        ));
    }

    let mut points = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(wn), Some(int)) = (fields.next(), fields.next()) else {
            return Err(parse_err(path, idx + 1, "expected two columns"));
        };

        let wavenumber: f64 = wn
            .parse()
            .map_err(|_| parse_err(path, idx + 1, "invalid wavenumber"))?;
        let intensity: f64 = int
            .parse()
            .map_err(|_| parse_err(path, idx + 1, "invalid intensity"))?;
        if !(wavenumber.is_finite() && intensity.is_finite()) {
            return Err(parse_err(path, idx + 1, "non-finite value"));
        }

        points.push(SpectrumPoint {
            wavenumber,
            intensity,
        });
    }

    if points.is_empty() {
        return Err(AppError::new(
            3,
            format!("Spectrum '{}' contains no data lines.", path.display()),
        ));
    }

    Ok(Spectrum { name, points })
}

fn parse_err(path: &Path, line: usize, what: &str) -> AppError {
    AppError::new(
        3,
        format!("{}:{line}: {what}.", path.display()),
    )
}
