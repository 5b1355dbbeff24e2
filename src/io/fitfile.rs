//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of one sample's decomposition:
//! - model family + fitted peak parameters (post-selection, HWHM widths)
//! - the linear background
//! - the fit outcome (convergence, iterations, SSE)
//! - a precomputed model grid for quick plotting
//!
//! Written only when `--export-fit` names a directory (which must already
//! exist; the core never creates directories).

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{FitStyle, FittedModel, Spectrum};
use crate::error::AppError;
use crate::models::predict;

/// Schema of a fit JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub sample: String,
    pub fit_style: String,
    pub model: FittedModel,
    pub grid: FitGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGrid {
    pub wavenumber: Vec<f64>,
    pub model_value: Vec<f64>,
}

/// Write a fit JSON file for one finalized sample.
pub fn write_fit_json(
    dir: &Path,
    spectrum: &Spectrum,
    style: FitStyle,
    model: &FittedModel,
) -> Result<(), AppError> {
    let path = dir.join(format!("{}.json", spectrum.name));
    let file = File::create(&path).map_err(|e| {
        AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display()))
    })?;

    // Evaluate the model on the spectrum's own wavenumber grid so the export
    // overlays the raw data exactly.
    let wavenumber: Vec<f64> = spectrum.points.iter().map(|p| p.wavenumber).collect();
    let model_value: Vec<f64> = wavenumber
        .iter()
        .map(|&x| predict(model.family, x, &model.background, &model.peaks))
        .collect();

    let fit = FitFile {
        tool: "rcm".to_string(),
        sample: spectrum.name.clone(),
        fit_style: style.ledger_label().to_string(),
        model: model.clone(),
        grid: FitGrid {
            wavenumber,
            model_value,
        },
    };

    serde_json::to_writer_pretty(file, &fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file back.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display()))
    })?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        FitOutcome, IterationCount, LinearBackground, ModelFamily, PeakParams, SpectrumPoint,
    };

    #[test]
    fn fit_json_round_trips() {
        let dir = std::env::temp_dir().join("raman-cm-fitfile-tests");
        std::fs::create_dir_all(&dir).unwrap();

        let spectrum = Spectrum {
            name: "roundtrip".to_string(),
            points: vec![
                SpectrumPoint {
                    wavenumber: 2000.0,
                    intensity: 1.0,
                },
                SpectrumPoint {
                    wavenumber: 1000.0,
                    intensity: 2.0,
                },
            ],
        };
        let model = FittedModel {
            family: ModelFamily::Lorentz5,
            background: LinearBackground {
                intercept: 0.5,
                slope: 0.0,
            },
            peaks: vec![
                PeakParams {
                    amplitude: 10.0,
                    location: 1580.0,
                    width: 20.0,
                };
                5
            ],
            outcome: FitOutcome {
                converged: true,
                iterations: IterationCount::Count(42),
                sse: 1.5,
            },
        };

        write_fit_json(&dir, &spectrum, FitStyle::Lorentzians, &model).unwrap();
        let read = read_fit_json(&dir.join("roundtrip.json")).unwrap();
        assert_eq!(read.sample, "roundtrip");
        assert_eq!(read.fit_style, "Lorentzians");
        assert_eq!(read.grid.wavenumber.len(), 2);
        assert_eq!(read.model.peaks.len(), 5);
        assert_eq!(read.model.outcome.iterations, IterationCount::Count(42));
    }
}
