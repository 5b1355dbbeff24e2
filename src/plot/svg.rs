//! Per-sample SVG rendering.
//!
//! Rendering is a side effect that runs strictly after a sample is
//! finalized; a render failure is logged by the caller and never fails the
//! sample. Noisy spectra get a raw-data-only chart; fitted spectra get the
//! decomposition: raw data, linear background, each peak component over the
//! background, and the model sum.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{FittedModel, Spectrum};
use crate::error::AppError;
use crate::models::{peak_value, predict};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 640;

/// Render the raw spectrum only (noise-gated samples).
pub fn render_raw(path: &Path, spectrum: &Spectrum) -> Result<(), AppError> {
    render(path, spectrum, None)
}

/// Render the raw spectrum with its fitted decomposition.
pub fn render_decomposition(
    path: &Path,
    spectrum: &Spectrum,
    model: &FittedModel,
) -> Result<(), AppError> {
    render(path, spectrum, Some(model))
}

fn render(path: &Path, spectrum: &Spectrum, model: Option<&FittedModel>) -> Result<(), AppError> {
    let data: Vec<(f64, f64)> = spectrum
        .points
        .iter()
        .map(|p| (p.wavenumber, p.intensity))
        .collect();

    let (x0, x1) = match data.iter().map(|&(x, _)| x).fold(None, min_max) {
        Some(range) => range,
        None => return Err(AppError::new(4, "Cannot render an empty spectrum.")),
    };
    let (mut y0, mut y1) = data
        .iter()
        .map(|&(_, y)| y)
        .fold(None, min_max)
        .unwrap_or((0.0, 1.0));
    if y1 <= y0 {
        y1 = y0 + 1.0;
    }
    // Headroom so the trace doesn't touch the frame.
    let pad = 0.05 * (y1 - y0);
    y0 -= pad;
    y1 += pad;

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AppError::new(4, format!("Failed to render '{}': {e}", path.display())))?;

    let caption = match model {
        Some(m) => format!("{} - {}", spectrum.name, m.family.display_name()),
        None => format!("{} - raw spectrum (noisy)", spectrum.name),
    };

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&caption, ("sans-serif", 20).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Raman shift (1/cm)")
            .y_desc("intensity")
            .x_labels(8)
            .y_labels(6)
            .draw()?;

        // Raw data.
        chart.draw_series(LineSeries::new(data.iter().copied(), &BLACK))?;

        if let Some(model) = model {
            let grid: Vec<f64> = data.iter().map(|&(x, _)| x).collect();

            // Background line.
            chart.draw_series(LineSeries::new(
                grid.iter().map(|&x| (x, model.background.value_at(x))),
                &RGBColor(128, 128, 128),
            ))?;

            // Individual components over the background.
            for peak in &model.peaks {
                chart.draw_series(LineSeries::new(
                    grid.iter().map(|&x| {
                        (
                            x,
                            model.background.value_at(x) + peak_value(model.family, x, peak),
                        )
                    }),
                    &BLUE,
                ))?;
            }

            // Model sum.
            chart.draw_series(LineSeries::new(
                grid.iter()
                    .map(|&x| (x, predict(model.family, x, &model.background, &model.peaks))),
                &RED,
            ))?;
        }

        root.present()?;
        Ok(())
    })();

    result.map_err(|e| AppError::new(4, format!("Failed to render '{}': {e}", path.display())))
}

fn min_max(acc: Option<(f64, f64)>, v: f64) -> Option<(f64, f64)> {
    match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }
}
