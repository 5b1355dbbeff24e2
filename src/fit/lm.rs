//! Bounded nonlinear least-squares fitting (Levenberg–Marquardt).
//!
//! The optimizer minimizes `Σ (y_i - f(x_i))²` where
//! `f(x) = background(x) + Σ peak_k(x)`, over the *unconstrained* variables
//! `z`; every physical parameter is produced by the bound map
//! (`math::bound`), so no step can leave its physical interval and no
//! constrained solver is needed.
//!
//! Implementation notes:
//! - the Jacobian is computed by forward finite differences on the residual
//!   vector; the parameter dimension is tiny (9 or 15), so the extra
//!   residual evaluations dominate nothing
//! - the damping factor λ scales the normal-equation diagonal (Marquardt
//!   form); it shrinks ×0.1 on accepted steps and grows ×10 on rejected ones
//! - the damped normal equations are solved by SVD with progressively looser
//!   tolerances, accepting the first finite solution; near-singular systems
//!   (e.g. a peak pinned against its bound) then simply escalate λ
//! - hitting the iteration cap is an outcome, not an error: the best
//!   parameters found so far are returned with `ExceededCap`

use nalgebra::{DMatrix, DVector};

use crate::domain::{
    FitOutcome, FittedModel, IterationCount, LinearBackground, ModelFamily, PeakParams, Spectrum,
};
use crate::fit::init::PeakSeed;
use crate::math::amp;
use crate::models::predict;

/// Relative forward-difference step for the Jacobian.
const FD_STEP: f64 = 1e-8;

/// Floor for diagonal damping entries, so a flat direction still gets damped.
const DIAG_FLOOR: f64 = 1e-12;

/// Optimizer knobs. Tolerance and cap come from the model family; the λ
/// schedule is shared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmSettings {
    /// Relative SSE-reduction threshold for convergence.
    pub ftol: f64,
    /// Outer-iteration cap (one Jacobian evaluation per iteration).
    pub max_iterations: u64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// λ above this means no step can improve the objective; the fit stops.
    pub max_lambda: f64,
    pub min_lambda: f64,
}

impl LmSettings {
    pub fn for_family(family: ModelFamily) -> Self {
        Self {
            ftol: family.ftol(),
            max_iterations: family.iteration_cap(),
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e12,
            min_lambda: 1e-12,
        }
    }
}

/// Fit the given family to a spectrum with the family's default settings.
pub fn fit(
    family: ModelFamily,
    spectrum: &Spectrum,
    background: &LinearBackground,
    seeds: &[PeakSeed],
) -> FittedModel {
    fit_with_settings(
        family,
        spectrum,
        background,
        seeds,
        LmSettings::for_family(family),
    )
}

/// Fit with explicit settings (tests shrink the cap through this).
pub fn fit_with_settings(
    family: ModelFamily,
    spectrum: &Spectrum,
    background: &LinearBackground,
    seeds: &[PeakSeed],
    settings: LmSettings,
) -> FittedModel {
    let mut z: Vec<f64> = Vec::with_capacity(seeds.len() * 3);
    for seed in seeds {
        z.push(seed.z_amplitude);
        z.push(seed.z_location);
        z.push(seed.z_width);
    }

    let mut residual = residuals(family, spectrum, background, seeds, &z);
    let mut sse = residual.norm_squared();
    let mut lambda = settings.initial_lambda;
    let mut converged = false;
    let mut iterations: u64 = 0;

    while iterations < settings.max_iterations && !converged {
        iterations += 1;

        let jac = jacobian(family, spectrum, background, seeds, &z, &residual);
        let a = jac.transpose() * &jac;
        let g = jac.transpose() * &residual;

        // Try steps with increasing damping until one reduces the objective
        // or λ tells us no step can.
        loop {
            let Some(delta) = solve_damped(&a, &g, lambda) else {
                lambda *= settings.lambda_up;
                if lambda > settings.max_lambda {
                    converged = true;
                    break;
                }
                continue;
            };

            let z_trial: Vec<f64> = z.iter().zip(delta.iter()).map(|(zi, di)| zi + di).collect();
            let r_trial = residuals(family, spectrum, background, seeds, &z_trial);
            let sse_trial = r_trial.norm_squared();

            if sse_trial.is_finite() && sse_trial <= sse {
                let reduction = if sse > 0.0 { (sse - sse_trial) / sse } else { 0.0 };
                z = z_trial;
                residual = r_trial;
                sse = sse_trial;
                lambda = (lambda * settings.lambda_down).max(settings.min_lambda);
                if reduction < settings.ftol {
                    converged = true;
                }
                break;
            }

            lambda *= settings.lambda_up;
            if lambda > settings.max_lambda {
                // The objective cannot be reduced any further from here;
                // the relative reduction is zero, which satisfies ftol.
                converged = true;
                break;
            }
        }
    }

    let iterations = if converged {
        IterationCount::Count(iterations)
    } else {
        IterationCount::ExceededCap(settings.max_iterations)
    };

    FittedModel {
        family,
        background: *background,
        peaks: map_peaks(seeds, &z),
        outcome: FitOutcome {
            converged: matches!(iterations, IterationCount::Count(_)),
            iterations,
            sse,
        },
    }
}

/// Map the unconstrained vector into physical peak parameters.
fn map_peaks(seeds: &[PeakSeed], z: &[f64]) -> Vec<PeakParams> {
    seeds
        .iter()
        .enumerate()
        .map(|(k, seed)| PeakParams {
            amplitude: amp(z[3 * k]),
            location: seed.location_bound.apply(z[3 * k + 1]),
            width: seed.width_bound.apply(z[3 * k + 2]),
        })
        .collect()
}

fn residuals(
    family: ModelFamily,
    spectrum: &Spectrum,
    background: &LinearBackground,
    seeds: &[PeakSeed],
    z: &[f64],
) -> DVector<f64> {
    let peaks = map_peaks(seeds, z);
    DVector::from_iterator(
        spectrum.points.len(),
        spectrum
            .points
            .iter()
            .map(|pt| pt.intensity - predict(family, pt.wavenumber, background, &peaks)),
    )
}

/// Forward-difference Jacobian of the residual vector.
fn jacobian(
    family: ModelFamily,
    spectrum: &Spectrum,
    background: &LinearBackground,
    seeds: &[PeakSeed],
    z: &[f64],
    residual: &DVector<f64>,
) -> DMatrix<f64> {
    let n = spectrum.points.len();
    let p = z.len();
    let mut jac = DMatrix::zeros(n, p);
    let mut z_step = z.to_vec();

    for j in 0..p {
        let h = FD_STEP * (1.0 + z[j].abs());
        z_step[j] = z[j] + h;
        let r_step = residuals(family, spectrum, background, seeds, &z_step);
        z_step[j] = z[j];

        for i in 0..n {
            jac[(i, j)] = (r_step[i] - residual[i]) / h;
        }
    }

    jac
}

/// Solve `(A + λ·diag(A)) δ = -g` by SVD with progressively looser
/// tolerances, accepting the first finite solution.
fn solve_damped(a: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let p = a.nrows();
    let mut m = a.clone();
    for i in 0..p {
        m[(i, i)] = a[(i, i)] + lambda * a[(i, i)].max(DIAG_FLOOR);
    }

    let svd = m.svd(true, true);
    let rhs = -g;
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(delta) = svd.solve(&rhs, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }
    None
}
