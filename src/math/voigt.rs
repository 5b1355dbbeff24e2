//! The Voigt function `K(x, y)`.
//!
//! `K(x, y) = Re w(x + iy)` where `w` is the Faddeeva function; equivalently
//! it is the convolution of a unit-width Gaussian with a Lorentzian of
//! half-width `y`, normalized so that `∫ K(x, y) dx = √π` for every `y`.
//!
//! The Voigt peak family evaluates `amp · K(x - loc, w)` (`models::model`),
//! matching the fit engine this pipeline replaces.
//!
//! Implementation: Humlíček's four-region rational approximation (w4). It is
//! branch-deterministic, needs no lookup tables, and its ~1e-4 relative
//! accuracy is far below the residual noise of measured spectra. Valid for
//! `y > 0`; width bounds keep every call strictly positive.

use nalgebra::Complex;

/// Evaluate `K(x, y) = Re w(x + iy)` for `y > 0`.
pub fn voigt(x: f64, y: f64) -> f64 {
    let t = Complex::new(y, -x);
    let s = x.abs() + y;

    let w = if s >= 15.0 {
        // Region I: single-term asymptotic.
        t * 0.5641896 / (t * t + 0.5)
    } else if s >= 5.5 {
        // Region II: two-term rational.
        let u = t * t;
        t * (u * 0.5641896 + 1.410474) / (u * (u + 3.0) + 0.75)
    } else if y >= 0.195 * x.abs() - 0.176 {
        // Region III: four-term rational.
        let num = t * (t * (t * (t * 0.5642236 + 3.778987) + 11.96482) + 20.20933) + 16.4955;
        let den = t * (t * (t * (t * (t + 6.699398) + 21.69274) + 39.27121) + 38.82363) + 16.4955;
        num / den
    } else {
        // Region IV: rational correction subtracted from exp(t²).
        let u = t * t;
        let num = t
            * (36183.31
                - u * (3321.9905
                    - u * (1540.787
                        - u * (219.0313 - u * (35.76683 - u * (1.320522 - u * 0.56419))))));
        let den = 32066.6
            - u * (24322.84
                - u * (9022.228
                    - u * (2186.181 - u * (364.2191 - u * (61.57037 - u * (1.841439 - u))))));
        u.exp() - num / den
    };

    w.re
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Reference values are erfcx(y) = K(0, y), from the scaled complementary
    // error function tables.
    #[test]
    fn center_values_match_erfcx() {
        assert_relative_eq!(voigt(0.0, 0.5), 0.6156903441929259, max_relative = 5e-4);
        assert_relative_eq!(voigt(0.0, 1.0), 0.4275835761558070, max_relative = 5e-4);
        assert_relative_eq!(voigt(0.0, 10.0), 0.0561410701, max_relative = 5e-4);
    }

    #[test]
    fn wings_decay_like_a_lorentzian() {
        // Far from the center K(x, y) → y / (√π (x² + y²)).
        let y = 1.0;
        let x = 100.0;
        let expected = y / (std::f64::consts::PI.sqrt() * (x * x + y * y));
        assert_relative_eq!(voigt(x, y), expected, max_relative = 1e-3);
    }

    #[test]
    fn symmetric_in_x() {
        for &(x, y) in &[(0.7, 0.3), (3.0, 2.0), (12.0, 25.0)] {
            assert_relative_eq!(voigt(x, y), voigt(-x, y), max_relative = 1e-12);
        }
    }

    #[test]
    fn positive_and_decreasing_from_center() {
        let y = 15.0;
        let mut prev = voigt(0.0, y);
        assert!(prev > 0.0);
        for i in 1..200 {
            let v = voigt(i as f64 * 0.5, y);
            assert!(v > 0.0);
            assert!(v <= prev, "K must decrease away from the center");
            prev = v;
        }
    }

    #[test]
    fn integral_is_sqrt_pi() {
        // Trapezoidal integral over a wide range; the wings are O(1/x²) so the
        // truncation error at |x| = 4000 is small but not negligible; keep a
        // loose tolerance.
        let y = 20.0;
        let (a, b, n) = (-4000.0, 4000.0, 160_000);
        let h = (b - a) / n as f64;
        let mut sum = 0.5 * (voigt(a, y) + voigt(b, y));
        for i in 1..n {
            sum += voigt(a + i as f64 * h, y);
        }
        let integral = sum * h;
        assert_relative_eq!(integral, std::f64::consts::PI.sqrt(), max_relative = 1e-2);
    }
}
