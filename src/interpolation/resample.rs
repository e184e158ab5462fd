//! interpolation::resample — grid helpers and the `[0, 1]` clamp.
//!
//! Small, allocation-light helpers shared by the likelihood terms: evenly
//! spaced grids, resampling a curve onto a grid, and the post-hoc clamp that
//! keeps resampled neutral fractions physical. Out-of-range values produced
//! by the unconstrained fit are clamped silently; they reflect floating-point
//! noise near x_HI ≈ 0 or 1 rather than a misconfiguration.
use crate::interpolation::{errors::SplineResult, spline::Spline};

/// Clamp a resampled neutral fraction to `[0, 1]`.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// `n` evenly spaced points from `start` to `stop` inclusive.
///
/// Point `i` is `start + (stop - start) * i / (n - 1)`; `n == 1` yields
/// `[start]` and `n == 0` an empty vector.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n).map(|i| start + (stop - start) * i as f64 / (n - 1) as f64).collect(),
    }
}

/// Fit `(x, y)` with a degree-`degree` interpolating spline and evaluate it
/// at every point of `query`.
pub fn resample(x: &[f64], y: &[f64], degree: usize, query: &[f64]) -> SplineResult<Vec<f64>> {
    let spline = Spline::interpolating(x, y, degree)?;
    Ok(spline.eval_many(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    // Purpose
    // -------
    // The clamp maps adversarial values back into [0, 1].
    fn clamp_unit_bounds_values() {
        assert_eq!(clamp_unit(1.3), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }

    #[test]
    fn linspace_includes_both_ends() {
        let grid = linspace(5.9, 20.0, 15);

        assert_eq!(grid.len(), 15);
        assert_abs_diff_eq!(grid[0], 5.9);
        assert_abs_diff_eq!(grid[14], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grid[1] - grid[0], (20.0 - 5.9) / 14.0, epsilon = 1e-12);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Resampling a linear history then clamping keeps every value in [0, 1]
    // even where the raw extrapolation leaves the unit interval.
    fn resample_then_clamp_stays_in_unit_interval() {
        let z = [6.0, 7.0, 8.0];
        let xhi = [0.2, 0.6, 1.0];
        let grid = linspace(5.0, 12.0, 8);

        let raw = resample(&z, &xhi, 1, &grid).unwrap();

        assert!(raw.iter().any(|v| *v > 1.0 || *v < 0.0));
        assert!(raw.into_iter().map(clamp_unit).all(|v| (0.0..=1.0).contains(&v)));
    }
}
