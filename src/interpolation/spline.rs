//! interpolation::spline — interpolating B-splines with polynomial extrapolation.
//!
//! Purpose
//! -------
//! Fit a 1-D curve sampled at non-uniform points (redshifts, frequencies,
//! neutral fractions) and evaluate it anywhere on the real line. This is the
//! "CurveResampler" used by every likelihood term.
//!
//! Key behaviors
//! -------------
//! - [`Spline::interpolating`] builds a degree-`k` spline passing through every
//!   sample. Knots follow the FITPACK `s = 0` placement: for odd `k` the
//!   interior knots are the data points `x[(k+1)/2 .. m-(k+1)/2]`, for even
//!   `k` they are the midpoints between neighbouring samples. For `k = 3`
//!   this is the classic not-a-knot cubic; for `k = 1` it is piecewise-linear
//!   interpolation.
//! - Evaluation outside the sample range continues the boundary polynomial
//!   piece. For `k = 1` this is linear extrapolation, which the Planck,
//!   McGreer and Greig terms rely on.
//! - Strictly decreasing abscissae are accepted and reversed internally.
//!
//! Invariants & assumptions
//! ------------------------
//! - `1 ≤ k ≤ 5`, `m ≥ k + 1`, all samples finite, `x` strictly monotone.
//! - The fit is not constrained to any range; callers clamp afterwards.
//!
//! Conventions
//! -----------
//! - Basis functions are evaluated with the Cox–de Boor recursion in the
//!   triangular form of Piegl & Tiller (A2.2); the same routine is used for
//!   extrapolation, where it yields the polynomial continuation of the
//!   boundary span.
//! - The collocation system is dense and small (m ≤ a few hundred) and is
//!   solved once with an LU factorization from `nalgebra`.
use nalgebra::{DMatrix, DVector};

use crate::interpolation::errors::{SplineError, SplineResult};

/// Highest supported spline degree.
pub const MAX_DEGREE: usize = 5;

/// Spline — an interpolating B-spline `s(x) = Σ c_j B_{j,k}(x)`.
///
/// Fields
/// ------
/// - `knots`: full knot vector of length `m + k + 1` with `k + 1`-fold
///   boundary knots.
/// - `coefficients`: B-spline coefficients, one per sample.
/// - `degree`: polynomial degree `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
    degree: usize,
}

impl Spline {
    /// Build a degree-`degree` spline passing through every `(x[i], y[i])`.
    ///
    /// Errors
    /// ------
    /// - `SplineError::InvalidDegree` for `degree == 0` or `degree > 5`.
    /// - `SplineError::LengthMismatch` when `x.len() != y.len()`.
    /// - `SplineError::TooFewPoints` when `x.len() < degree + 1`.
    /// - `SplineError::NonFinite` for NaN/±∞ samples.
    /// - `SplineError::NotMonotone` when `x` is not strictly monotone.
    /// - `SplineError::SingularSystem` if the collocation solve fails.
    pub fn interpolating(x: &[f64], y: &[f64], degree: usize) -> SplineResult<Self> {
        if degree == 0 || degree > MAX_DEGREE {
            return Err(SplineError::InvalidDegree { degree });
        }
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch { x_len: x.len(), y_len: y.len() });
        }
        let m = x.len();
        if m < degree + 1 {
            return Err(SplineError::TooFewPoints { degree, needed: degree + 1, found: m });
        }
        for (index, &value) in x.iter().chain(y.iter()).enumerate() {
            if !value.is_finite() {
                return Err(SplineError::NonFinite { index: index % m, value });
            }
        }

        let (xs, ys) = ascending(x, y)?;
        let knots = interpolation_knots(&xs, degree);

        let mut a = DMatrix::<f64>::zeros(m, m);
        let mut basis = vec![0.0; degree + 1];
        for (row, &xi) in xs.iter().enumerate() {
            let span = find_span(&knots, degree, m, xi);
            basis_functions(&knots, degree, span, xi, &mut basis);
            for (r, &b) in basis.iter().enumerate() {
                a[(row, span - degree + r)] = b;
            }
        }

        let rhs = DVector::from_vec(ys);
        let coefficients = a.lu().solve(&rhs).ok_or(SplineError::SingularSystem)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SplineError::SingularSystem);
        }

        Ok(Self { knots, coefficients: coefficients.iter().copied().collect(), degree })
    }

    /// Piecewise-linear interpolant with linear extrapolation.
    pub fn linear(x: &[f64], y: &[f64]) -> SplineResult<Self> {
        Self::interpolating(x, y, 1)
    }

    /// Not-a-knot cubic interpolant.
    pub fn cubic(x: &[f64], y: &[f64]) -> SplineResult<Self> {
        Self::interpolating(x, y, 3)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Lower and upper end of the sampled domain.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Evaluate the spline at `x`, extrapolating past the domain edges.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.coefficients.len();
        let span = find_span(&self.knots, self.degree, n, x);
        let mut basis = vec![0.0; self.degree + 1];
        basis_functions(&self.knots, self.degree, span, x, &mut basis);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coefficients[span - self.degree + r])
            .sum()
    }

    /// Evaluate the spline at every point of `xs`.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Degree used for in-domain smoothing of a curve with `n_samples` points:
/// quadratic for exactly three samples, cubic otherwise.
pub fn spline_degree_for(n_samples: usize) -> usize {
    if n_samples == 3 { 2 } else { 3 }
}

/// Return `(x, y)` sorted ascending in `x`, rejecting non-strict ordering.
fn ascending(x: &[f64], y: &[f64]) -> SplineResult<(Vec<f64>, Vec<f64>)> {
    let increasing = x[1] > x[0];
    for i in 1..x.len() {
        let ok = if increasing { x[i] > x[i - 1] } else { x[i] < x[i - 1] };
        if !ok {
            return Err(SplineError::NotMonotone { index: i });
        }
    }
    if increasing {
        Ok((x.to_vec(), y.to_vec()))
    } else {
        Ok((x.iter().rev().copied().collect(), y.iter().rev().copied().collect()))
    }
}

fn interpolation_knots(x: &[f64], k: usize) -> Vec<f64> {
    let m = x.len();
    let mut knots = Vec::with_capacity(m + k + 1);
    knots.extend(std::iter::repeat(x[0]).take(k + 1));
    let offset = k / 2;
    for l in 0..(m - k - 1) {
        if k % 2 == 1 {
            knots.push(x[l + offset + 1]);
        } else {
            knots.push(0.5 * (x[l + offset] + x[l + offset + 1]));
        }
    }
    knots.extend(std::iter::repeat(x[m - 1]).take(k + 1));
    knots
}

/// Knot span `μ ∈ [k, n-1]` such that `t[μ] ≤ x < t[μ+1]`, clamped to the
/// first/last span outside the domain.
fn find_span(knots: &[f64], k: usize, n: usize, x: f64) -> usize {
    let interior = &knots[k + 1..n];
    k + interior.partition_point(|&t| t <= x)
}

fn basis_functions(knots: &[f64], k: usize, span: usize, x: f64, out: &mut [f64]) {
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    out[0] = 1.0;
    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = out[r] / (right[r + 1] + left[j - r]);
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
}
