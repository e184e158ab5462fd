//! likelihood::resolve — the neutral fraction at one redshift of interest.
//!
//! The Planck, McGreer and Greig terms all need the simulated neutral
//! fraction at a redshift that may or may not be on the simulated grid.
//!
//! Resolution order
//! ----------------
//! 1. Exact match: the first grid redshift equal to the target (index
//!    order) supplies the tabulated value directly.
//! 2. Otherwise at least 3 samples are required, else
//!    `LikelihoodError::InsufficientRedshifts`.
//! 3. [`ResolvePolicy::Linear`] fits a degree-1 spline and extrapolates
//!    linearly beyond the grid.
//!    [`ResolvePolicy::Greig`] does the same when the target lies below the
//!    lowest simulated redshift, and otherwise fits a smoother spline whose
//!    degree is 2 for exactly 3 samples and 3 beyond.
//!
//! The resolved value is clamped to `[0, 1]`.
use crate::interpolation::{Spline, clamp_unit, spline_degree_for};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Minimum number of samples needed to interpolate.
pub const MIN_INTERPOLATION_SAMPLES: usize = 3;

/// How to resolve a value that is not on the simulated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePolicy {
    Linear,
    Greig,
}

/// Index of the first entry of `redshifts` exactly equal to `z`.
pub fn first_exact_match(redshifts: &[f64], z: f64) -> Option<usize> {
    redshifts.iter().position(|&r| r == z)
}

/// Resolve `values` (sampled on `redshifts`) at `z`, clamped to `[0, 1]`.
///
/// Errors
/// ------
/// - `LikelihoodError::ShapeMismatch` when `values` and `redshifts` differ
///   in length.
/// - `LikelihoodError::InsufficientRedshifts` when `z` is not on the grid
///   and fewer than 3 samples are available.
/// - `LikelihoodError::Spline` when the grid is not strictly monotone or
///   contains non-finite values.
pub fn resolve_at(
    term: &'static str, redshifts: &[f64], values: &[f64], z: f64, policy: ResolvePolicy,
) -> LikelihoodResult<f64> {
    if values.len() != redshifts.len() {
        return Err(LikelihoodError::ShapeMismatch {
            what: "resolved values",
            expected: redshifts.len(),
            found: values.len(),
        });
    }
    if let Some(i) = first_exact_match(redshifts, z) {
        return Ok(clamp_unit(values[i]));
    }
    let n = redshifts.len();
    if n < MIN_INTERPOLATION_SAMPLES {
        return Err(LikelihoodError::InsufficientRedshifts { term, found: n, target: z });
    }

    let degree = match policy {
        ResolvePolicy::Linear => 1,
        ResolvePolicy::Greig => {
            let z_min = redshifts.iter().copied().fold(f64::INFINITY, f64::min);
            if z < z_min { 1 } else { spline_degree_for(n) }
        }
    };
    let spline = Spline::interpolating(redshifts, values, degree)?;
    Ok(clamp_unit(spline.eval(z)))
}
