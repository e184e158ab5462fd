//! interpolation::errors — failures raised while building interpolating splines.
//!
//! Purpose
//! -------
//! Give the spline layer its own small error surface so that numerical code
//! does not depend on the likelihood-level error type. Likelihood terms
//! convert these values into `LikelihoodError::Spline` through `From`.
//!
//! Conventions
//! -----------
//! - Indices are 0-based and refer to the caller's original ordering (before
//!   any internal reversal of decreasing inputs).
//! - Messages are phrased in terms of the violated constraint
//!   ("need at least k + 1 points", "x must be strictly monotone").

/// Result alias for spline construction.
pub type SplineResult<T> = Result<T, SplineError>;

/// SplineError — invalid input for an interpolating spline.
///
/// Variants
/// --------
/// - `InvalidDegree { degree }`
///   Supported degrees are 1 through 5.
/// - `TooFewPoints { degree, needed, found }`
///   A degree-`k` interpolant needs at least `k + 1` samples.
/// - `LengthMismatch { x_len, y_len }`
///   Abscissae and ordinates differ in length.
/// - `NonFinite { index, value }`
///   A sample (x or y) is NaN or ±∞.
/// - `NotMonotone { index }`
///   `x` is not strictly increasing or strictly decreasing at `index`.
/// - `SingularSystem`
///   The collocation system could not be solved.
#[derive(Debug, Clone, PartialEq)]
pub enum SplineError {
    InvalidDegree { degree: usize },
    TooFewPoints { degree: usize, needed: usize, found: usize },
    LengthMismatch { x_len: usize, y_len: usize },
    NonFinite { index: usize, value: f64 },
    NotMonotone { index: usize },
    SingularSystem,
}

impl std::error::Error for SplineError {}

impl std::fmt::Display for SplineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplineError::InvalidDegree { degree } => {
                write!(f, "Spline degree must satisfy 1 ≤ k ≤ 5; got: {degree}")
            }
            SplineError::TooFewPoints { degree, needed, found } => {
                write!(
                    f,
                    "A degree-{degree} interpolating spline needs at least {needed} points; got {found}"
                )
            }
            SplineError::LengthMismatch { x_len, y_len } => {
                write!(f, "x and y must have equal length: x has {x_len}, y has {y_len}")
            }
            SplineError::NonFinite { index, value } => {
                write!(f, "Spline sample at index {index} is non-finite: {value}")
            }
            SplineError::NotMonotone { index } => {
                write!(f, "x must be strictly monotone; violated at index {index}")
            }
            SplineError::SingularSystem => {
                write!(f, "Spline collocation system is singular")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // `TooFewPoints` reports both the requirement and the observed count.
    fn too_few_points_message_embeds_counts() {
        let err = SplineError::TooFewPoints { degree: 3, needed: 4, found: 2 };

        let msg = err.to_string();

        assert!(msg.contains('4') && msg.contains('2'), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // `NotMonotone` names the offending index.
    fn not_monotone_message_embeds_index() {
        let msg = SplineError::NotMonotone { index: 7 }.to_string();
        assert!(msg.contains('7'), "Got: {msg}");
    }
}
