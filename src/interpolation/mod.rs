//! interpolation — curve resampling for simulated histories and mock data.
//!
//! Purpose
//! -------
//! Turn a curve sampled on a non-uniform grid (redshift, frequency, neutral
//! fraction) into a function that can be evaluated at the points an
//! observational constraint cares about.
//!
//! Key behaviors
//! -------------
//! - [`Spline`]: interpolating B-splines of degree 1–5 with polynomial
//!   extrapolation past the sampled domain.
//! - [`spline_degree_for`]: the degree policy for in-domain smoothing
//!   (quadratic with three samples, cubic otherwise).
//! - [`clamp_unit`], [`linspace`], [`resample`]: grid and clamp helpers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite and strictly monotone; violations are reported as
//!   [`SplineError`] values, never panics.
//! - Nothing here clamps implicitly; callers decide where physical bounds
//!   apply.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`spline`] check polynomial reproduction, extrapolation,
//!   decreasing inputs and every error branch; [`resample`] covers the clamp
//!   invariant on adversarial extrapolations.

pub mod errors;
pub mod resample;
pub mod spline;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{SplineError, SplineResult};
pub use self::resample::{clamp_unit, linspace, resample};
pub use self::spline::{Spline, spline_degree_for};
