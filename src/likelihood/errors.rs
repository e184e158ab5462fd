//! likelihood::errors — the crate-wide error type for likelihood evaluation.
//!
//! Purpose
//! -------
//! Provide [`LikelihoodError`] and [`LikelihoodResult`] for every fallible
//! operation in the crate: loading observational data, validating simulator
//! output, configuring terms and evaluating them. A conversion into `PyErr`
//! is provided when the `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - All variants describe configuration problems: missing or malformed input
//!   files, too few simulated redshifts, inconsistent array shapes, invalid
//!   options, or an unavailable numerical backend. They are raised
//!   immediately and are never retried.
//! - Numerical degeneracies (neutral fractions outside `[0, 1]`, a
//!   non-positive interpolated PDF) are not errors; the terms clamp or floor
//!   them in place.
//! - Spline construction failures arrive through `From<SplineError>`.
//!
//! Conventions
//! -----------
//! - `term` payloads carry the static name of the likelihood term that raised
//!   the error so that a driver juggling many terms can report which one is
//!   misconfigured.
//! - I/O and JSON failures are stored as strings to keep the enum `Clone` and
//!   `PartialEq`.
//!
//! Testing notes
//! -------------
//! - Unit tests below check that `Display` messages embed their payloads and
//!   that `SplineError` converts losslessly.
use std::path::{Path, PathBuf};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::interpolation::errors::SplineError;

/// Crate-wide result alias.
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

/// Unified error type for likelihood configuration and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    // ---- Simulated redshift coverage ----
    /// Fewer than three simulated redshifts and no exact match at `target`.
    InsufficientRedshifts { term: &'static str, found: usize, target: f64 },

    /// A co-eval term was asked for a redshift the simulator did not output.
    RedshiftNotSimulated { term: &'static str, redshift: f64 },

    // ---- Files ----
    /// A required data or cache file does not exist.
    MissingFile { path: PathBuf },

    /// A data file exists but a row could not be parsed.
    MalformedFile { path: PathBuf, line: usize, reason: String },

    /// Any other I/O failure while reading or writing a file.
    Io { path: PathBuf, message: String },

    /// A JSON cache file could not be decoded.
    Json { path: PathBuf, message: String },

    // ---- Shapes and fields ----
    /// Two arrays that must agree in length do not.
    ShapeMismatch { what: &'static str, expected: usize, found: usize },

    /// The simulator output lacks a field the term needs.
    MissingField { term: &'static str, field: &'static str },

    // ---- Configuration ----
    /// A lightcone term was configured with a non-lightcone simulation.
    LightconeRequired { term: &'static str },

    /// The crate was built without a backend the term needs.
    MissingDependency { term: &'static str, feature: &'static str },

    /// The configured redshift window masks out every lightcone slice.
    EmptyRedshiftWindow { term: &'static str },

    /// The configured k window excludes every mock data bin.
    EmptyKWindow { term: &'static str, min_k: f64, max_k: f64 },

    /// An option value violates its documented constraint.
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Numerical backends ----
    /// Spline construction failed.
    Spline(SplineError),

    /// An external simulator or numerical service reported a failure.
    Simulation { message: String },
}

impl LikelihoodError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            LikelihoodError::MissingFile { path: path.to_path_buf() }
        } else {
            LikelihoodError::Io { path: path.to_path_buf(), message: err.to_string() }
        }
    }
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodError::InsufficientRedshifts { term, found, target } => write!(
                f,
                "{term}: need at least 3 simulated redshifts or an exact match at z = {target}; got {found} redshifts"
            ),
            LikelihoodError::RedshiftNotSimulated { term, redshift } => {
                write!(f, "{term}: redshift {redshift} is not among the simulated redshifts")
            }
            LikelihoodError::MissingFile { path } => {
                write!(f, "Required file does not exist: {}", path.display())
            }
            LikelihoodError::MalformedFile { path, line, reason } => {
                write!(f, "Malformed data in {} at line {line}: {reason}", path.display())
            }
            LikelihoodError::Io { path, message } => {
                write!(f, "I/O error on {}: {message}", path.display())
            }
            LikelihoodError::Json { path, message } => {
                write!(f, "Invalid JSON in {}: {message}", path.display())
            }
            LikelihoodError::ShapeMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}")
            }
            LikelihoodError::MissingField { term, field } => {
                write!(f, "{term}: simulation output has no `{field}`")
            }
            LikelihoodError::LightconeRequired { term } => {
                write!(f, "{term}: a lightcone simulation is required for this likelihood")
            }
            LikelihoodError::MissingDependency { term, feature } => {
                write!(f, "{term}: built without the `{feature}` feature and no backend was supplied")
            }
            LikelihoodError::EmptyRedshiftWindow { term } => {
                write!(f, "{term}: the redshift window excludes every lightcone slice")
            }
            LikelihoodError::EmptyKWindow { term, min_k, max_k } => {
                write!(f, "{term}: no mock data bins within k ∈ [{min_k}, {max_k}]")
            }
            LikelihoodError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid option `{name}` = {value}: {reason}")
            }
            LikelihoodError::Spline(err) => write!(f, "Interpolation failed: {err}"),
            LikelihoodError::Simulation { message } => {
                write!(f, "Simulator failure: {message}")
            }
        }
    }
}

impl From<SplineError> for LikelihoodError {
    fn from(err: SplineError) -> Self {
        LikelihoodError::Spline(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<LikelihoodError> for PyErr {
    fn from(err: LikelihoodError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - `Display` payload embedding for representative variants.
    // - `From<SplineError>` and the NotFound → MissingFile mapping.
    //
    // The PyO3 conversion is exercised from Python, not here.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The insufficient-redshift message names the term, the count and the
    // target redshift.
    fn insufficient_redshifts_message_embeds_payload() {
        let err = LikelihoodError::InsufficientRedshifts { term: "Planck", found: 2, target: 5.9 };

        let msg = err.to_string();

        assert!(msg.contains("Planck") && msg.contains('2') && msg.contains("5.9"), "Got: {msg}");
    }

    #[test]
    fn missing_file_message_contains_path() {
        let err = LikelihoodError::MissingFile { path: PathBuf::from("/nowhere/pdf.json") };
        assert!(err.to_string().contains("/nowhere/pdf.json"));
    }

    #[test]
    // Purpose
    // -------
    // `std::io::ErrorKind::NotFound` is reported as a missing file; other
    // kinds keep the I/O message.
    fn io_errors_are_classified_by_kind() {
        let path = Path::new("data.txt");

        let missing = LikelihoodError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound));
        let denied =
            LikelihoodError::io(path, std::io::Error::from(std::io::ErrorKind::PermissionDenied));

        assert!(matches!(missing, LikelihoodError::MissingFile { .. }));
        assert!(matches!(denied, LikelihoodError::Io { .. }));
    }

    #[test]
    fn spline_errors_convert() {
        let err: LikelihoodError = SplineError::SingularSystem.into();
        assert_eq!(err, LikelihoodError::Spline(SplineError::SingularSystem));
    }
}
