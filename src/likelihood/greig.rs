//! likelihood::greig — QSO damping-wing constraint at z = 7.0842.
//!
//! Purpose
//! -------
//! Evaluate the tabulated posterior PDF of the IGM neutral fraction inferred
//! from the damping wing of ULAS J1120+0641 (Greig et al. 2016) at the
//! simulated neutral fraction, and return `-2 ln p`.
//!
//! Key behaviors
//! -------------
//! - [`GreigOptions::setup`] loads the [`PriorTable`] once from the cache
//!   directory and fits the cubic PDF spline; a missing cache is a fatal
//!   setup error.
//! - The neutral fraction at the QSO redshift is resolved with
//!   [`ResolvePolicy::Greig`] and clamped to `[0, 1]`.
//! - The cubic PDF spline can undershoot below zero near `x_HI ≈ 0` or `1`;
//!   any density `≤ 0` is replaced by the floor `6e-6` before the logarithm.
use std::path::PathBuf;

use log::{debug, trace};

use crate::data::{PriorTable, default_data_dir};
use crate::interpolation::Spline;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::resolve::{ResolvePolicy, resolve_at};
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::SimulationOutput;

/// GreigOptions — cache location, QSO redshift and PDF floor.
///
/// Fields
/// ------
/// - `cache_dir`: directory holding `PriorData/` (default `$HOME/.py21cmmc`).
/// - `qso_redshift`: redshift of the quasar (7.0842).
/// - `pdf_floor`: density substituted for non-positive PDF values (6e-6).
#[derive(Debug, Clone, PartialEq)]
pub struct GreigOptions {
    pub cache_dir: PathBuf,
    pub qso_redshift: f64,
    pub pdf_floor: f64,
}

impl GreigOptions {
    pub fn new(cache_dir: PathBuf, qso_redshift: f64, pdf_floor: f64) -> LikelihoodResult<Self> {
        if !(pdf_floor.is_finite() && pdf_floor > 0.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "pdf_floor",
                value: pdf_floor,
                reason: "must be finite and > 0",
            });
        }
        if !qso_redshift.is_finite() {
            return Err(LikelihoodError::InvalidOption {
                name: "qso_redshift",
                value: qso_redshift,
                reason: "must be finite",
            });
        }
        Ok(Self { cache_dir, qso_redshift, pdf_floor })
    }

    /// Load the cached PDF and build the ready term.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::MissingFile` if either cache file is absent.
    /// - `LikelihoodError::Json` / `ShapeMismatch` for a corrupt cache.
    /// - `LikelihoodError::Spline` if the table cannot be fitted.
    pub fn setup(&self) -> LikelihoodResult<GreigQsoDampingWing> {
        let table = PriorTable::load(&self.cache_dir)?;
        debug!(
            "{}: damping-wing PDF with {} points loaded from {}",
            GreigQsoDampingWing::NAME,
            table.x_values().len(),
            self.cache_dir.display()
        );
        GreigQsoDampingWing::from_table(self.clone(), &table)
    }
}

impl Default for GreigOptions {
    fn default() -> Self {
        Self { cache_dir: default_data_dir(), qso_redshift: 7.0842, pdf_floor: 6.0e-6 }
    }
}

/// GreigQsoDampingWing — the ready Greig term owning its PDF spline.
#[derive(Debug, Clone, PartialEq)]
pub struct GreigQsoDampingWing {
    options: GreigOptions,
    pdf: Spline,
}

impl GreigQsoDampingWing {
    pub const NAME: &'static str = "Greig";

    /// Build the term from an already loaded table.
    pub fn from_table(options: GreigOptions, table: &PriorTable) -> LikelihoodResult<Self> {
        let pdf = Spline::cubic(table.x_values(), table.pdf_values())?;
        Ok(Self { options, pdf })
    }

    pub fn options(&self) -> &GreigOptions {
        &self.options
    }

    /// PDF value at `x_hi`, floored when the spline is non-positive.
    pub fn density(&self, x_hi: f64) -> f64 {
        let p = self.pdf.eval(x_hi);
        if p > 0.0 { p } else { self.options.pdf_floor }
    }
}

impl LikelihoodTerm for GreigQsoDampingWing {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        let x_hi = resolve_at(
            Self::NAME,
            output.redshifts(),
            output.average_nf(),
            self.options.qso_redshift,
            ResolvePolicy::Greig,
        )?;
        let p = self.density(x_hi);
        trace!("{}: x_HI = {x_hi:.4}, p = {p:.3e}", Self::NAME);
        Ok(-2.0 * p.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::CosmoParams;
    use approx::assert_abs_diff_eq;

    fn output(z: Vec<f64>, nf: Vec<f64>) -> SimulationOutput {
        let tb = vec![0.0; z.len()];
        SimulationOutput::new(z, nf, tb, 100.0, CosmoParams::default()).unwrap()
    }

    fn options(dir: PathBuf) -> GreigOptions {
        GreigOptions { cache_dir: dir, ..GreigOptions::default() }
    }

    /// Gaussian-shaped PDF centred on 0.5 with width 0.2, on an 11-point grid.
    fn gaussian_table() -> PriorTable {
        let x: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let pdf = x.iter().map(|v| 3.0 * (-0.5 * ((v - 0.5) / 0.2_f64).powi(2)).exp()).collect();
        PriorTable::new(x, pdf).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // At a tabulated neutral fraction the term returns -2 ln of the
    // normalized PDF value.
    //
    // Given
    // -----
    // - Gaussian PDF (peak normalized to 1) with σ = 0.2 around 0.5.
    // - Exact redshift match at 7.0842 with x_HI = 0.3.
    //
    // Expect
    // ------
    // - p = exp(-0.5), so -2 ln p = 1.
    fn returns_minus_two_log_pdf() {
        let term = GreigQsoDampingWing::from_table(GreigOptions::default(), &gaussian_table()).unwrap();

        let value = term.compute_likelihood(&output(vec![6.0, 7.0842, 8.0], vec![0.1, 0.3, 0.7]));

        assert_abs_diff_eq!(value.unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A negative spline undershoot is replaced by the 6e-6 floor rather than
    // producing NaN.
    //
    // Given
    // -----
    // - Table x = [0, 0.25, 0.5, 0.75, 1], pdf = [1, 0.5, 0, 0, 0]. The
    //   interpolating cubic on [0.5, 1] is -8 (x-0.5)(x-0.75)(x-1), which is
    //   -0.048 at x = 0.6.
    //
    // Expect
    // ------
    // - The floor is used: -2 ln(6e-6).
    fn negative_density_is_floored() {
        let table =
            PriorTable::new(vec![0.0, 0.25, 0.5, 0.75, 1.0], vec![1.0, 0.5, 0.0, 0.0, 0.0]).unwrap();
        let term = GreigQsoDampingWing::from_table(GreigOptions::default(), &table).unwrap();
        assert!(term.pdf.eval(0.6) < 0.0);

        let value = term.compute_likelihood(&output(vec![6.0, 7.0842, 8.0], vec![0.1, 0.6, 0.9]));

        let expected = -2.0 * 6.0e-6_f64.ln();
        assert_abs_diff_eq!(value.unwrap(), expected, epsilon = 1e-12);
        assert!(expected.is_finite() && expected > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Setup reads the JSON cache written by `PriorTable::save` and the term
    // agrees with one built from the in-memory table.
    fn setup_loads_cached_table() {
        let dir = tempfile::tempdir().unwrap();
        gaussian_table().save(dir.path()).unwrap();

        let term = options(dir.path().to_path_buf()).setup().unwrap();
        let reference =
            GreigQsoDampingWing::from_table(options(dir.path().to_path_buf()), &gaussian_table()).unwrap();

        let out = output(vec![6.0, 7.0, 8.0, 9.0], vec![0.1, 0.35, 0.6, 0.9]);
        assert_abs_diff_eq!(
            term.compute_likelihood(&out).unwrap(),
            reference.compute_likelihood(&out).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn setup_without_cache_fails() {
        let dir = tempfile::tempdir().unwrap();

        let err = options(dir.path().to_path_buf()).setup().unwrap_err();

        assert!(matches!(err, LikelihoodError::MissingFile { .. }));
    }

    #[test]
    fn needs_three_redshifts_without_match() {
        let term = GreigQsoDampingWing::from_table(GreigOptions::default(), &gaussian_table()).unwrap();

        let err = term.compute_likelihood(&output(vec![6.0, 8.0], vec![0.1, 0.7])).unwrap_err();

        assert!(matches!(err, LikelihoodError::InsufficientRedshifts { term: "Greig", .. }));
    }
}
