//! likelihood::mock_power — mock `(k, P)` tables shared by the power terms.
//!
//! Both power-spectrum terms read the same two-column file, keep the rows
//! inside a `[min_k, max_k]` window, and compare a model spectrum to those
//! rows with a 15% fractional error. The window is a row mask over the file;
//! the same mask is applied to the model bins, so the model must produce as
//! many bins as the file has rows.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::data::{ObservationalDataset, write_columns};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::simulation::{PowerSpectrum, PowerSpectrumEstimator};

/// Fractional error applied to either the mock or the model power.
pub const FRACTIONAL_ERROR: f64 = 0.15;

/// MockPower — windowed mock spectrum plus the row mask that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MockPower {
    k: Vec<f64>,
    power: Vec<f64>,
    window: Vec<bool>,
}

impl MockPower {
    /// Read `k` (column 0) and `power` (column 1) and keep the rows with
    /// `min_k ≤ k ≤ max_k`.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::MissingFile` / `MalformedFile` for the file.
    /// - `LikelihoodError::EmptyKWindow` if no row survives the window.
    pub fn load(term: &'static str, path: &Path, min_k: f64, max_k: f64) -> LikelihoodResult<Self> {
        let table = ObservationalDataset::load(path, 0, 1, None)?;
        let mock = Self::from_table(&table, min_k, max_k);
        debug!(
            "{term}: {} of {} mock bins within k ∈ [{min_k}, {max_k}] from {}",
            mock.len(),
            table.len(),
            path.display()
        );
        if mock.is_empty() {
            warn!("{term}: k window [{min_k}, {max_k}] excludes every row of {}", path.display());
            return Err(LikelihoodError::EmptyKWindow { term, min_k, max_k });
        }
        Ok(mock)
    }

    /// Window an in-memory `(k, power)` table.
    pub fn from_table(table: &ObservationalDataset, min_k: f64, max_k: f64) -> Self {
        let in_window = |k: f64| k >= min_k && k <= max_k;
        let window = table.x().iter().map(|&k| in_window(k)).collect();
        let kept = table.filter_x(in_window);
        Self { k: kept.x().to_vec(), power: kept.y().to_vec(), window }
    }

    /// Wavenumbers of the kept rows.
    pub fn k(&self) -> &[f64] {
        &self.k
    }

    /// Mock power of the kept rows.
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of rows in the file before windowing.
    pub fn rows(&self) -> usize {
        self.window.len()
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    /// `-0.5 Σ ((model - mock) / (0.15 · ref))²`, where `ref` is the model
    /// power when `error_on_model`, else the mock power.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::ShapeMismatch` if `model` does not have one bin
    ///   per file row.
    pub fn chi_squared(&self, model: &PowerSpectrum, error_on_model: bool) -> LikelihoodResult<f64> {
        if model.power.len() != self.window.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "model power bins",
                expected: self.window.len(),
                found: model.power.len(),
            });
        }
        let masked = model.power.iter().zip(&self.window).filter(|(_, keep)| **keep).map(|(p, _)| *p);
        let chi2: f64 = masked
            .zip(&self.power)
            .map(|(m, &d)| {
                let err = FRACTIONAL_ERROR * if error_on_model { m } else { d };
                let r = (m - d) / err;
                r * r
            })
            .sum();
        Ok(-0.5 * chi2)
    }
}

/// Write a spectrum as `k power` rows.
pub fn write_mock_power(path: &Path, spectrum: &PowerSpectrum) -> LikelihoodResult<()> {
    write_columns(path, &[spectrum.k.as_slice(), spectrum.power.as_slice()])
}

/// Where `simulate_data` keeps the simulated output for a mock file:
/// `<datafile>.output.json`.
pub fn saved_output_path(datafile: &Path) -> PathBuf {
    let mut name = datafile.as_os_str().to_os_string();
    name.push(".output.json");
    PathBuf::from(name)
}

/// Check the options shared by both power terms.
pub(crate) fn validate_power_options(
    min_k: f64, max_k: f64, n_psbins: Option<usize>,
) -> LikelihoodResult<()> {
    if !(min_k.is_finite() && max_k.is_finite() && min_k < max_k) {
        return Err(LikelihoodError::InvalidOption {
            name: "max_k",
            value: max_k,
            reason: "must be finite and exceed min_k",
        });
    }
    if n_psbins == Some(0) {
        return Err(LikelihoodError::InvalidOption {
            name: "n_psbins",
            value: 0.0,
            reason: "at least one bin is required",
        });
    }
    Ok(())
}

/// The injected estimator, or the built-in FFT estimator when available.
pub(crate) fn resolve_estimator(
    term: &'static str, estimator: Option<Arc<dyn PowerSpectrumEstimator>>,
) -> LikelihoodResult<Arc<dyn PowerSpectrumEstimator>> {
    match estimator {
        Some(e) => Ok(e),
        None => default_estimator(term),
    }
}

#[cfg(feature = "fft")]
fn default_estimator(_term: &'static str) -> LikelihoodResult<Arc<dyn PowerSpectrumEstimator>> {
    Ok(Arc::new(crate::simulation::FftPowerEstimator))
}

#[cfg(not(feature = "fft"))]
fn default_estimator(term: &'static str) -> LikelihoodResult<Arc<dyn PowerSpectrumEstimator>> {
    Err(LikelihoodError::MissingDependency { term, feature: "fft" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table() -> ObservationalDataset {
        ObservationalDataset::new(vec![0.05, 0.2, 0.5, 1.5], vec![9.0, 4.0, 2.0, 1.0], None).unwrap()
    }

    fn spectrum(power: Vec<f64>) -> PowerSpectrum {
        let k = vec![0.05, 0.2, 0.5, 1.5];
        PowerSpectrum { k: k[..power.len()].to_vec(), power, variance: None }
    }

    #[test]
    fn window_keeps_rows_inside_k_range() {
        let mock = MockPower::from_table(&table(), 0.1, 1.0);

        assert_eq!(mock.k(), &[0.2, 0.5]);
        assert_eq!(mock.power(), &[4.0, 2.0]);
        assert_eq!(mock.rows(), 4);
    }

    #[test]
    // Purpose
    // -------
    // The error is 15% of the model or of the mock, per configuration.
    //
    // Given
    // -----
    // - Mock [4, 2] in the window, model [5, 2] there.
    //
    // Expect
    // ------
    // - error on model: (1 / 0.75)² → -0.5 · 16/9.
    // - error on data:  (1 / 0.6)²  → -0.5 · 25/9.
    fn chi_squared_uses_configured_error_reference() {
        let mock = MockPower::from_table(&table(), 0.1, 1.0);
        let model = spectrum(vec![100.0, 5.0, 2.0, 100.0]);

        assert_abs_diff_eq!(mock.chi_squared(&model, true).unwrap(), -0.5 * 16.0 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mock.chi_squared(&model, false).unwrap(), -0.5 * 25.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn chi_squared_rejects_bin_count_mismatch() {
        let mock = MockPower::from_table(&table(), 0.1, 1.0);

        let err = mock.chi_squared(&spectrum(vec![1.0, 2.0, 3.0]), true).unwrap_err();

        assert_eq!(
            err,
            LikelihoodError::ShapeMismatch { what: "model power bins", expected: 4, found: 3 }
        );
    }

    #[test]
    fn load_rejects_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock.txt");
        write_mock_power(&path, &spectrum(vec![9.0, 4.0, 2.0, 1.0])).unwrap();

        let err = MockPower::load("test", &path, 2.0, 3.0).unwrap_err();

        assert!(matches!(err, LikelihoodError::EmptyKWindow { term: "test", .. }));
    }

    #[test]
    fn power_options_are_validated() {
        assert!(validate_power_options(1.0, 0.1, None).is_err());
        assert!(validate_power_options(0.1, 1.0, Some(0)).is_err());
        assert!(validate_power_options(0.1, 1.0, Some(10)).is_ok());
    }
}
