//! eor_likelihood — likelihood terms for epoch-of-reionization inference.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the likelihood terms to Python via the `_eor_likelihood` extension module.
//! An MCMC driver runs a reionization simulator per parameter draw, wraps the
//! result in a [`simulation::SimulationOutput`] and asks each configured term
//! for its log-likelihood contribution.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`data`, `interpolation`, `likelihood`,
//!   `simulation`) as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_eor_likelihood` Python extension.
//! - Create and register the `likelihood` Python submodule under
//!   `eor_likelihood` so that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input conversion, and error mapping.
//! - Terms are immutable once built, so the Python wrappers can be shared
//!   across threads by the sampler.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_eor_likelihood.likelihood` and are
//!   expected to be wrapped by a thin pure-Python package.
//! - Errors from core Rust code are propagated as
//!   [`likelihood::LikelihoodError`] internally and converted to `ValueError`
//!   at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`likelihood::prelude`] and can ignore
//!   the PyO3 items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end pipeline test under `tests/`.

pub mod data;
pub mod interpolation;
pub mod likelihood;
pub mod simulation;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::{path::PathBuf, sync::Arc};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    likelihood::{
        GlobalSignalChiSquared, GlobalSignalOptions, GreigOptions, GreigQsoDampingWing,
        LightconePowerChiSquared, LightconePowerOptions, LikelihoodTerm, McGreerDarkPixelBound,
        McGreerOptions, PlanckOpticalDepthPrior, PlanckOptions,
    },
    simulation::{SimulationOutput, ThomsonOpticalDepth},
    utils::{build_cosmo_params, extract_box, extract_f64_vec},
};

/// SimulationOutput — Python-facing wrapper for one simulator run.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `SimulationOutput(redshifts, average_nf, average_tb, box_len=300.0,
/// lightcone=None, redshift_slices=None, hubble=None, omega_m=None,
/// omega_b=None, y_he=None)`:
/// - `redshifts`, `average_nf`, `average_tb`: equal-length 1-D array-likes.
/// - `lightcone`: optional 3-D `float64` array whose last axis runs along the
///   line of sight; `redshift_slices` must then be given with matching length.
/// - cosmological parameters default to Planck 2015 when `None`.
///
/// Invariants
/// ----------
/// - `inner` satisfies every invariant documented on [`SimulationOutput`].
#[cfg(feature = "python-bindings")]
#[pyclass(name = "SimulationOutput", module = "eor_likelihood.likelihood")]
pub struct PySimulationOutput {
    pub inner: SimulationOutput,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PySimulationOutput {
    #[new]
    #[pyo3(
        signature = (
            redshifts,
            average_nf,
            average_tb,
            box_len = 300.0,
            lightcone = None,
            redshift_slices = None,
            hubble = None,
            omega_m = None,
            omega_b = None,
            y_he = None,
        ),
        text_signature = "(redshifts, average_nf, average_tb, /, box_len=300.0, lightcone=None, \
                          redshift_slices=None, hubble=None, omega_m=None, omega_b=None, y_he=None)"
    )]
    pub fn new<'py>(
        py: Python<'py>, redshifts: &Bound<'py, PyAny>, average_nf: &Bound<'py, PyAny>,
        average_tb: &Bound<'py, PyAny>, box_len: f64, lightcone: Option<&Bound<'py, PyAny>>,
        redshift_slices: Option<&Bound<'py, PyAny>>, hubble: Option<f64>, omega_m: Option<f64>,
        omega_b: Option<f64>, y_he: Option<f64>,
    ) -> PyResult<Self> {
        let cosmo = build_cosmo_params(hubble, omega_m, omega_b, y_he)?;
        let mut inner = SimulationOutput::new(
            extract_f64_vec(py, redshifts, "redshifts")?,
            extract_f64_vec(py, average_nf, "average_nf")?,
            extract_f64_vec(py, average_tb, "average_tb")?,
            box_len,
            cosmo,
        )?;
        if let Some(raw_box) = lightcone {
            let lightcone_box = extract_box(raw_box, "lightcone")?;
            let slices = match redshift_slices {
                Some(raw) => extract_f64_vec(py, raw, "redshift_slices")?,
                None => Vec::new(),
            };
            inner = inner.with_lightcone(lightcone_box, slices)?;
        }
        Ok(PySimulationOutput { inner })
    }

    #[getter]
    pub fn redshifts(&self) -> Vec<f64> {
        self.inner.redshifts().to_vec()
    }

    #[getter]
    pub fn average_nf(&self) -> Vec<f64> {
        self.inner.average_nf().to_vec()
    }

    #[getter]
    pub fn average_tb(&self) -> Vec<f64> {
        self.inner.average_tb().to_vec()
    }

    #[getter]
    pub fn box_len(&self) -> f64 {
        self.inner.box_len()
    }
}

/// Planck — Gaussian prior on the CMB optical depth.
///
/// Returns `((τ_mean − τ) / σ)²` from `compute_likelihood`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "eor_likelihood.likelihood")]
pub struct Planck {
    inner: PlanckOpticalDepthPrior,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Planck {
    #[new]
    #[pyo3(signature = (tau_mean = 0.058, tau_sigma = 0.012, z_min = 5.9, z_max = 20.0, n_points = 15))]
    pub fn new(
        tau_mean: f64, tau_sigma: f64, z_min: f64, z_max: f64, n_points: usize,
    ) -> PyResult<Self> {
        let options = PlanckOptions::new(tau_mean, tau_sigma, z_min, z_max, n_points)?;
        let optical_depth = Arc::new(ThomsonOpticalDepth::default());
        Ok(Planck { inner: PlanckOpticalDepthPrior::new(options, optical_depth) })
    }

    /// Optical depth of the simulated history.
    pub fn tau(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.tau(&output.inner)?)
    }

    pub fn compute_likelihood(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.compute_likelihood(&output.inner)?)
    }
}

/// McGreer — one-sided bound on the neutral fraction at `z = 5.9`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "eor_likelihood.likelihood")]
pub struct McGreer {
    inner: McGreerDarkPixelBound,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl McGreer {
    #[new]
    #[pyo3(signature = (redshift = 5.9, mean = 0.06, sigma = 0.05))]
    pub fn new(redshift: f64, mean: f64, sigma: f64) -> PyResult<Self> {
        let options = McGreerOptions::new(redshift, mean, sigma)?;
        Ok(McGreer { inner: McGreerDarkPixelBound::new(options) })
    }

    pub fn compute_likelihood(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.compute_likelihood(&output.inner)?)
    }
}

/// Greig — tabulated QSO damping-wing PDF.
///
/// `cache_dir` defaults to `~/.py21cmmc` and must hold the prior table.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "eor_likelihood.likelihood")]
pub struct Greig {
    inner: GreigQsoDampingWing,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Greig {
    #[new]
    #[pyo3(signature = (cache_dir = None))]
    pub fn new(cache_dir: Option<PathBuf>) -> PyResult<Self> {
        let defaults = GreigOptions::default();
        let options = GreigOptions {
            cache_dir: cache_dir.unwrap_or(defaults.cache_dir),
            ..GreigOptions::default()
        };
        Ok(Greig { inner: options.setup()? })
    }

    pub fn compute_likelihood(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.compute_likelihood(&output.inner)?)
    }
}

/// GlobalSignal — chi-squared on the global 21-cm brightness temperature.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "eor_likelihood.likelihood")]
pub struct GlobalSignal {
    inner: GlobalSignalChiSquared,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl GlobalSignal {
    #[new]
    #[pyo3(
        signature = (
            model_name = "FaintGalaxies",
            mock_dir = None,
            fixed_error = false,
            fixed_global_error = 10.0,
            fixed_global_bandwidth = 4.0,
            frequency_min = 40.0,
            frequency_max = 200.0,
        )
    )]
    pub fn new(
        model_name: &str, mock_dir: Option<PathBuf>, fixed_error: bool, fixed_global_error: f64,
        fixed_global_bandwidth: f64, frequency_min: f64, frequency_max: f64,
    ) -> PyResult<Self> {
        let mut options = GlobalSignalOptions::default();
        if let Some(dir) = mock_dir {
            options.mock_dir = dir;
        }
        let options = GlobalSignalOptions {
            model_name: model_name.to_string(),
            fixed_error,
            fixed_global_error,
            fixed_global_bandwidth,
            frequency_min,
            frequency_max,
            ..options
        };
        Ok(GlobalSignal { inner: options.setup()? })
    }

    /// Frequencies (MHz) at which the model is compared.
    pub fn comparison_frequencies(&self) -> Vec<f64> {
        self.inner.comparison_frequencies()
    }

    pub fn compute_likelihood(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.compute_likelihood(&output.inner)?)
    }
}

/// LightconePower — chi-squared on the 1-D power spectrum of a lightcone,
/// using the built-in FFT estimator.
///
/// The optional `min_z`/`max_z`, `min_freq`/`max_freq` (MHz) and
/// `delta_z`/`delta_freq` bounds restrict the lightcone slices compared.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "eor_likelihood.likelihood")]
pub struct LightconePower {
    inner: LightconePowerChiSquared,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LightconePower {
    #[new]
    #[pyo3(
        signature = (
            datafile,
            n_psbins = None,
            min_k = 0.1,
            max_k = 1.0,
            log_k = true,
            error_on_model = true,
            min_z = None,
            max_z = None,
            min_freq = None,
            max_freq = None,
            delta_z = None,
            delta_freq = None,
        )
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        datafile: PathBuf, n_psbins: Option<usize>, min_k: f64, max_k: f64, log_k: bool,
        error_on_model: bool, min_z: Option<f64>, max_z: Option<f64>, min_freq: Option<f64>,
        max_freq: Option<f64>, delta_z: Option<f64>, delta_freq: Option<f64>,
    ) -> PyResult<Self> {
        let options = LightconePowerOptions {
            n_psbins,
            min_k,
            max_k,
            log_k,
            error_on_model,
            min_z,
            max_z,
            min_freq,
            max_freq,
            delta_z,
            delta_freq,
            ..LightconePowerOptions::new(datafile)
        };
        Ok(LightconePower { inner: options.setup(None)? })
    }

    /// Which of `z_slices` fall inside the configured redshift window.
    pub fn redshift_mask(&self, z_slices: Vec<f64>) -> Vec<bool> {
        self.inner.options().redshift_mask(&z_slices)
    }

    /// `(k, power)` of the model spectrum within the redshift window.
    pub fn compute_power(
        &self, output: PyRef<'_, PySimulationOutput>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let spectrum = self.inner.compute_power(&output.inner)?;
        Ok((spectrum.k, spectrum.power))
    }

    pub fn compute_likelihood(&self, output: PyRef<'_, PySimulationOutput>) -> PyResult<f64> {
        Ok(self.inner.compute_likelihood(&output.inner)?)
    }
}

/// _eor_likelihood — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_eor_likelihood` Python module and register the `likelihood`
/// submodule used by the public `eor_likelihood` package.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
///
/// Notes
/// -----
/// - Invoked by Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _eor_likelihood<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let likelihood_mod = PyModule::new(_py, "likelihood")?;
    likelihood_terms(_py, m, &likelihood_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("eor_likelihood.likelihood", likelihood_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn likelihood_terms<'py>(
    _py: Python, eor_likelihood: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PySimulationOutput>()?;
    m.add_class::<Planck>()?;
    m.add_class::<McGreer>()?;
    m.add_class::<Greig>()?;
    m.add_class::<GlobalSignal>()?;
    m.add_class::<LightconePower>()?;
    eor_likelihood.add_submodule(m)?;
    Ok(())
}
