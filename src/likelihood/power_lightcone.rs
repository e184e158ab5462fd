//! likelihood::power_lightcone — 1-D power spectrum of a lightcone chunk.
//!
//! Purpose
//! -------
//! Compare the spherically averaged power spectrum of (a redshift window of)
//! the simulated lightcone with a noiseless mock spectrum.
//!
//! Key behaviors
//! -------------
//! - [`LightconePowerOptions::redshift_mask`] selects line-of-sight slices by
//!   absolute redshift bounds, absolute frequency bounds (`1420 / (1 + z)`
//!   MHz) and bounds relative to the lowest slice redshift (in redshift or in
//!   frequency). Unset bounds do not constrain.
//! - The line-of-sight length of the selection is `D(z_max) - D(z_min)` from
//!   the output's cosmology; the transverse sides are `box_len`.
//! - Bin edges are re-centred to midpoints (geometric for log bins).
//! - The model bins are windowed by the same row mask as the mock file and
//!   compared with a 15% fractional error
//!   (see [`MockPower::chi_squared`]).
//! - [`LightconePowerOptions::simulate_data`] bootstraps the mock file from
//!   one simulator run, without the redshift window, and can keep the
//!   simulated output alongside it.
//!
//! Invariants & assumptions
//! ------------------------
//! - The simulator request must ask for a lightcone; setup fails otherwise.
//! - Without the `fft` feature an estimator must be injected.
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, trace};
use ndarray::Axis;

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::mock_power::{
    MockPower, resolve_estimator, saved_output_path, validate_power_options, write_mock_power,
};
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::{
    PowerSpectrum, PowerSpectrumEstimator, SimulationOutput, SimulationRequest, Simulator,
};

/// Rest frequency of the 21-cm line in MHz, as used by the window.
pub const HI_REST_FREQUENCY_MHZ: f64 = 1420.0;

/// LightconePowerOptions — mock file, binning and redshift window.
///
/// Fields
/// ------
/// - `datafile`: mock `k power` file.
/// - `n_psbins`: number of power bins (`None` lets the estimator choose).
/// - `min_k`, `max_k`: comparison window in k (Mpc⁻¹).
/// - `log_k`: logarithmic bins.
/// - `error_on_model`: 15% of the model (else of the mock) as error.
/// - `min_z`, `max_z`, `min_freq`, `max_freq`, `delta_z`, `delta_freq`:
///   optional line-of-sight window.
/// - `request`: simulator request used by `simulate_data`; must ask for a
///   lightcone.
#[derive(Debug, Clone, PartialEq)]
pub struct LightconePowerOptions {
    pub datafile: PathBuf,
    pub n_psbins: Option<usize>,
    pub min_k: f64,
    pub max_k: f64,
    pub log_k: bool,
    pub error_on_model: bool,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,
    pub min_freq: Option<f64>,
    pub max_freq: Option<f64>,
    pub delta_z: Option<f64>,
    pub delta_freq: Option<f64>,
    pub request: SimulationRequest,
}

impl LightconePowerOptions {
    /// Default options reading the mock spectrum from `datafile`.
    pub fn new(datafile: impl Into<PathBuf>) -> Self {
        Self {
            datafile: datafile.into(),
            n_psbins: None,
            min_k: 0.1,
            max_k: 1.0,
            log_k: true,
            error_on_model: true,
            min_z: None,
            max_z: None,
            min_freq: None,
            max_freq: None,
            delta_z: None,
            delta_freq: None,
            request: SimulationRequest::default(),
        }
    }

    pub fn validate(&self) -> LikelihoodResult<()> {
        validate_power_options(self.min_k, self.max_k, self.n_psbins)?;
        if !self.request.use_lightcone {
            return Err(LikelihoodError::LightconeRequired { term: LightconePowerChiSquared::NAME });
        }
        Ok(())
    }

    /// Which slices with redshifts `z_slices` fall inside the window.
    pub fn redshift_mask(&self, z_slices: &[f64]) -> Vec<bool> {
        let z_lowest = z_slices.iter().copied().fold(f64::INFINITY, f64::min);
        let freq = |z: f64| HI_REST_FREQUENCY_MHZ / (1.0 + z);
        z_slices
            .iter()
            .map(|&z| {
                self.min_z.map_or(true, |b| z >= b)
                    && self.max_z.map_or(true, |b| z <= b)
                    && self.min_freq.map_or(true, |b| freq(z) >= b)
                    && self.max_freq.map_or(true, |b| freq(z) <= b)
                    && self.delta_z.map_or(true, |d| z <= z_lowest + d)
                    && self.delta_freq.map_or(true, |d| freq(z) <= freq(z_lowest) + d)
            })
            .collect()
    }

    /// Read the mock file and build the ready term.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::LightconeRequired` if the request has no lightcone.
    /// - `LikelihoodError::MissingDependency` without an estimator.
    /// - `LikelihoodError::MissingFile` / `EmptyKWindow` for the mock data.
    pub fn setup(
        &self, estimator: Option<Arc<dyn PowerSpectrumEstimator>>,
    ) -> LikelihoodResult<LightconePowerChiSquared> {
        self.validate()?;
        let estimator = resolve_estimator(LightconePowerChiSquared::NAME, estimator)?;
        let mock =
            MockPower::load(LightconePowerChiSquared::NAME, &self.datafile, self.min_k, self.max_k)?;
        Ok(LightconePowerChiSquared { options: self.clone(), estimator, mock })
    }

    /// Run the simulator once and compute the full-lightcone spectrum, with
    /// its variance. When `write`, the spectrum is stored as the mock file;
    /// when `save_output`, the simulated output is stored next to it (see
    /// [`saved_output_path`]).
    pub fn simulate_data(
        &self, simulator: &dyn Simulator, estimator: Option<Arc<dyn PowerSpectrumEstimator>>,
        write: bool, save_output: bool,
    ) -> LikelihoodResult<PowerSpectrum> {
        self.validate()?;
        let estimator = resolve_estimator(LightconePowerChiSquared::NAME, estimator)?;
        let output = simulator.run(&self.request)?;
        if save_output {
            output.save_json(&saved_output_path(&self.datafile))?;
        }
        let spectrum = lightcone_power(self, estimator.as_ref(), &output, false, true)?;
        if write {
            write_mock_power(&self.datafile, &spectrum)?;
            debug!(
                "{}: wrote {} mock bins to {}",
                LightconePowerChiSquared::NAME,
                spectrum.len(),
                self.datafile.display()
            );
        }
        Ok(spectrum)
    }
}

/// LightconePowerChiSquared — the ready lightcone power term.
#[derive(Debug, Clone)]
pub struct LightconePowerChiSquared {
    options: LightconePowerOptions,
    estimator: Arc<dyn PowerSpectrumEstimator>,
    mock: MockPower,
}

impl LightconePowerChiSquared {
    pub const NAME: &'static str = "LightconePower";

    pub fn options(&self) -> &LightconePowerOptions {
        &self.options
    }

    /// Windowed mock spectrum.
    pub fn mock(&self) -> &MockPower {
        &self.mock
    }

    /// Power spectrum of the windowed lightcone of `output`; the variance is
    /// estimated when `error_on_model`.
    pub fn compute_power(&self, output: &SimulationOutput) -> LikelihoodResult<PowerSpectrum> {
        lightcone_power(
            &self.options,
            self.estimator.as_ref(),
            output,
            true,
            self.options.error_on_model,
        )
    }
}

impl LikelihoodTerm for LightconePowerChiSquared {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        self.compute_likelihood_and_power(output).map(|(value, _)| value)
    }

    fn compute_likelihood_and_power(
        &self, output: &SimulationOutput,
    ) -> LikelihoodResult<(f64, Option<PowerSpectrum>)> {
        let model = self.compute_power(output)?;
        let value = self.mock.chi_squared(&model, self.options.error_on_model)?;
        trace!("{}: {} bins compared -> {value:.4}", Self::NAME, self.mock.len());
        Ok((value, Some(model)))
    }
}

fn lightcone_power(
    options: &LightconePowerOptions, estimator: &dyn PowerSpectrumEstimator,
    output: &SimulationOutput, apply_window: bool, want_variance: bool,
) -> LikelihoodResult<PowerSpectrum> {
    let term = LightconePowerChiSquared::NAME;
    let lightcone = output
        .lightcone_box()
        .ok_or(LikelihoodError::MissingField { term, field: "lightcone_box" })?;
    let slices = output.redshift_slices();

    let keep: Vec<usize> = if apply_window {
        options.redshift_mask(slices).iter().enumerate().filter(|(_, k)| **k).map(|(i, _)| i).collect()
    } else {
        (0..slices.len()).collect()
    };
    if keep.is_empty() {
        return Err(LikelihoodError::EmptyRedshiftWindow { term });
    }

    let z_lo = keep.iter().map(|&i| slices[i]).fold(f64::INFINITY, f64::min);
    let z_hi = keep.iter().map(|&i| slices[i]).fold(f64::NEG_INFINITY, f64::max);
    let cosmology = output.cosmology();
    let los = cosmology.comoving_distance(z_hi) - cosmology.comoving_distance(z_lo);

    let chunk = lightcone.select(Axis(2), &keep);
    let raw = estimator.estimate_power(
        chunk.view(),
        [output.box_len(), output.box_len(), los],
        options.n_psbins,
        options.log_k,
        want_variance,
    )?;
    Ok(PowerSpectrum::from_edges(raw, options.log_k))
}
