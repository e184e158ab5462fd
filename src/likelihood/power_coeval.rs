//! likelihood::power_coeval — 1-D power spectrum of one co-eval snapshot.
//!
//! The snapshot compared is the co-eval box at `redshift`, located by the
//! first exact match in the output's redshift list. Its power is estimated
//! on a `box_len³` cube, re-centred, windowed by the mock file's k mask and
//! compared with a 15% fractional error. By default the error is taken on
//! the mock power; set `error_on_model` to take it on the model instead.
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, trace};

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::mock_power::{
    MockPower, resolve_estimator, saved_output_path, validate_power_options, write_mock_power,
};
use crate::likelihood::resolve::first_exact_match;
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::{
    PowerSpectrum, PowerSpectrumEstimator, SimulationOutput, SimulationRequest, Simulator,
};

/// CoevalPowerOptions — mock file, snapshot redshift and binning.
#[derive(Debug, Clone, PartialEq)]
pub struct CoevalPowerOptions {
    pub datafile: PathBuf,
    pub redshift: f64,
    pub n_psbins: Option<usize>,
    pub min_k: f64,
    pub max_k: f64,
    pub log_k: bool,
    pub error_on_model: bool,
    pub request: SimulationRequest,
}

impl CoevalPowerOptions {
    /// Default options comparing the snapshot at `redshift` with `datafile`.
    ///
    /// The simulator request is set to produce co-eval boxes at `redshift`
    /// only.
    pub fn new(datafile: impl Into<PathBuf>, redshift: f64) -> Self {
        let request =
            SimulationRequest { redshifts: vec![redshift], use_lightcone: false, ..SimulationRequest::default() };
        Self {
            datafile: datafile.into(),
            redshift,
            n_psbins: None,
            min_k: 0.1,
            max_k: 1.0,
            log_k: true,
            error_on_model: false,
            request,
        }
    }

    pub fn validate(&self) -> LikelihoodResult<()> {
        validate_power_options(self.min_k, self.max_k, self.n_psbins)?;
        if !self.redshift.is_finite() {
            return Err(LikelihoodError::InvalidOption {
                name: "redshift",
                value: self.redshift,
                reason: "must be finite",
            });
        }
        Ok(())
    }

    /// Read the mock file and build the ready term.
    pub fn setup(
        &self, estimator: Option<Arc<dyn PowerSpectrumEstimator>>,
    ) -> LikelihoodResult<CoevalPowerChiSquared> {
        self.validate()?;
        let estimator = resolve_estimator(CoevalPowerChiSquared::NAME, estimator)?;
        let mock =
            MockPower::load(CoevalPowerChiSquared::NAME, &self.datafile, self.min_k, self.max_k)?;
        Ok(CoevalPowerChiSquared { options: self.clone(), estimator, mock })
    }

    /// Run the simulator once and compute the snapshot spectrum, with its
    /// variance. When `write`, the spectrum is stored as the mock file; when
    /// `save_output`, the simulated output is stored next to it (see
    /// [`saved_output_path`]).
    pub fn simulate_data(
        &self, simulator: &dyn Simulator, estimator: Option<Arc<dyn PowerSpectrumEstimator>>,
        write: bool, save_output: bool,
    ) -> LikelihoodResult<PowerSpectrum> {
        self.validate()?;
        let estimator = resolve_estimator(CoevalPowerChiSquared::NAME, estimator)?;
        let output = simulator.run(&self.request)?;
        if save_output {
            output.save_json(&saved_output_path(&self.datafile))?;
        }
        let spectrum = coeval_power(self, estimator.as_ref(), &output, true)?;
        if write {
            write_mock_power(&self.datafile, &spectrum)?;
            debug!(
                "{}: wrote {} mock bins to {}",
                CoevalPowerChiSquared::NAME,
                spectrum.len(),
                self.datafile.display()
            );
        }
        Ok(spectrum)
    }
}

/// CoevalPowerChiSquared — the ready co-eval power term.
#[derive(Debug, Clone)]
pub struct CoevalPowerChiSquared {
    options: CoevalPowerOptions,
    estimator: Arc<dyn PowerSpectrumEstimator>,
    mock: MockPower,
}

impl CoevalPowerChiSquared {
    pub const NAME: &'static str = "CoevalPower";

    pub fn options(&self) -> &CoevalPowerOptions {
        &self.options
    }

    pub fn mock(&self) -> &MockPower {
        &self.mock
    }

    /// Power spectrum of the snapshot at the configured redshift; the
    /// variance is estimated when `error_on_model`.
    pub fn compute_power(&self, output: &SimulationOutput) -> LikelihoodResult<PowerSpectrum> {
        coeval_power(&self.options, self.estimator.as_ref(), output, self.options.error_on_model)
    }
}

impl LikelihoodTerm for CoevalPowerChiSquared {
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
        trace!("{}: z = {} -> {value:.4}", Self::NAME, self.options.redshift);
        Ok((value, Some(model)))
    }
}

fn coeval_power(
    options: &CoevalPowerOptions, estimator: &dyn PowerSpectrumEstimator, output: &SimulationOutput,
    want_variance: bool,
) -> LikelihoodResult<PowerSpectrum> {
    let term = CoevalPowerChiSquared::NAME;
    let index = first_exact_match(output.redshifts(), options.redshift)
        .ok_or(LikelihoodError::RedshiftNotSimulated { term, redshift: options.redshift })?;
    let boxes =
        output.coeval_boxes().ok_or(LikelihoodError::MissingField { term, field: "coeval_boxes" })?;
    let side = output.box_len();
    let raw = estimator.estimate_power(
        boxes[index].view(),
        [side, side, side],
        options.n_psbins,
        options.log_k,
        want_variance,
    )?;
    Ok(PowerSpectrum::from_edges(raw, options.log_k))
}
