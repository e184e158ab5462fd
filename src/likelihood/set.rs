//! likelihood::set — closed set of terms and their joint evaluation.
//!
//! Purpose
//! -------
//! Give a driver one place to configure, set up and evaluate every
//! likelihood term of an MCMC run.
//!
//! Key behaviors
//! -------------
//! - [`LikelihoodConfig`] is the tagged union of the six option structs;
//!   [`LikelihoodConfig::setup`] performs the term's one-off I/O.
//! - [`Likelihood`] is the tagged union of the six ready terms and dispatches
//!   [`LikelihoodTerm`] to the variant.
//! - [`LikelihoodSet::setup`] sets up every term before any evaluation; the
//!   first failure aborts setup.
//! - [`LikelihoodSet::evaluate`] returns each term's contribution and their
//!   sum, plus the model spectra of the power terms. The first failing term
//!   aborts the evaluation; nothing is retried.
//!
//! Conventions
//! -----------
//! - Shared numerical backends are passed in through [`Services`].
use std::sync::Arc;

use log::{debug, trace};

use crate::likelihood::errors::LikelihoodResult;
use crate::likelihood::global_signal::{GlobalSignalChiSquared, GlobalSignalOptions};
use crate::likelihood::greig::{GreigOptions, GreigQsoDampingWing};
use crate::likelihood::mcgreer::{McGreerDarkPixelBound, McGreerOptions};
use crate::likelihood::planck::{PlanckOpticalDepthPrior, PlanckOptions};
use crate::likelihood::power_coeval::{CoevalPowerChiSquared, CoevalPowerOptions};
use crate::likelihood::power_lightcone::{LightconePowerChiSquared, LightconePowerOptions};
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::{
    OpticalDepth, PowerSpectrum, PowerSpectrumEstimator, SimulationOutput, ThomsonOpticalDepth,
};

/// Services — numerical backends shared by the terms.
///
/// Fields
/// ------
/// - `optical_depth`: used by the Planck term.
/// - `power`: used by both power-spectrum terms; `None` falls back to the
///   built-in FFT estimator when the `fft` feature is enabled.
#[derive(Debug, Clone)]
pub struct Services {
    pub optical_depth: Arc<dyn OpticalDepth>,
    pub power: Option<Arc<dyn PowerSpectrumEstimator>>,
}

impl Default for Services {
    fn default() -> Self {
        Self { optical_depth: Arc::new(ThomsonOpticalDepth::default()), power: None }
    }
}

/// LikelihoodConfig — configuration of one term.
#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodConfig {
    Planck(PlanckOptions),
    McGreer(McGreerOptions),
    Greig(GreigOptions),
    GlobalSignal(GlobalSignalOptions),
    LightconePower(LightconePowerOptions),
    CoevalPower(CoevalPowerOptions),
}

impl LikelihoodConfig {
    /// Build the ready term, loading its data.
    pub fn setup(&self, services: &Services) -> LikelihoodResult<Likelihood> {
        Ok(match self {
            LikelihoodConfig::Planck(opts) => Likelihood::Planck(PlanckOpticalDepthPrior::new(
                *opts,
                Arc::clone(&services.optical_depth),
            )),
            LikelihoodConfig::McGreer(opts) => Likelihood::McGreer(McGreerDarkPixelBound::new(*opts)),
            LikelihoodConfig::Greig(opts) => Likelihood::Greig(opts.setup()?),
            LikelihoodConfig::GlobalSignal(opts) => Likelihood::GlobalSignal(opts.setup()?),
            LikelihoodConfig::LightconePower(opts) => {
                Likelihood::LightconePower(opts.setup(services.power.clone())?)
            }
            LikelihoodConfig::CoevalPower(opts) => {
                Likelihood::CoevalPower(opts.setup(services.power.clone())?)
            }
        })
    }
}

/// Likelihood — one ready term of any kind.
#[derive(Debug, Clone)]
pub enum Likelihood {
    Planck(PlanckOpticalDepthPrior),
    McGreer(McGreerDarkPixelBound),
    Greig(GreigQsoDampingWing),
    GlobalSignal(GlobalSignalChiSquared),
    LightconePower(LightconePowerChiSquared),
    CoevalPower(CoevalPowerChiSquared),
}

impl Likelihood {
    fn as_term(&self) -> &dyn LikelihoodTerm {
        match self {
            Likelihood::Planck(t) => t,
            Likelihood::McGreer(t) => t,
            Likelihood::Greig(t) => t,
            Likelihood::GlobalSignal(t) => t,
            Likelihood::LightconePower(t) => t,
            Likelihood::CoevalPower(t) => t,
        }
    }
}

impl LikelihoodTerm for Likelihood {
    fn name(&self) -> &'static str {
        self.as_term().name()
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        self.as_term().compute_likelihood(output)
    }

    fn compute_likelihood_and_power(
        &self, output: &SimulationOutput,
    ) -> LikelihoodResult<(f64, Option<PowerSpectrum>)> {
        self.as_term().compute_likelihood_and_power(output)
    }
}

/// Evaluation — per-term contributions, their sum, and the model spectra
/// the power terms were compared on.
///
/// Fields
/// ------
/// - `contributions`: `(name, value)` in term order.
/// - `total`: sum of the contributions.
/// - `spectra`: `(name, model)` for each term that compares spectra.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub contributions: Vec<(&'static str, f64)>,
    pub total: f64,
    pub spectra: Vec<(&'static str, PowerSpectrum)>,
}

impl Evaluation {
    /// Contribution of the first term called `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.contributions.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Model spectrum of the first term called `name`, if it produced one.
    pub fn spectrum(&self, name: &str) -> Option<&PowerSpectrum> {
        self.spectra.iter().find(|(n, _)| *n == name).map(|(_, ps)| ps)
    }
}

/// LikelihoodSet — the ready terms of one run.
#[derive(Debug, Clone, Default)]
pub struct LikelihoodSet {
    terms: Vec<Likelihood>,
}

impl LikelihoodSet {
    /// Set up every configured term.
    ///
    /// Errors
    /// ------
    /// - The first setup error, unchanged.
    pub fn setup(configs: &[LikelihoodConfig], services: &Services) -> LikelihoodResult<Self> {
        let terms = configs.iter().map(|c| c.setup(services)).collect::<LikelihoodResult<Vec<_>>>()?;
        debug!(
            "likelihood set ready: [{}]",
            terms.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
        );
        Ok(Self { terms })
    }

    /// Wrap terms that are already set up.
    pub fn from_terms(terms: Vec<Likelihood>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[Likelihood] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate every term on `output`.
    pub fn evaluate(&self, output: &SimulationOutput) -> LikelihoodResult<Evaluation> {
        let mut contributions = Vec::with_capacity(self.terms.len());
        let mut spectra = Vec::new();
        for term in &self.terms {
            let (value, model) = term.compute_likelihood_and_power(output)?;
            contributions.push((term.name(), value));
            if let Some(model) = model {
                spectra.push((term.name(), model));
            }
        }
        let total: f64 = contributions.iter().map(|(_, v)| v).sum();
        trace!("likelihood total = {total:.6}");
        Ok(Evaluation { contributions, total, spectra })
    }
}
