//! likelihood::planck — Gaussian prior on the CMB optical depth.
//!
//! Purpose
//! -------
//! Penalize reionization histories whose Thomson optical depth disagrees
//! with the Planck 2016 measurement `τ = 0.058 ± 0.012`.
//!
//! Key behaviors
//! -------------
//! - The simulated `(redshift, x_HI)` history is fitted with a degree-1
//!   spline and evaluated on a 15-point grid spanning `[5.9, 20]`, with
//!   linear extrapolation outside the simulated range and each value clamped
//!   to `[0, 1]`.
//! - The optical depth of the gridded history is delegated to an
//!   [`OpticalDepth`] service.
//! - The term returns `((τ_mean - τ) / σ)²`.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least 3 simulated redshifts are required, otherwise
//!   `LikelihoodError::InsufficientRedshifts` is raised.
use std::sync::Arc;

use log::trace;

use crate::interpolation::{Spline, clamp_unit, linspace};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::resolve::MIN_INTERPOLATION_SAMPLES;
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::{OpticalDepth, SimulationOutput, ThomsonOpticalDepth};

/// PlanckOptions — prior parameters and the extrapolation grid.
///
/// Fields
/// ------
/// - `tau_mean`, `tau_sigma`: Gaussian prior on τ.
/// - `z_min`, `z_max`, `n_points`: the redshift grid handed to the
///   optical-depth integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanckOptions {
    pub tau_mean: f64,
    pub tau_sigma: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub n_points: usize,
}

impl PlanckOptions {
    pub fn new(
        tau_mean: f64, tau_sigma: f64, z_min: f64, z_max: f64, n_points: usize,
    ) -> LikelihoodResult<Self> {
        if !(tau_sigma.is_finite() && tau_sigma > 0.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "tau_sigma",
                value: tau_sigma,
                reason: "must be finite and > 0",
            });
        }
        if !(z_min.is_finite() && z_max.is_finite() && z_min < z_max) {
            return Err(LikelihoodError::InvalidOption {
                name: "z_max",
                value: z_max,
                reason: "must be finite and exceed z_min",
            });
        }
        if n_points < 2 {
            return Err(LikelihoodError::InvalidOption {
                name: "n_points",
                value: n_points as f64,
                reason: "the extrapolation grid needs at least 2 points",
            });
        }
        Ok(Self { tau_mean, tau_sigma, z_min, z_max, n_points })
    }
}

impl Default for PlanckOptions {
    fn default() -> Self {
        Self { tau_mean: 0.058, tau_sigma: 0.012, z_min: 5.9, z_max: 20.0, n_points: 15 }
    }
}

/// PlanckOpticalDepthPrior — the ready Planck term.
#[derive(Debug, Clone)]
pub struct PlanckOpticalDepthPrior {
    options: PlanckOptions,
    optical_depth: Arc<dyn OpticalDepth>,
}

impl PlanckOpticalDepthPrior {
    pub const NAME: &'static str = "Planck";

    pub fn new(options: PlanckOptions, optical_depth: Arc<dyn OpticalDepth>) -> Self {
        Self { options, optical_depth }
    }

    pub fn options(&self) -> &PlanckOptions {
        &self.options
    }

    /// The redshift grid and the clamped neutral fractions on it.
    pub fn neutral_fraction_grid(
        &self, output: &SimulationOutput,
    ) -> LikelihoodResult<(Vec<f64>, Vec<f64>)> {
        let n = output.redshifts().len();
        if n < MIN_INTERPOLATION_SAMPLES {
            return Err(LikelihoodError::InsufficientRedshifts {
                term: Self::NAME,
                found: n,
                target: self.options.z_min,
            });
        }
        let history = Spline::linear(output.redshifts(), output.average_nf())?;
        let z_grid = linspace(self.options.z_min, self.options.z_max, self.options.n_points);
        let xhi_grid = z_grid.iter().map(|&z| clamp_unit(history.eval(z))).collect();
        Ok((z_grid, xhi_grid))
    }

    /// Optical depth of the simulated history.
    pub fn tau(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        let (z_grid, xhi_grid) = self.neutral_fraction_grid(output)?;
        self.optical_depth.compute_tau(&z_grid, &xhi_grid, output.cosmo_params())
    }
}

impl Default for PlanckOpticalDepthPrior {
    fn default() -> Self {
        Self::new(PlanckOptions::default(), Arc::new(ThomsonOpticalDepth::default()))
    }
}

impl LikelihoodTerm for PlanckOpticalDepthPrior {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        let tau = self.tau(output)?;
        let z_score = (self.options.tau_mean - tau) / self.options.tau_sigma;
        trace!("{}: tau = {tau:.5}, z-score = {z_score:.4}", Self::NAME);
        Ok(z_score * z_score)
    }
}
