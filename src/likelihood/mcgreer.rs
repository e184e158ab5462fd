//! likelihood::mcgreer — dark-pixel upper bound on the neutral fraction.
//!
//! One-sided Gaussian prior at `z = 5.9`: flat for `x_HI ≤ 0.06`, a Gaussian
//! of mean 0.06 and width 0.05 above it (McGreer et al. 2015). The neutral
//! fraction at 5.9 is resolved with [`ResolvePolicy::Linear`] and clamped.
use log::trace;

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::resolve::{ResolvePolicy, resolve_at};
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::SimulationOutput;

/// McGreerOptions — redshift and one-sided prior parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McGreerOptions {
    pub redshift: f64,
    pub mean: f64,
    pub sigma: f64,
}

impl McGreerOptions {
    pub fn new(redshift: f64, mean: f64, sigma: f64) -> LikelihoodResult<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "sigma",
                value: sigma,
                reason: "must be finite and > 0",
            });
        }
        if !redshift.is_finite() {
            return Err(LikelihoodError::InvalidOption {
                name: "redshift",
                value: redshift,
                reason: "must be finite",
            });
        }
        Ok(Self { redshift, mean, sigma })
    }
}

impl Default for McGreerOptions {
    fn default() -> Self {
        Self { redshift: 5.9, mean: 0.06, sigma: 0.05 }
    }
}

/// McGreerDarkPixelBound — the ready McGreer term.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct McGreerDarkPixelBound {
    options: McGreerOptions,
}

impl McGreerDarkPixelBound {
    pub const NAME: &'static str = "McGreer";

    pub fn new(options: McGreerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &McGreerOptions {
        &self.options
    }

    /// Penalty for a resolved neutral fraction `x_hi`.
    pub fn penalty(&self, x_hi: f64) -> f64 {
        if x_hi > self.options.mean {
            let z_score = (self.options.mean - x_hi) / self.options.sigma;
            z_score * z_score
        } else {
            0.0
        }
    }
}

impl LikelihoodTerm for McGreerDarkPixelBound {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        let x_hi = resolve_at(
            Self::NAME,
            output.redshifts(),
            output.average_nf(),
            self.options.redshift,
            ResolvePolicy::Linear,
        )?;
        let value = self.penalty(x_hi);
        trace!("{}: x_HI(z = {}) = {x_hi:.4} -> {value:.4}", Self::NAME, self.options.redshift);
        Ok(value)
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

    #[test]
    // Purpose
    // -------
    // Exact match at z = 5.9 with x_HI = 0.06 sits on the flat side of the
    // boundary and yields exactly zero.
    fn exact_match_at_boundary_is_zero() {
        let term = McGreerDarkPixelBound::default();

        let value = term.compute_likelihood(&output(vec![5.0, 5.9, 7.0], vec![0.3, 0.06, 0.0]));

        assert_eq!(value.unwrap(), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Above the bound the penalty is the squared z-score:
    // ((0.06 - 0.11) / 0.05)² = 1.
    fn above_bound_returns_squared_z_score() {
        let term = McGreerDarkPixelBound::default();

        let value = term.compute_likelihood(&output(vec![5.0, 5.9, 7.0], vec![0.3, 0.11, 0.0]));

        assert_abs_diff_eq!(value.unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(term.penalty(0.06), 0.0);
        assert_eq!(term.penalty(0.0), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Off-grid, the neutral fraction is linearly interpolated.
    //
    // Given
    // -----
    // - z = [5.0, 6.0, 7.0], x_HI = [0.0, 0.16, 0.5].
    //
    // Expect
    // ------
    // - x_HI(5.9) = 0.144, penalty ((0.06 - 0.144) / 0.05)² = 2.8224.
    fn interpolates_between_samples() {
        let term = McGreerDarkPixelBound::default();

        let value = term.compute_likelihood(&output(vec![5.0, 6.0, 7.0], vec![0.0, 0.16, 0.5]));

        assert_abs_diff_eq!(value.unwrap(), 2.8224, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A neutral fraction above one is clamped before the penalty.
    fn clamps_before_penalty() {
        let term = McGreerDarkPixelBound::default();

        let value = term.compute_likelihood(&output(vec![5.9, 7.0], vec![1.3, 1.0]));

        assert_abs_diff_eq!(value.unwrap(), ((0.06 - 1.0) / 0.05_f64).powi(2), epsilon = 1e-9);
    }

    #[test]
    fn too_few_redshifts_without_match_fails() {
        let term = McGreerDarkPixelBound::default();

        let err = term.compute_likelihood(&output(vec![6.0, 7.0], vec![0.2, 0.4])).unwrap_err();

        assert!(matches!(err, LikelihoodError::InsufficientRedshifts { term: "McGreer", .. }));
    }
}
