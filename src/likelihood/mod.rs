//! likelihood — log-likelihood terms for reionization parameter inference.
//!
//! Purpose
//! -------
//! Turn one simulated reionization history
//! ([`SimulationOutput`](crate::simulation::SimulationOutput)) and fixed
//! observational constraints into scalar log-likelihood contributions for an
//! external MCMC sampler.
//!
//! Key behaviors
//! -------------
//! - Six terms, each behind [`LikelihoodTerm`]:
//!   - [`PlanckOpticalDepthPrior`]: Gaussian prior on the CMB optical depth.
//!   - [`McGreerDarkPixelBound`]: one-sided bound on `x_HI(z = 5.9)`.
//!   - [`GreigQsoDampingWing`]: tabulated QSO damping-wing PDF at
//!     `z = 7.0842`.
//!   - [`GlobalSignalChiSquared`]: chi-squared on the global 21-cm signal.
//!   - [`LightconePowerChiSquared`] / [`CoevalPowerChiSquared`]: chi-squared
//!     on the 1-D 21-cm power spectrum.
//! - Two-phase construction: option structs are validated and then `setup`
//!   (or `new`, for terms without I/O) yields an immutable ready term.
//! - [`LikelihoodSet`] sets up a list of [`LikelihoodConfig`]s and sums the
//!   contributions of its terms.
//!
//! Conventions
//! -----------
//! - The Planck, McGreer and Greig terms return positive penalties; the
//!   chi-squared terms return `-0.5 χ²`. [`LikelihoodSet::evaluate`] adds
//!   them as they are.
//! - Resampled neutral fractions are always clamped to `[0, 1]`.
//!
//! Downstream usage
//! ----------------
//! - `use eor_likelihood::likelihood::prelude::*;` brings the terms, their
//!   options, the set and the error type into scope.

pub mod errors;
pub mod global_signal;
pub mod greig;
pub mod mcgreer;
pub mod mock_power;
pub mod planck;
pub mod power_coeval;
pub mod power_lightcone;
pub mod resolve;
pub mod set;
pub mod traits;

pub use self::errors::{LikelihoodError, LikelihoodResult};
pub use self::global_signal::{GlobalSignalChiSquared, GlobalSignalOptions, frequency_mhz};
pub use self::greig::{GreigOptions, GreigQsoDampingWing};
pub use self::mcgreer::{McGreerDarkPixelBound, McGreerOptions};
pub use self::mock_power::MockPower;
pub use self::planck::{PlanckOpticalDepthPrior, PlanckOptions};
pub use self::power_coeval::{CoevalPowerChiSquared, CoevalPowerOptions};
pub use self::power_lightcone::{LightconePowerChiSquared, LightconePowerOptions};
pub use self::resolve::{ResolvePolicy, resolve_at};
pub use self::set::{Evaluation, Likelihood, LikelihoodConfig, LikelihoodSet, Services};
pub use self::traits::LikelihoodTerm;

pub mod prelude {
    pub use super::errors::{LikelihoodError, LikelihoodResult};
    pub use super::global_signal::{GlobalSignalChiSquared, GlobalSignalOptions};
    pub use super::greig::{GreigOptions, GreigQsoDampingWing};
    pub use super::mcgreer::{McGreerDarkPixelBound, McGreerOptions};
    pub use super::planck::{PlanckOpticalDepthPrior, PlanckOptions};
    pub use super::power_coeval::{CoevalPowerChiSquared, CoevalPowerOptions};
    pub use super::power_lightcone::{LightconePowerChiSquared, LightconePowerOptions};
    pub use super::set::{Evaluation, Likelihood, LikelihoodConfig, LikelihoodSet, Services};
    pub use super::traits::LikelihoodTerm;
    pub use crate::simulation::{CosmoParams, SimulationOutput};
}
