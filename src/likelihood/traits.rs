//! likelihood::traits — the contract every likelihood term implements.
//!
//! A term is built in two phases: an immutable options struct describes it,
//! and a `setup` (or `new`, for terms without I/O) produces the ready term.
//! Only ready terms implement [`LikelihoodTerm`], so there is no way to
//! evaluate an unconfigured or abstract term.
use crate::likelihood::errors::LikelihoodResult;
use crate::simulation::{PowerSpectrum, SimulationOutput};

/// LikelihoodTerm — one physical constraint evaluated against a simulation.
///
/// Implementations are pure functions of their post-setup state and the
/// simulation output, so they are `Send + Sync` and can be evaluated from
/// several threads once setup has completed.
pub trait LikelihoodTerm: Send + Sync + std::fmt::Debug {
    /// Short static name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Contribution of this term to the log-likelihood for `output`.
    ///
    /// The sign convention is per term: the Gaussian priors (Planck, McGreer)
    /// and the Greig PDF return a positive `χ²`-like penalty, the
    /// chi-squared comparisons return `-0.5 χ²`.
    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64>;

    /// The contribution together with the model power spectrum it was
    /// computed from, for terms that compare spectra. Other terms return
    /// `None`.
    fn compute_likelihood_and_power(
        &self, output: &SimulationOutput,
    ) -> LikelihoodResult<(f64, Option<PowerSpectrum>)> {
        Ok((self.compute_likelihood(output)?, None))
    }
}
