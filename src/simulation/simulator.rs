//! simulation::simulator — the seam to the external reionization simulator.
//!
//! Only the data-bootstrapping paths (`simulate_data` on the power-spectrum
//! terms) run a simulation themselves; normal evaluation receives an
//! already-computed [`SimulationOutput`].
use std::collections::BTreeMap;

use crate::likelihood::errors::LikelihoodResult;
use crate::simulation::cosmology::CosmoParams;
use crate::simulation::output::SimulationOutput;

/// SimulationRequest — everything the simulator needs for one run.
///
/// Fields
/// ------
/// - `redshifts`: redshifts at which to sample the global history (and the
///   co-eval boxes).
/// - `box_len`: transverse comoving box size in Mpc.
/// - `use_lightcone`: also produce a lightcone box.
/// - `cosmo`: cosmological parameters.
/// - `astro`: named astrophysical parameters, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub redshifts: Vec<f64>,
    pub box_len: f64,
    pub use_lightcone: bool,
    pub cosmo: CosmoParams,
    pub astro: BTreeMap<String, f64>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            redshifts: vec![6.0, 7.0, 8.0, 9.0, 10.0],
            box_len: 300.0,
            use_lightcone: true,
            cosmo: CosmoParams::default(),
            astro: BTreeMap::new(),
        }
    }
}

/// Anything that can run a reionization simulation.
pub trait Simulator {
    fn run(&self, request: &SimulationRequest) -> LikelihoodResult<SimulationOutput>;
}
