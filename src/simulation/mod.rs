//! simulation — what the likelihoods consume from the simulator side.
//!
//! Purpose
//! -------
//! Define the read-only [`SimulationOutput`] schema and the numerical
//! services the likelihood terms call into: comoving distances
//! ([`Cosmology`]), the CMB optical depth ([`OpticalDepth`]) and binned power
//! spectra ([`PowerSpectrumEstimator`]). Each service is a trait so a driver
//! can plug in the simulator's own routines; reference implementations are
//! provided for all three.
//!
//! Key behaviors
//! -------------
//! - [`FlatLambdaCdm`]: flat ΛCDM distances by Simpson integration.
//! - [`ThomsonOpticalDepth`]: electron-scattering optical depth of a
//!   neutral-fraction history.
//! - [`FftPowerEstimator`] (feature `fft`): spherically averaged power via a
//!   3-D FFT.
//! - [`Simulator`] / [`SimulationRequest`]: the call used to bootstrap mock
//!   data.

pub mod cosmology;
pub mod optical_depth;
pub mod output;
pub mod power;
pub mod simulator;

pub use self::cosmology::{CosmoParams, Cosmology, FlatLambdaCdm};
pub use self::optical_depth::{OpticalDepth, ThomsonOpticalDepth};
pub use self::output::SimulationOutput;
#[cfg(feature = "fft")]
pub use self::power::FftPowerEstimator;
pub use self::power::{PowerSpectrum, PowerSpectrumEstimator, RawPower, default_bin_count};
pub use self::simulator::{SimulationRequest, Simulator};
