//! simulation::cosmology — background cosmology used by the likelihoods.
//!
//! Purpose
//! -------
//! Provide the comoving-distance function the lightcone power-spectrum term
//! needs to turn a redshift window into a line-of-sight length, and the
//! expansion rate used by the optical-depth integral.
//!
//! Key behaviors
//! -------------
//! - [`CosmoParams`]: the handful of parameters the simulator and the
//!   integrators share (defaults: Planck 2015).
//! - [`Cosmology`]: trait seam for anything exposing `comoving_distance(z)`.
//! - [`FlatLambdaCdm`]: flat ΛCDM (matter + Λ, radiation neglected) with
//!   distances computed by composite Simpson integration.
//!
//! Conventions
//! -----------
//! - Distances are in Mpc, `H(z)` in km s⁻¹ Mpc⁻¹.
use serde::{Deserialize, Serialize};

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Speed of light in km/s.
pub const C_KM_S: f64 = 299_792.458;

/// Simpson sub-intervals per unit redshift for distance integrals.
const STEPS_PER_UNIT_Z: f64 = 200.0;

/// CosmoParams — cosmological parameters shared with the simulator.
///
/// Fields
/// ------
/// - `hubble`: dimensionless Hubble constant `h` (H0 = 100 h km/s/Mpc).
/// - `omega_m`: matter density today.
/// - `omega_b`: baryon density today.
/// - `y_he`: primordial helium mass fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmoParams {
    pub hubble: f64,
    pub omega_m: f64,
    pub omega_b: f64,
    pub y_he: f64,
}

impl CosmoParams {
    /// Validated constructor.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::InvalidOption` if `hubble` or `omega_m` are not
    ///   finite and positive, if `omega_b` is outside `(0, omega_m]`, or if
    ///   `y_he` is outside `[0, 1)`.
    pub fn new(hubble: f64, omega_m: f64, omega_b: f64, y_he: f64) -> LikelihoodResult<Self> {
        if !(hubble.is_finite() && hubble > 0.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "hubble",
                value: hubble,
                reason: "must be finite and > 0",
            });
        }
        if !(omega_m.is_finite() && omega_m > 0.0 && omega_m <= 1.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "omega_m",
                value: omega_m,
                reason: "must lie in (0, 1] for a flat universe",
            });
        }
        if !(omega_b.is_finite() && omega_b > 0.0 && omega_b <= omega_m) {
            return Err(LikelihoodError::InvalidOption {
                name: "omega_b",
                value: omega_b,
                reason: "must lie in (0, omega_m]",
            });
        }
        if !(y_he.is_finite() && (0.0..1.0).contains(&y_he)) {
            return Err(LikelihoodError::InvalidOption {
                name: "y_he",
                value: y_he,
                reason: "must lie in [0, 1)",
            });
        }
        Ok(Self { hubble, omega_m, omega_b, y_he })
    }

    /// Hubble constant in km/s/Mpc.
    pub fn h0(&self) -> f64 {
        100.0 * self.hubble
    }
}

impl Default for CosmoParams {
    fn default() -> Self {
        Self { hubble: 0.6774, omega_m: 0.3075, omega_b: 0.0486, y_he: 0.245 }
    }
}

/// Anything that can map redshift to comoving distance.
pub trait Cosmology: Send + Sync + std::fmt::Debug {
    /// Line-of-sight comoving distance to redshift `z`, in Mpc.
    fn comoving_distance(&self, z: f64) -> f64;
}

/// FlatLambdaCdm — flat matter + Λ background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatLambdaCdm {
    params: CosmoParams,
}

impl FlatLambdaCdm {
    pub fn new(params: CosmoParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CosmoParams {
        &self.params
    }

    /// Dimensionless expansion rate `E(z) = H(z) / H0`.
    pub fn efunc(&self, z: f64) -> f64 {
        let om = self.params.omega_m;
        (om * (1.0 + z).powi(3) + (1.0 - om)).sqrt()
    }

    /// Expansion rate in km/s/Mpc.
    pub fn hubble_parameter(&self, z: f64) -> f64 {
        self.params.h0() * self.efunc(z)
    }

    /// Hubble distance `c / H0` in Mpc.
    pub fn hubble_distance(&self) -> f64 {
        C_KM_S / self.params.h0()
    }
}

impl Default for FlatLambdaCdm {
    fn default() -> Self {
        Self::new(CosmoParams::default())
    }
}

impl Cosmology for FlatLambdaCdm {
    fn comoving_distance(&self, z: f64) -> f64 {
        if z <= 0.0 {
            return 0.0;
        }
        self.hubble_distance() * simpson(|zz| 1.0 / self.efunc(zz), 0.0, z, STEPS_PER_UNIT_Z)
    }
}

/// Composite Simpson rule on `[a, b]` with about `per_unit` sub-intervals per
/// unit length (at least 16, always even).
pub(crate) fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, per_unit: f64) -> f64 {
    let span = b - a;
    if span == 0.0 {
        return 0.0;
    }
    let mut n = ((span.abs() * per_unit).ceil() as usize).max(16);
    if n % 2 == 1 {
        n += 1;
    }
    let h = span / n as f64;
    let mut acc = f(a) + f(b);
    for i in 1..n {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        acc += w * f(a + h * i as f64);
    }
    acc * h / 3.0
}
