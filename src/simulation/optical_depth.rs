//! simulation::optical_depth — Thomson optical depth from a reionization history.
//!
//! Purpose
//! -------
//! Integrate the electron-scattering optical depth to the CMB,
//!
//! ```text
//! τ = σ_T c ∫₀^{z_max} n_e(z) / ((1 + z) H(z)) dz,
//! n_e(z) = (1 + z)³ [ x_HII(z) (n_H,0 + n_He,0) + [z < z_HeII] n_He,0 ],
//! ```
//!
//! where helium is singly ionized alongside hydrogen and doubly ionized below
//! `z_HeII` (3 by default).
//!
//! Key behaviors
//! -------------
//! - [`OpticalDepth`] is the trait seam the Planck term calls; a driver can
//!   plug in the simulator's own integrator.
//! - [`ThomsonOpticalDepth`] is the reference implementation: `x_HII` is
//!   linearly interpolated on the supplied grid, taken as fully ionized below
//!   the lowest grid redshift, and the integral stops at the highest one.
//!
//! Invariants & assumptions
//! ------------------------
//! - Grid and neutral fractions have equal length ≥ 2; interpolated ionized
//!   fractions are clamped to `[0, 1]`.
use crate::interpolation::{Spline, clamp_unit};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::simulation::cosmology::{CosmoParams, FlatLambdaCdm, simpson};

const SIGMA_T: f64 = 6.652_458_7e-29; // m²
const C_M_S: f64 = 2.997_924_58e8;
const G_SI: f64 = 6.674_3e-11;
const M_PROTON: f64 = 1.672_621_92e-27; // kg
const MPC_M: f64 = 3.085_677_581_491_367e22;

/// Anything that can turn a neutral-fraction history into an optical depth.
pub trait OpticalDepth: Send + Sync + std::fmt::Debug {
    /// Optical depth for the history `(redshifts, xhi)` in cosmology `cosmo`.
    fn compute_tau(&self, redshifts: &[f64], xhi: &[f64], cosmo: &CosmoParams)
    -> LikelihoodResult<f64>;
}

/// ThomsonOpticalDepth — reference optical-depth integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThomsonOpticalDepth {
    /// Redshift below which helium is doubly ionized.
    pub helium_double_ionization_z: f64,
    /// Simpson sub-intervals per unit redshift.
    pub steps_per_unit_z: f64,
}

impl Default for ThomsonOpticalDepth {
    fn default() -> Self {
        Self { helium_double_ionization_z: 3.0, steps_per_unit_z: 400.0 }
    }
}

impl OpticalDepth for ThomsonOpticalDepth {
    fn compute_tau(
        &self, redshifts: &[f64], xhi: &[f64], cosmo: &CosmoParams,
    ) -> LikelihoodResult<f64> {
        if redshifts.len() != xhi.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "optical-depth neutral fractions",
                expected: redshifts.len(),
                found: xhi.len(),
            });
        }
        let history = Spline::linear(redshifts, xhi)?;
        let (z_min, z_max) = history.domain();

        let background = FlatLambdaCdm::new(*cosmo);
        let h0_si = cosmo.h0() * 1.0e3 / MPC_M;
        let rho_crit = 3.0 * h0_si * h0_si / (8.0 * std::f64::consts::PI * G_SI);
        let n_h = rho_crit * cosmo.omega_b * (1.0 - cosmo.y_he) / M_PROTON;
        let n_he = rho_crit * cosmo.omega_b * cosmo.y_he / (4.0 * M_PROTON);

        let x_hii = |z: f64| if z <= z_min { 1.0 } else { clamp_unit(1.0 - history.eval(z)) };
        let integrand = |z: f64| {
            let extra_he = if z < self.helium_double_ionization_z { n_he } else { 0.0 };
            let n_e0 = x_hii(z) * (n_h + n_he) + extra_he;
            let hubble = h0_si * background.efunc(z);
            SIGMA_T * C_M_S * n_e0 * (1.0 + z).powi(2) / hubble
        };

        // Split at the helium step and at the start of the tabulated history so
        // Simpson never straddles a discontinuity in the integrand.
        let mut cuts = vec![0.0, self.helium_double_ionization_z, z_min, z_max];
        cuts.retain(|z| (0.0..=z_max).contains(z));
        cuts.sort_by(f64::total_cmp);
        cuts.dedup();

        let tau = cuts
            .windows(2)
            .map(|w| simpson(&integrand, w[0], w[1], self.steps_per_unit_z))
            .sum();
        Ok(tau)
    }
}
