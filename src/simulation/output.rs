//! simulation::output — the read-only schema every likelihood consumes.
//!
//! A [`SimulationOutput`] is produced once per MCMC step by the external
//! simulator and passed by shared reference to every likelihood term. Terms
//! never mutate it.
//!
//! Invariants
//! ----------
//! - `redshifts`, `average_nf` and `average_tb` have the same length.
//! - When present, the lightcone box has `redshift_slices.len()` cells along
//!   axis 2 (line of sight).
//! - When present, there is one co-eval box per entry of `redshifts`.
//! - `box_len` is finite and positive.
//!
//! Ordering of `redshifts` is not checked here: terms that interpolate the
//! history reject non-monotone grids through the spline constructor.
//!
//! An output can be stored as JSON ([`SimulationOutput::save_json`]) and read
//! back through the same validating builders. The distance calculator is not
//! stored; a loaded output uses [`FlatLambdaCdm`] for its `cosmo_params`.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use log::debug;
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::simulation::cosmology::{CosmoParams, Cosmology, FlatLambdaCdm};

/// SimulationOutput — redshift history plus optional 3-D fields.
///
/// Fields
/// ------
/// - `redshifts`: redshifts at which the global history was sampled.
/// - `average_nf`: mean neutral fraction per redshift (may leave `[0, 1]`
///   slightly through numerical noise).
/// - `average_tb`: mean brightness temperature per redshift, in mK.
/// - `lightcone_box`: optional `(x, y, line of sight)` brightness-temperature
///   lightcone.
/// - `redshift_slices`: redshift of each line-of-sight cell.
/// - `coeval_boxes`: optional co-eval brightness-temperature boxes, one per
///   entry of `redshifts`.
/// - `box_len`: transverse comoving box size in Mpc.
/// - `cosmo_params`: parameters the simulation ran with.
/// - `cosmology`: distance calculator for those parameters.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    redshifts: Vec<f64>,
    average_nf: Vec<f64>,
    average_tb: Vec<f64>,
    lightcone_box: Option<Array3<f64>>,
    redshift_slices: Vec<f64>,
    coeval_boxes: Option<Vec<Array3<f64>>>,
    box_len: f64,
    cosmo_params: CosmoParams,
    cosmology: Arc<dyn Cosmology>,
}

impl SimulationOutput {
    /// Build an output holding only the global history.
    ///
    /// The distance calculator defaults to [`FlatLambdaCdm`] for
    /// `cosmo_params`; override it with [`SimulationOutput::with_cosmology`].
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::ShapeMismatch` if the three histories differ in
    ///   length.
    /// - `LikelihoodError::InvalidOption` if `box_len` is not finite and
    ///   positive.
    pub fn new(
        redshifts: Vec<f64>, average_nf: Vec<f64>, average_tb: Vec<f64>, box_len: f64,
        cosmo_params: CosmoParams,
    ) -> LikelihoodResult<Self> {
        if average_nf.len() != redshifts.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "average_nf",
                expected: redshifts.len(),
                found: average_nf.len(),
            });
        }
        if average_tb.len() != redshifts.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "average_tb",
                expected: redshifts.len(),
                found: average_tb.len(),
            });
        }
        if !(box_len.is_finite() && box_len > 0.0) {
            return Err(LikelihoodError::InvalidOption {
                name: "box_len",
                value: box_len,
                reason: "must be finite and > 0",
            });
        }
        Ok(Self {
            redshifts,
            average_nf,
            average_tb,
            lightcone_box: None,
            redshift_slices: Vec::new(),
            coeval_boxes: None,
            box_len,
            cosmo_params,
            cosmology: Arc::new(FlatLambdaCdm::new(cosmo_params)),
        })
    }

    /// Attach a lightcone box and the redshift of each line-of-sight cell.
    pub fn with_lightcone(
        mut self, lightcone_box: Array3<f64>, redshift_slices: Vec<f64>,
    ) -> LikelihoodResult<Self> {
        let depth = lightcone_box.len_of(Axis(2));
        if depth != redshift_slices.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "redshift_slices",
                expected: depth,
                found: redshift_slices.len(),
            });
        }
        self.lightcone_box = Some(lightcone_box);
        self.redshift_slices = redshift_slices;
        Ok(self)
    }

    /// Attach one co-eval box per simulated redshift.
    pub fn with_coeval_boxes(mut self, boxes: Vec<Array3<f64>>) -> LikelihoodResult<Self> {
        if boxes.len() != self.redshifts.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "coeval_boxes",
                expected: self.redshifts.len(),
                found: boxes.len(),
            });
        }
        self.coeval_boxes = Some(boxes);
        Ok(self)
    }

    /// Replace the distance calculator.
    pub fn with_cosmology(mut self, cosmology: Arc<dyn Cosmology>) -> Self {
        self.cosmology = cosmology;
        self
    }

    pub fn redshifts(&self) -> &[f64] {
        &self.redshifts
    }

    pub fn average_nf(&self) -> &[f64] {
        &self.average_nf
    }

    pub fn average_tb(&self) -> &[f64] {
        &self.average_tb
    }

    pub fn lightcone_box(&self) -> Option<&Array3<f64>> {
        self.lightcone_box.as_ref()
    }

    pub fn redshift_slices(&self) -> &[f64] {
        &self.redshift_slices
    }

    pub fn coeval_boxes(&self) -> Option<&[Array3<f64>]> {
        self.coeval_boxes.as_deref()
    }

    pub fn box_len(&self) -> f64 {
        self.box_len
    }

    pub fn cosmo_params(&self) -> &CosmoParams {
        &self.cosmo_params
    }

    pub fn cosmology(&self) -> &dyn Cosmology {
        self.cosmology.as_ref()
    }

    /// Write the output (without its distance calculator) to `path` as JSON.
    pub fn save_json(&self, path: &Path) -> LikelihoodResult<()> {
        let stored = StoredOutput {
            redshifts: self.redshifts.clone(),
            average_nf: self.average_nf.clone(),
            average_tb: self.average_tb.clone(),
            lightcone_box: self.lightcone_box.clone(),
            redshift_slices: self.redshift_slices.clone(),
            coeval_boxes: self.coeval_boxes.clone(),
            box_len: self.box_len,
            cosmo_params: self.cosmo_params,
        };
        let file = File::create(path).map_err(|e| LikelihoodError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &stored)
            .map_err(|e| LikelihoodError::Json { path: path.to_path_buf(), message: e.to_string() })?;
        writer.flush().map_err(|e| LikelihoodError::io(path, e))?;
        debug!("saved simulation output to {}", path.display());
        Ok(())
    }

    /// Read an output written by [`SimulationOutput::save_json`].
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::MissingFile` / `Json` for the file.
    /// - Any shape error of the builders.
    pub fn load_json(path: &Path) -> LikelihoodResult<Self> {
        let file = File::open(path).map_err(|e| LikelihoodError::io(path, e))?;
        let stored: StoredOutput = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LikelihoodError::Json { path: path.to_path_buf(), message: e.to_string() })?;

        let mut out = Self::new(
            stored.redshifts,
            stored.average_nf,
            stored.average_tb,
            stored.box_len,
            stored.cosmo_params,
        )?;
        if let Some(lightcone) = stored.lightcone_box {
            out = out.with_lightcone(lightcone, stored.redshift_slices)?;
        }
        if let Some(boxes) = stored.coeval_boxes {
            out = out.with_coeval_boxes(boxes)?;
        }
        Ok(out)
    }
}

/// On-disk form of a [`SimulationOutput`].
#[derive(Serialize, Deserialize)]
struct StoredOutput {
    redshifts: Vec<f64>,
    average_nf: Vec<f64>,
    average_tb: Vec<f64>,
    lightcone_box: Option<Array3<f64>>,
    redshift_slices: Vec<f64>,
    coeval_boxes: Option<Vec<Array3<f64>>>,
    box_len: f64,
    cosmo_params: CosmoParams,
}
