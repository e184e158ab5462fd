//! data::prior_table — cached probability tables for external priors.
//!
//! The QSO damping-wing constraint ships as a tabulated PDF of the IGM
//! neutral fraction. It is stored as two JSON arrays in a cache directory:
//!
//! ```text
//! <cache_dir>/PriorData/NeutralFractionsForPDF.json      # x_HI grid
//! <cache_dir>/PriorData/NeutralFractionPDF_SmallHII.json # PDF values
//! ```
//!
//! The table is loaded once and normalized so that its peak equals one.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Sub-directory of the cache directory holding prior tables.
pub const PRIOR_DATA_DIR: &str = "PriorData";
/// File name of the neutral-fraction grid.
pub const NF_GRID_FILE: &str = "NeutralFractionsForPDF.json";
/// File name of the matching PDF values.
pub const NF_PDF_FILE: &str = "NeutralFractionPDF_SmallHII.json";

/// PriorTable — `(neutral-fraction grid, normalized PDF)` pairs.
///
/// Invariants
/// ----------
/// - `x_values.len() == pdf_values.len()`.
/// - `max(pdf_values) == 1` whenever the raw table had a positive peak.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorTable {
    x_values: Vec<f64>,
    pdf_values: Vec<f64>,
}

impl PriorTable {
    /// Build a table from raw values, normalizing the PDF to a unit peak.
    pub fn new(x_values: Vec<f64>, mut pdf_values: Vec<f64>) -> LikelihoodResult<Self> {
        if pdf_values.len() != x_values.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "prior PDF values",
                expected: x_values.len(),
                found: pdf_values.len(),
            });
        }
        let peak = pdf_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if peak.is_finite() && peak > 0.0 {
            pdf_values.iter_mut().for_each(|p| *p /= peak);
        }
        Ok(Self { x_values, pdf_values })
    }

    /// Load the damping-wing table from `<cache_dir>/PriorData/`.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::MissingFile` if either file is absent.
    /// - `LikelihoodError::Json` if a file is not a JSON array of numbers.
    /// - `LikelihoodError::ShapeMismatch` if the arrays differ in length.
    pub fn load(cache_dir: &Path) -> LikelihoodResult<Self> {
        let dir = cache_dir.join(PRIOR_DATA_DIR);
        let x_values = read_json_array(&dir.join(NF_GRID_FILE))?;
        let pdf_values = read_json_array(&dir.join(NF_PDF_FILE))?;
        debug!("loaded {}-point prior table from {}", x_values.len(), dir.display());
        Self::new(x_values, pdf_values)
    }

    /// Write the table into `<cache_dir>/PriorData/` in the layout `load` reads.
    pub fn save(&self, cache_dir: &Path) -> LikelihoodResult<()> {
        let dir = cache_dir.join(PRIOR_DATA_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| LikelihoodError::io(&dir, e))?;
        write_json_array(&dir.join(NF_GRID_FILE), &self.x_values)?;
        write_json_array(&dir.join(NF_PDF_FILE), &self.pdf_values)
    }

    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    pub fn pdf_values(&self) -> &[f64] {
        &self.pdf_values
    }
}

fn read_json_array(path: &Path) -> LikelihoodResult<Vec<f64>> {
    let file = File::open(path).map_err(|e| LikelihoodError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LikelihoodError::Json { path: path.to_path_buf(), message: e.to_string() })
}

fn write_json_array(path: &Path, values: &[f64]) -> LikelihoodResult<()> {
    let file = File::create(path).map_err(|e| LikelihoodError::io(path, e))?;
    serde_json::to_writer(file, values)
        .map_err(|e| LikelihoodError::Json { path: path.to_path_buf(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // The PDF is rescaled so that its maximum is exactly one.
    fn new_normalizes_peak_to_unity() {
        let table = PriorTable::new(vec![0.0, 0.5, 1.0], vec![0.5, 4.0, 2.0]).unwrap();
        assert_eq!(table.pdf_values(), &[0.125, 1.0, 0.5]);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let table = PriorTable::new(vec![0.0, 0.25, 0.5, 0.75, 1.0], vec![0.1, 0.6, 1.0, 0.4, 0.05])
            .unwrap();

        table.save(dir.path()).unwrap();
        let back = PriorTable::load(dir.path()).unwrap();

        assert_eq!(back, table);
    }

    #[test]
    // Purpose
    // -------
    // An absent cache is a fatal setup error naming the missing path.
    fn load_without_cache_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = PriorTable::load(dir.path()).unwrap_err();

        match err {
            LikelihoodError::MissingFile { path } => assert!(path.ends_with(NF_GRID_FILE)),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_non_numeric_json() {
        let dir = tempfile::tempdir().unwrap();
        let prior = dir.path().join(PRIOR_DATA_DIR);
        std::fs::create_dir_all(&prior).unwrap();
        std::fs::write(prior.join(NF_GRID_FILE), "{\"not\": \"an array\"}").unwrap();

        assert!(matches!(PriorTable::load(dir.path()), Err(LikelihoodError::Json { .. })));
    }
}
