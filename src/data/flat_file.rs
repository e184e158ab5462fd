//! data::flat_file — whitespace-delimited numeric tables.
//!
//! Purpose
//! -------
//! Read and write the plain-text tables used for mock observations and noise
//! estimates (global-signal mocks, noise files, mock power spectra).
//!
//! Key behaviors
//! -------------
//! - [`read_columns`] returns the requested columns of every data row, in the
//!   order the column indices were given.
//! - [`write_columns`] writes equally long columns as rows, one value per
//!   column, in scientific notation with full `f64` precision so that a
//!   round trip is exact.
//! - [`ObservationalDataset`] packages an `(x, y, optional error)` table
//!   loaded once and never mutated.
//!
//! Conventions
//! -----------
//! - Fields are separated by any run of whitespace.
//! - Blank lines and lines whose first non-blank character is `#` are
//!   skipped.
//! - Line numbers in errors are 1-based.
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Read the columns `columns` (0-based) from a whitespace-delimited table.
///
/// Errors
/// ------
/// - `LikelihoodError::MissingFile` if `path` does not exist.
/// - `LikelihoodError::MalformedFile` if a data row has fewer fields than
///   the largest requested index or a requested field is not a number.
/// - `LikelihoodError::Io` for other read failures.
pub fn read_columns(path: &Path, columns: &[usize]) -> LikelihoodResult<Vec<Vec<f64>>> {
    let text = fs::read_to_string(path).map_err(|e| LikelihoodError::io(path, e))?;
    let mut out: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        for (slot, &col) in columns.iter().enumerate() {
            let raw = fields.get(col).ok_or_else(|| LikelihoodError::MalformedFile {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("expected at least {} columns, found {}", col + 1, fields.len()),
            })?;
            let value: f64 = raw.parse().map_err(|_| LikelihoodError::MalformedFile {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("column {col} is not a number: {raw:?}"),
            })?;
            out[slot].push(value);
        }
    }

    debug!("read {} rows from {}", out.first().map_or(0, Vec::len), path.display());
    Ok(out)
}

/// Write equally long `columns` as whitespace-separated rows.
///
/// Parent directories are created when missing.
pub fn write_columns(path: &Path, columns: &[&[f64]]) -> LikelihoodResult<()> {
    let rows = columns.first().map_or(0, |c| c.len());
    for col in columns {
        if col.len() != rows {
            return Err(LikelihoodError::ShapeMismatch {
                what: "output columns",
                expected: rows,
                found: col.len(),
            });
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LikelihoodError::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| LikelihoodError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for row in 0..rows {
        let line: Vec<String> = columns.iter().map(|c| format!("{:.17e}", c[row])).collect();
        writeln!(writer, "{}", line.join(" ")).map_err(|e| LikelihoodError::io(path, e))?;
    }
    writer.flush().map_err(|e| LikelihoodError::io(path, e))?;

    debug!("wrote {rows} rows to {}", path.display());
    Ok(())
}

/// ObservationalDataset — an immutable `(x, y, optional error)` table.
///
/// Fields
/// ------
/// - `x`: independent variable (redshift, frequency or wavenumber k).
/// - `y`: the matching measurement.
/// - `errors`: optional per-row uncertainty.
///
/// Invariants
/// ----------
/// - `x.len() == y.len()`, and `errors` (when present) has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationalDataset {
    x: Vec<f64>,
    y: Vec<f64>,
    errors: Option<Vec<f64>>,
}

impl ObservationalDataset {
    /// Build a dataset from in-memory columns, checking their lengths.
    pub fn new(x: Vec<f64>, y: Vec<f64>, errors: Option<Vec<f64>>) -> LikelihoodResult<Self> {
        if y.len() != x.len() {
            return Err(LikelihoodError::ShapeMismatch {
                what: "dataset values",
                expected: x.len(),
                found: y.len(),
            });
        }
        if let Some(err) = &errors {
            if err.len() != x.len() {
                return Err(LikelihoodError::ShapeMismatch {
                    what: "dataset errors",
                    expected: x.len(),
                    found: err.len(),
                });
            }
        }
        Ok(Self { x, y, errors })
    }

    /// Load `x_col`, `y_col` and optionally `err_col` from a flat file.
    pub fn load(
        path: &Path, x_col: usize, y_col: usize, err_col: Option<usize>,
    ) -> LikelihoodResult<Self> {
        let mut wanted = vec![x_col, y_col];
        wanted.extend(err_col);
        let mut cols = read_columns(path, &wanted)?.into_iter();
        let x = cols.next().unwrap_or_default();
        let y = cols.next().unwrap_or_default();
        let errors = cols.next();
        Self::new(x, y, errors)
    }

    /// Keep only the rows whose `x` satisfies `keep`.
    pub fn filter_x(&self, keep: impl Fn(f64) -> bool) -> Self {
        let idx: Vec<usize> = (0..self.x.len()).filter(|&i| keep(self.x[i])).collect();
        Self {
            x: idx.iter().map(|&i| self.x[i]).collect(),
            y: idx.iter().map(|&i| self.y[i]).collect(),
            errors: self.errors.as_ref().map(|e| idx.iter().map(|&i| e[i]).collect()),
        }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn errors(&self) -> Option<&[f64]> {
        self.errors.as_deref()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
