//! data — observational tables loaded once at setup time.
//!
//! Purpose
//! -------
//! Hold the fixed observational side of every likelihood: mock observations,
//! noise estimates and cached prior PDFs. Everything here is read once in a
//! term's setup and treated as immutable afterwards.
//!
//! Key behaviors
//! -------------
//! - [`read_columns`] / [`write_columns`]: whitespace-delimited numeric
//!   tables (comment lines starting with `#` are skipped).
//! - [`ObservationalDataset`]: `(x, y, optional error)` rows with a
//!   row-aligned `filter_x`.
//! - [`PriorTable`]: the JSON-cached damping-wing PDF, normalized to a unit
//!   peak.
//! - [`default_data_dir`]: the per-user directory the likelihoods read from
//!   unless told otherwise.
//!
//! Conventions
//! -----------
//! - A missing file is always `LikelihoodError::MissingFile`; parse failures
//!   carry a 1-based line number.

pub mod flat_file;
pub mod prior_table;

pub use self::flat_file::{ObservationalDataset, read_columns, write_columns};
pub use self::prior_table::PriorTable;

use std::path::PathBuf;

/// Name of the per-user data directory under `$HOME`.
pub const DATA_DIR_NAME: &str = ".py21cmmc";

/// Default location of mock data, noise data and cached priors:
/// `$HOME/.py21cmmc`, or `./.py21cmmc` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Cached priors and mock data live in the per-user `.py21cmmc` directory
    // shared with existing 21CMMC installations.
    fn default_data_dir_is_py21cmmc() {
        let dir = default_data_dir();

        assert_eq!(dir.file_name().and_then(|n| n.to_str()), Some(".py21cmmc"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(dir, home.join(".py21cmmc"));
        }
    }
}
