//! likelihood::global_signal — chi-squared on the sky-averaged 21-cm signal.
//!
//! Purpose
//! -------
//! Compare the simulated global brightness temperature `T_b(z)` against a
//! mock observation, in frequency space.
//!
//! Key behaviors
//! -------------
//! - Redshifts are mapped to observed frequency with
//!   `ν = c / (0.2112 m · (1 + z)) / 10⁶` (MHz), so both curves are fitted
//!   on an increasing abscissa.
//! - Mock and model `T_b(ν)` are fitted with cubic interpolating splines.
//! - Fixed-error mode compares the curves at `⌊(ν_max - ν_min) / Δν⌋ + 1`
//!   evenly spaced frequencies with a single error; file-error mode compares
//!   them at the noise-file frequencies inside `[ν_min, ν_max]` with the
//!   tabulated errors.
//! - The term returns `-0.5 Σ ((mock - model) / σ)²`.
//!
//! Conventions
//! -----------
//! - Mock file: column 0 redshift, column 2 brightness temperature.
//! - Noise file: column 0 redshift, column 1 error.
//! - Everything that depends only on the mock and noise data (the mock
//!   spline values at the comparison frequencies) is computed once in setup.
use std::path::PathBuf;

use log::{debug, trace};

use crate::data::{ObservationalDataset, default_data_dir, read_columns};
use crate::interpolation::Spline;
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::traits::LikelihoodTerm;
use crate::simulation::SimulationOutput;

/// Speed of light used by the frequency conversion, in m/s.
pub const SPEED_OF_LIGHT_M_S: f64 = 2.99792e8;
/// Rest-frame wavelength of the 21-cm line, in m.
pub const HI_WAVELENGTH_M: f64 = 0.2112;

/// Observed frequency in MHz of 21-cm emission from redshift `z`.
#[inline]
pub fn frequency_mhz(z: f64) -> f64 {
    SPEED_OF_LIGHT_M_S / (HI_WAVELENGTH_M * (1.0 + z)) / 1.0e6
}

/// GlobalSignalOptions — data location and error model.
///
/// Fields
/// ------
/// - `fixed_error`: use a single error on an even frequency grid instead of
///   the noise file.
/// - `model_name`: mock model, used to build the default file paths.
/// - `mock_dir`: root of `MockData/` and `NoiseData/` (default `$HOME/.py21cmmc`).
/// - `fixed_global_error`: error (mK) in fixed-error mode.
/// - `fixed_global_bandwidth`: grid spacing (MHz) in fixed-error mode.
/// - `frequency_min`, `frequency_max`: comparison window (MHz).
/// - `obs_filename`, `obs_error_filename`: explicit paths overriding the
///   defaults built from `mock_dir` and `model_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSignalOptions {
    pub fixed_error: bool,
    pub model_name: String,
    pub mock_dir: PathBuf,
    pub fixed_global_error: f64,
    pub fixed_global_bandwidth: f64,
    pub frequency_min: f64,
    pub frequency_max: f64,
    pub obs_filename: Option<PathBuf>,
    pub obs_error_filename: Option<PathBuf>,
}

impl Default for GlobalSignalOptions {
    fn default() -> Self {
        Self {
            fixed_error: false,
            model_name: "FaintGalaxies".to_string(),
            mock_dir: default_data_dir(),
            fixed_global_error: 10.0,
            fixed_global_bandwidth: 4.0,
            frequency_min: 40.0,
            frequency_max: 200.0,
            obs_filename: None,
            obs_error_filename: None,
        }
    }
}

impl GlobalSignalOptions {
    /// Default options reading `model_name` from `mock_dir`.
    pub fn new(model_name: impl Into<String>, mock_dir: PathBuf) -> Self {
        Self { model_name: model_name.into(), mock_dir, ..Self::default() }
    }

    /// `<mock_dir>/MockData/<model>/GlobalSignal/<model>_GlobalSignal.txt`
    pub fn obs_path(&self) -> PathBuf {
        self.obs_filename.clone().unwrap_or_else(|| {
            self.mock_dir
                .join("MockData")
                .join(&self.model_name)
                .join("GlobalSignal")
                .join(format!("{}_GlobalSignal.txt", self.model_name))
        })
    }

    /// `<mock_dir>/NoiseData/<model>/GlobalSignal/TotalError_<model>_GlobalSignal_ConstantError_1000hr.txt`
    pub fn error_path(&self) -> PathBuf {
        self.obs_error_filename.clone().unwrap_or_else(|| {
            self.mock_dir.join("NoiseData").join(&self.model_name).join("GlobalSignal").join(format!(
                "TotalError_{}_GlobalSignal_ConstantError_1000hr.txt",
                self.model_name
            ))
        })
    }

    /// Check the error model and the frequency window.
    pub fn validate(&self) -> LikelihoodResult<()> {
        if !(self.frequency_min.is_finite()
            && self.frequency_max.is_finite()
            && self.frequency_min < self.frequency_max)
        {
            return Err(LikelihoodError::InvalidOption {
                name: "frequency_max",
                value: self.frequency_max,
                reason: "must be finite and exceed frequency_min",
            });
        }
        if self.fixed_error {
            if !(self.fixed_global_error.is_finite() && self.fixed_global_error > 0.0) {
                return Err(LikelihoodError::InvalidOption {
                    name: "fixed_global_error",
                    value: self.fixed_global_error,
                    reason: "must be finite and > 0",
                });
            }
            if !(self.fixed_global_bandwidth.is_finite() && self.fixed_global_bandwidth > 0.0) {
                return Err(LikelihoodError::InvalidOption {
                    name: "fixed_global_bandwidth",
                    value: self.fixed_global_bandwidth,
                    reason: "must be finite and > 0",
                });
            }
        }
        Ok(())
    }

    /// Load the mock (and noise) data and build the ready term.
    ///
    /// Errors
    /// ------
    /// - `LikelihoodError::InvalidOption` from [`GlobalSignalOptions::validate`].
    /// - `LikelihoodError::MissingFile` / `MalformedFile` for the data files.
    /// - `LikelihoodError::Spline` if the mock curve cannot be fitted.
    pub fn setup(&self) -> LikelihoodResult<GlobalSignalChiSquared> {
        self.validate()?;

        let obs_path = self.obs_path();
        let mock = ObservationalDataset::load(&obs_path, 0, 2, None)?;
        debug!(
            "{}: {} mock rows loaded from {}",
            GlobalSignalChiSquared::NAME,
            mock.len(),
            obs_path.display()
        );

        let errors = if self.fixed_error {
            None
        } else {
            let err_path = self.error_path();
            let mut cols = read_columns(&err_path, &[0, 1])?.into_iter();
            let z = cols.next().unwrap_or_default();
            let sigma = cols.next().unwrap_or_default();
            debug!(
                "{}: {} noise rows loaded from {}",
                GlobalSignalChiSquared::NAME,
                z.len(),
                err_path.display()
            );
            Some(ObservationalDataset::new(z, sigma, None)?)
        };

        GlobalSignalChiSquared::from_data(self.clone(), &mock, errors.as_ref())
    }
}

/// A comparison point: frequency, mock value there, and its error.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ComparisonPoint {
    frequency: f64,
    mock: f64,
    sigma: f64,
}

/// GlobalSignalChiSquared — the ready global-signal term.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSignalChiSquared {
    options: GlobalSignalOptions,
    points: Vec<ComparisonPoint>,
}

impl GlobalSignalChiSquared {
    pub const NAME: &'static str = "GlobalSignal";

    /// Build the term from in-memory data.
    ///
    /// `mock` holds `(redshift, T_b)` rows; `errors`, required unless
    /// `options.fixed_error`, holds `(redshift, σ)` rows.
    pub fn from_data(
        options: GlobalSignalOptions, mock: &ObservationalDataset,
        errors: Option<&ObservationalDataset>,
    ) -> LikelihoodResult<Self> {
        options.validate()?;
        let mock_freq: Vec<f64> = mock.x().iter().map(|&z| frequency_mhz(z)).collect();
        let mock_spline = Spline::cubic(&mock_freq, mock.y())?;

        let points = if options.fixed_error {
            let bandwidth = options.fixed_global_bandwidth;
            let n_bins =
                ((options.frequency_max - options.frequency_min) / bandwidth).floor() as usize + 1;
            (0..n_bins)
                .map(|j| {
                    let frequency = options.frequency_min + bandwidth * j as f64;
                    ComparisonPoint {
                        frequency,
                        mock: mock_spline.eval(frequency),
                        sigma: options.fixed_global_error,
                    }
                })
                .collect()
        } else {
            let errors = errors.ok_or(LikelihoodError::MissingField {
                term: Self::NAME,
                field: "noise data",
            })?;
            errors
                .x()
                .iter()
                .zip(errors.y())
                .map(|(&z, &sigma)| (frequency_mhz(z), sigma))
                .filter(|(f, _)| (options.frequency_min..=options.frequency_max).contains(f))
                .map(|(frequency, sigma)| ComparisonPoint {
                    frequency,
                    mock: mock_spline.eval(frequency),
                    sigma,
                })
                .collect()
        };

        Ok(Self { options, points })
    }

    pub fn options(&self) -> &GlobalSignalOptions {
        &self.options
    }

    /// Frequencies (MHz) at which mock and model are compared.
    pub fn comparison_frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }
}

impl LikelihoodTerm for GlobalSignalChiSquared {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute_likelihood(&self, output: &SimulationOutput) -> LikelihoodResult<f64> {
        let model_freq: Vec<f64> = output.redshifts().iter().map(|&z| frequency_mhz(z)).collect();
        let model = Spline::cubic(&model_freq, output.average_tb())?;

        let chi2: f64 = self
            .points
            .iter()
            .map(|p| {
                let r = (p.mock - model.eval(p.frequency)) / p.sigma;
                r * r
            })
            .sum();
        trace!("{}: chi2 = {chi2:.4} over {} frequencies", Self::NAME, self.points.len());
        Ok(-0.5 * chi2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::write_columns;
    use crate::simulation::CosmoParams;
    use approx::assert_abs_diff_eq;

    /// Brightness temperature linear in frequency, so cubic fits are exact.
    fn tb_of(z: f64) -> f64 {
        -100.0 + 0.5 * frequency_mhz(z)
    }

    fn write_mock(dir: &std::path::Path, options: &GlobalSignalOptions) {
        let z: Vec<f64> = (0..29).map(|i| 6.0 + 0.5 * i as f64).collect();
        let unused = vec![0.0; z.len()];
        let tb: Vec<f64> = z.iter().map(|&v| tb_of(v)).collect();
        write_columns(&options.obs_path(), &[&z, &unused, &tb]).unwrap();

        let noise_z = [5.0, 6.0, 10.0, 30.0, 40.0];
        let sigma = [2.0, 2.0, 5.0, 2.0, 2.0];
        write_columns(&options.error_path(), &[&noise_z, &sigma]).unwrap();
        assert!(dir.join("MockData").exists());
    }

    fn model_output(offset: f64) -> SimulationOutput {
        let z = vec![6.0, 7.0, 8.0, 10.0, 12.0, 15.0, 20.0];
        let tb = z.iter().map(|&v| tb_of(v) + offset).collect();
        let nf = vec![0.5; z.len()];
        SimulationOutput::new(z, nf, tb, 100.0, CosmoParams::default()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // z = 7 maps to ≈ 177.4 MHz.
    fn frequency_conversion_at_z7() {
        let nu = frequency_mhz(7.0);

        assert_abs_diff_eq!(nu, 2.99792e8 / (0.2112 * 8.0) / 1e6, epsilon = 1e-12);
        assert!((nu - 177.5).abs() < 0.1, "nu = {nu}");
    }

    #[test]
    // Purpose
    // -------
    // Fixed-error mode compares on ⌊(200 - 40) / 4⌋ + 1 = 41 frequencies;
    // a constant 10 mK offset with a 10 mK error contributes 1 per bin.
    fn fixed_error_mode_sums_over_even_grid() {
        let dir = tempfile::tempdir().unwrap();
        let options = GlobalSignalOptions {
            fixed_error: true,
            ..GlobalSignalOptions::new("Toy", dir.path().to_path_buf())
        };
        write_mock(dir.path(), &options);

        let term = options.setup().unwrap();
        let freqs = term.comparison_frequencies();

        assert_eq!(freqs.len(), 41);
        assert_abs_diff_eq!(freqs[40], 200.0, epsilon = 1e-12);
        assert_abs_diff_eq!(term.compute_likelihood(&model_output(0.0)).unwrap(), 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(
            term.compute_likelihood(&model_output(10.0)).unwrap(),
            -20.5,
            epsilon = 1e-6
        );
    }

    #[test]
    // Purpose
    // -------
    // File-error mode uses only noise rows whose frequency falls inside
    // [40, 200] MHz, each with its own error.
    //
    // Given
    // -----
    // - Noise redshifts [5, 6, 10, 30, 40] ↦ [236.6, 202.8, 129.0, 45.8,
    //   34.6] MHz with errors [2, 2, 5, 2, 2].
    // - Model offset by 10 mK.
    //
    // Expect
    // ------
    // - Two rows survive: (10/5)² + (10/2)² = 29 → -14.5.
    fn file_error_mode_filters_noise_rows() {
        let dir = tempfile::tempdir().unwrap();
        let options = GlobalSignalOptions::new("Toy", dir.path().to_path_buf());
        write_mock(dir.path(), &options);

        let term = options.setup().unwrap();

        assert_eq!(term.comparison_frequencies().len(), 2);
        assert_abs_diff_eq!(
            term.compute_likelihood(&model_output(10.0)).unwrap(),
            -14.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn default_paths_follow_model_name() {
        let options = GlobalSignalOptions::new("FaintGalaxies", PathBuf::from("/data"));

        assert_eq!(
            options.obs_path(),
            PathBuf::from("/data/MockData/FaintGalaxies/GlobalSignal/FaintGalaxies_GlobalSignal.txt")
        );
        assert_eq!(
            options.error_path(),
            PathBuf::from(
                "/data/NoiseData/FaintGalaxies/GlobalSignal/TotalError_FaintGalaxies_GlobalSignal_ConstantError_1000hr.txt"
            )
        );
    }

    #[test]
    fn missing_mock_file_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let options = GlobalSignalOptions::new("Toy", dir.path().to_path_buf());

        assert!(matches!(options.setup(), Err(LikelihoodError::MissingFile { .. })));
    }

    #[test]
    fn invalid_window_is_rejected() {
        let options = GlobalSignalOptions {
            frequency_min: 200.0,
            frequency_max: 40.0,
            ..GlobalSignalOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
