//! Integration tests for the likelihood pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow an MCMC driver follows: write or generate
//!   the observational data, set up every term once through
//!   `LikelihoodSet`, then evaluate simulator outputs repeatedly.
//! - Exercise the power-spectrum terms against the built-in FFT estimator
//!   with mock files produced by `simulate_data`.
//!
//! Coverage
//! --------
//! - `data`:
//!   - `PriorTable::save` / `load` and `write_columns` as mock-data writers.
//! - `likelihood::set`:
//!   - `LikelihoodSet::setup` over all six configurations and `evaluate`.
//! - `likelihood::power_lightcone` and `likelihood::power_coeval`:
//!   - `simulate_data` round trip: a model identical to the mock scores 0.
//!   - `simulate_data` with `save_output` stores a reloadable output.
//!   - A rescaled field gives the analytic chi-squared.
//! - `simulation`:
//!   - A `Simulator` implementation driving `SimulationRequest`.
//!
//! Exclusions
//! ----------
//! - Edge cases of resampling, spline fitting and file parsing; those are
//!   covered by unit tests.
//! - Python bindings.
#![cfg(feature = "fft")]

use std::path::Path;

use approx::assert_abs_diff_eq;
use eor_likelihood::{
    data::{PriorTable, write_columns},
    likelihood::{
        MockPower, frequency_mhz,
        mock_power::{FRACTIONAL_ERROR, saved_output_path},
        prelude::*,
    },
    simulation::{SimulationRequest, Simulator},
};
use ndarray::Array3;

const CELLS: usize = 16;
const BOX_LEN: f64 = 100.0;
const COEVAL_Z: f64 = 8.0;

/// Redshifts the evaluated outputs are sampled at; includes the McGreer and
/// Greig redshifts exactly.
const HISTORY_Z: [f64; 9] = [5.9, 6.5, 7.0842, 8.0, 9.0, 10.0, 12.0, 15.0, 20.0];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Linear reionization history: 0.3 at z = 7.0842, below 0.06 at z = 5.9,
/// saturating at 1.
fn neutral_fraction(z: f64) -> f64 {
    (0.3 * (z - 5.8) / (7.0842 - 5.8)).clamp(0.0, 1.0)
}

/// Brightness temperature linear in frequency, so spline fits are exact.
fn brightness(z: f64) -> f64 {
    -120.0 + 0.6 * frequency_mhz(z)
}

/// Deterministic pseudo-random value in [-1, 1) for cell (i, j, k).
fn noise(seed: u64, i: usize, j: usize, k: usize) -> f64 {
    let mut x = seed
        ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (j as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (k as u64).wrapping_mul(0x1656_67B1_9E37_79F9);
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 11) as f64 / (1u64 << 52) as f64 - 1.0
}

fn field(seed: u64, amplitude: f64) -> Array3<f64> {
    Array3::from_shape_fn((CELLS, CELLS, CELLS), |(i, j, k)| amplitude * (1.0 + noise(seed, i, j, k)))
}

/// ToySimulator — deterministic stand-in for a semi-numerical simulator.
///
/// Every run returns the same lightcone (scaled by `amplitude`) and one
/// co-eval box per requested redshift, seeded by that redshift.
struct ToySimulator {
    amplitude: f64,
}

impl Simulator for ToySimulator {
    fn run(&self, request: &SimulationRequest) -> LikelihoodResult<SimulationOutput> {
        let z = request.redshifts.clone();
        let nf = z.iter().map(|&v| neutral_fraction(v)).collect();
        let tb = z.iter().map(|&v| brightness(v)).collect();
        let boxes = z.iter().map(|&v| field(v.to_bits(), self.amplitude)).collect();
        let slices: Vec<f64> = (0..CELLS).map(|i| 7.0 + 0.02 * i as f64).collect();

        SimulationOutput::new(z, nf, tb, request.box_len, request.cosmo)?
            .with_lightcone(field(42, self.amplitude), slices)?
            .with_coeval_boxes(boxes)
    }
}

fn history_request() -> SimulationRequest {
    SimulationRequest {
        redshifts: HISTORY_Z.to_vec(),
        box_len: BOX_LEN,
        ..SimulationRequest::default()
    }
}

fn lightcone_options(dir: &Path) -> LightconePowerOptions {
    let mut options = LightconePowerOptions::new(dir.join("lightcone_ps.txt"));
    options.n_psbins = Some(5);
    options.request.box_len = BOX_LEN;
    options
}

fn coeval_options(dir: &Path) -> CoevalPowerOptions {
    let mut options = CoevalPowerOptions::new(dir.join("coeval_ps.txt"), COEVAL_Z);
    options.n_psbins = Some(5);
    options.request.box_len = BOX_LEN;
    options
}

/// Gaussian damping-wing PDF centred on 0.5 with width 0.2.
fn write_prior_table(cache_dir: &Path) {
    let x: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
    let pdf = x.iter().map(|v| (-0.5 * ((v - 0.5) / 0.2_f64).powi(2)).exp()).collect();
    PriorTable::new(x, pdf).unwrap().save(cache_dir).unwrap();
}

fn write_global_signal(options: &GlobalSignalOptions) {
    let z: Vec<f64> = (0..29).map(|i| 6.0 + 0.5 * i as f64).collect();
    let unused = vec![0.0; z.len()];
    let tb: Vec<f64> = z.iter().map(|&v| brightness(v)).collect();
    write_columns(&options.obs_path(), &[&z, &unused, &tb]).unwrap();

    let noise_z = [6.0, 8.0, 10.0, 15.0];
    let sigma = [3.0, 3.0, 3.0, 3.0];
    write_columns(&options.error_path(), &[&noise_z, &sigma]).unwrap();
}

#[test]
// Purpose
// -------
// Run the full driver flow over all six terms.
//
// Given
// -----
// - Prior table, global-signal mock and noise written to a temp directory.
// - Lightcone and co-eval mock spectra generated by `simulate_data` from
//   the same toy simulator that is later evaluated.
//
// Expect
// ------
// - McGreer: x_HI(5.9) < 0.06 → 0.
// - Greig: x_HI(7.0842) = 0.3 on a σ = 0.2 Gaussian → 1.
// - Global signal and both power terms reproduce their mocks → 0.
// - Planck: a finite non-negative penalty; the total is the sum.
fn full_pipeline_scores_matching_model() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let simulator = ToySimulator { amplitude: 1.0 };

    write_prior_table(dir.path());
    let global = GlobalSignalOptions::new("ToyModel", dir.path().to_path_buf());
    write_global_signal(&global);
    let lightcone = lightcone_options(dir.path());
    let coeval = coeval_options(dir.path());
    lightcone.simulate_data(&simulator, None, true, false).unwrap();
    coeval.simulate_data(&simulator, None, true, false).unwrap();

    let configs = [
        LikelihoodConfig::Planck(PlanckOptions::default()),
        LikelihoodConfig::McGreer(McGreerOptions::default()),
        LikelihoodConfig::Greig(GreigOptions {
            cache_dir: dir.path().to_path_buf(),
            ..GreigOptions::default()
        }),
        LikelihoodConfig::GlobalSignal(global),
        LikelihoodConfig::LightconePower(lightcone),
        LikelihoodConfig::CoevalPower(coeval),
    ];
    let set = LikelihoodSet::setup(&configs, &Services::default()).unwrap();
    let output = simulator.run(&history_request()).unwrap();

    let eval = set.evaluate(&output).unwrap();

    assert_eq!(set.len(), 6);
    assert_eq!(eval.get("McGreer"), Some(0.0));
    assert_abs_diff_eq!(eval.get("Greig").unwrap(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(eval.get("GlobalSignal").unwrap(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(eval.get("LightconePower").unwrap(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(eval.get("CoevalPower").unwrap(), 0.0, epsilon = 1e-12);
    let planck = eval.get("Planck").unwrap();
    assert!(planck.is_finite() && planck >= 0.0, "planck = {planck}");
    let sum: f64 = eval.contributions.iter().map(|(_, v)| v).sum();
    assert_abs_diff_eq!(eval.total, sum, epsilon = 1e-12);
    let model = eval.spectrum("LightconePower").unwrap();
    assert_eq!(model.len(), 5);
    assert!(model.variance.is_some());
    assert!(eval.spectrum("CoevalPower").is_some());
    assert_eq!(eval.spectrum("Greig"), None);
    assert_eq!(eval.spectra.len(), 2);
}

#[test]
// Purpose
// -------
// The mock written by `simulate_data` is exactly what `setup` reads back.
//
// Given
// -----
// - A lightcone spectrum with 5 log bins, written and then loaded with the
//   default k window [0.1, 1].
//
// Expect
// ------
// - Every file row is present; the kept rows are exactly the generated
//   bins with 0.1 ≤ k ≤ 1, bit for bit.
fn simulate_data_round_trips_through_mock_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let options = lightcone_options(dir.path());

    let spectrum = options.simulate_data(&ToySimulator { amplitude: 1.0 }, None, true, false).unwrap();
    let term = options.setup(None).unwrap();

    assert_eq!(spectrum.len(), 5);
    assert_eq!(term.mock().rows(), 5);
    let (k, p): (Vec<f64>, Vec<f64>) = spectrum
        .k
        .iter()
        .zip(&spectrum.power)
        .filter(|(k, _)| (0.1..=1.0).contains(*k))
        .map(|(k, p)| (*k, *p))
        .unzip();
    assert!(!k.is_empty());
    assert_eq!(term.mock().k(), k.as_slice());
    assert_eq!(term.mock().power(), p.as_slice());
}

#[test]
// Purpose
// -------
// Bootstrapping keeps the simulated output next to the mock file and
// reports the bin variance whatever the term's error setting.
//
// Given
// -----
// - Lightcone options with error_on_model = false; save_output on.
//
// Expect
// ------
// - The spectrum carries one variance per bin.
// - `<mock>.output.json` reloads to an output with the same lightcone.
fn simulate_data_saves_output_and_variance() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let options = LightconePowerOptions { error_on_model: false, ..lightcone_options(dir.path()) };
    let simulator = ToySimulator { amplitude: 1.0 };

    let spectrum = options.simulate_data(&simulator, None, true, true).unwrap();

    assert_eq!(spectrum.variance.as_ref().map(Vec::len), Some(spectrum.len()));
    let saved = saved_output_path(&options.datafile);
    let restored = SimulationOutput::load_json(&saved).unwrap();
    let expected = simulator.run(&options.request).unwrap();
    assert_eq!(restored.lightcone_box(), expected.lightcone_box());
    assert_eq!(restored.redshift_slices(), expected.redshift_slices());
}

#[test]
// Purpose
// -------
// A field rescaled by 1.1 has 1.21 times the power in every bin, which
// fixes the chi-squared analytically.
//
// Given
// -----
// - Mocks from amplitude 1; model from amplitude 1.1.
// - Lightcone error on the model, co-eval error on the mock.
//
// Expect
// ------
// - Lightcone: -0.5 n (0.21 / (0.15 · 1.21))².
// - Co-eval: -0.5 n (0.21 / 0.15)².
fn rescaled_field_gives_analytic_chi_squared() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let reference = ToySimulator { amplitude: 1.0 };
    let lightcone = lightcone_options(dir.path());
    let coeval = coeval_options(dir.path());
    lightcone.simulate_data(&reference, None, true, false).unwrap();
    coeval.simulate_data(&reference, None, true, false).unwrap();
    let lightcone_term = lightcone.setup(None).unwrap();
    let coeval_term = coeval.setup(None).unwrap();

    let output = ToySimulator { amplitude: 1.1 }.run(&history_request()).unwrap();

    let n_lc = lightcone_term.mock().len() as f64;
    let r_lc = 0.21 / (FRACTIONAL_ERROR * 1.21);
    assert_abs_diff_eq!(
        lightcone_term.compute_likelihood(&output).unwrap(),
        -0.5 * n_lc * r_lc * r_lc,
        epsilon = 1e-8
    );
    let n_co = coeval_term.mock().len() as f64;
    let r_co = 0.21 / FRACTIONAL_ERROR;
    assert_abs_diff_eq!(
        coeval_term.compute_likelihood(&output).unwrap(),
        -0.5 * n_co * r_co * r_co,
        epsilon = 1e-8
    );
}

#[test]
// Purpose
// -------
// Setup failures surface before any evaluation.
//
// Given
// -----
// - A mock spectrum whose rows all lie outside a narrowed k window.
// - A lightcone term whose request disables the lightcone.
//
// Expect
// ------
// - `EmptyKWindow` and `LightconeRequired` respectively.
fn setup_rejects_unusable_configuration() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut options = lightcone_options(dir.path());
    options.simulate_data(&ToySimulator { amplitude: 1.0 }, None, true, false).unwrap();

    options.min_k = 50.0;
    options.max_k = 60.0;
    let err = LikelihoodSet::setup(&[LikelihoodConfig::LightconePower(options.clone())], &Services::default())
        .unwrap_err();
    assert!(matches!(err, LikelihoodError::EmptyKWindow { term: "LightconePower", .. }));

    options.min_k = 0.1;
    options.max_k = 1.0;
    options.request.use_lightcone = false;
    let err = options.setup(None).unwrap_err();
    assert_eq!(err, LikelihoodError::LightconeRequired { term: "LightconePower" });

    let mock = MockPower::load("LightconePower", &options.datafile, 0.1, 1.0).unwrap();
    assert_eq!(mock.rows(), 5);
}
