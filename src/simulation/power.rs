//! simulation::power — spherically averaged power spectra of 3-D fields.
//!
//! Purpose
//! -------
//! Estimate the 1-D power spectrum `P(|k|)` of a brightness-temperature box
//! (a co-eval snapshot or a masked lightcone chunk) and hand the likelihood
//! terms bin-centred `(k, P)` pairs.
//!
//! Key behaviors
//! -------------
//! - [`PowerSpectrumEstimator`] is the trait seam; estimators return raw bin
//!   *edges* ([`RawPower`]).
//! - [`PowerSpectrum::from_edges`] re-centres `n + 1` edges to `n` bin
//!   midpoints: geometric (`exp((ln k_i + ln k_{i+1}) / 2)`) for logarithmic
//!   bins, arithmetic otherwise.
//! - [`FftPowerEstimator`] (feature `fft`) is the reference estimator built on
//!   `rustfft`.
//!
//! Conventions
//! -----------
//! - Fourier convention: `f̃(k) = (V/N) Σ f(x) e^{-i k·x}`,
//!   `P(k) = |f̃(k)|² / V`, with `k = 2π · fftfreq(n, L/n)` per axis.
//! - Linear bins span `[min |k|, max |k|]` (the zero mode included); log bins
//!   span `[min |k| > 0, max |k|]`. The right-most edge is inclusive.
//! - Empty bins report `NaN` power.
//! - The optional variance is the variance of the bin mean: the spread of
//!   the per-mode powers in the bin divided by the number of modes.
use ndarray::ArrayView3;

use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};

/// Raw estimator output: per-bin power and the `bins + 1` bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPower {
    pub power: Vec<f64>,
    pub k_edges: Vec<f64>,
    pub variance: Option<Vec<f64>>,
}

/// Bin-centred power spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    pub k: Vec<f64>,
    pub power: Vec<f64>,
    pub variance: Option<Vec<f64>>,
}

impl PowerSpectrum {
    /// Replace bin edges by bin midpoints (geometric when `log_bins`).
    pub fn from_edges(raw: RawPower, log_bins: bool) -> Self {
        let k = raw
            .k_edges
            .windows(2)
            .map(|w| if log_bins { ((w[0].ln() + w[1].ln()) / 2.0).exp() } else { (w[0] + w[1]) / 2.0 })
            .collect();
        Self { k, power: raw.power, variance: raw.variance }
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }
}

/// Anything that can bin the power of a 3-D field.
pub trait PowerSpectrumEstimator: Send + Sync + std::fmt::Debug {
    /// Estimate the spherically averaged power of `field`.
    ///
    /// Parameters
    /// ----------
    /// - `field`: real 3-D field, axes `(x, y, line of sight)`.
    /// - `lengths`: physical side lengths in Mpc, one per axis.
    /// - `bins`: number of bins; `None` uses [`default_bin_count`].
    /// - `log_bins`: logarithmically spaced bins when `true`.
    /// - `want_variance`: also report the per-bin variance.
    fn estimate_power(
        &self, field: ArrayView3<'_, f64>, lengths: [f64; 3], bins: Option<usize>,
        log_bins: bool, want_variance: bool,
    ) -> LikelihoodResult<RawPower>;
}

/// Default bin count: `⌊(nx·ny·nz)^{1/3} / 2.2⌋`, at least one.
pub fn default_bin_count(shape: [usize; 3]) -> usize {
    let cells = (shape[0] * shape[1] * shape[2]) as f64;
    ((cells.cbrt() / 2.2).floor() as usize).max(1)
}

/// Check side lengths and bin count before estimating.
pub(crate) fn validate_geometry(
    shape: [usize; 3], lengths: [f64; 3], bins: usize,
) -> LikelihoodResult<()> {
    if shape.iter().any(|&n| n == 0) {
        return Err(LikelihoodError::InvalidOption {
            name: "field shape",
            value: 0.0,
            reason: "every axis must hold at least one cell",
        });
    }
    if let Some(&bad) = lengths.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
        return Err(LikelihoodError::InvalidOption {
            name: "box length",
            value: bad,
            reason: "side lengths must be finite and > 0",
        });
    }
    if bins == 0 {
        return Err(LikelihoodError::InvalidOption {
            name: "n_psbins",
            value: 0.0,
            reason: "at least one bin is required",
        });
    }
    Ok(())
}

/// Signed FFT frequency index of position `i` in an axis of `n` cells.
pub(crate) fn fft_index(i: usize, n: usize) -> f64 {
    if i <= (n - 1) / 2 { i as f64 } else { i as f64 - n as f64 }
}

/// Bin `values` by `|k|` into `bins` bins; returns `(edges, mean, variance)`.
pub(crate) fn bin_by_magnitude(
    kmag: &[f64], values: &[f64], bins: usize, log_bins: bool, want_variance: bool,
) -> LikelihoodResult<RawPower> {
    let k_max = kmag.iter().copied().fold(0.0_f64, f64::max);
    let k_min = if log_bins {
        kmag.iter().copied().filter(|k| *k > 0.0).fold(f64::INFINITY, f64::min)
    } else {
        kmag.iter().copied().fold(f64::INFINITY, f64::min)
    };
    if !(k_min.is_finite() && k_max > k_min) {
        return Err(LikelihoodError::InvalidOption {
            name: "field shape",
            value: kmag.len() as f64,
            reason: "need at least two distinct |k| values to form bins",
        });
    }

    let k_edges: Vec<f64> = if log_bins {
        crate::interpolation::linspace(k_min.ln(), k_max.ln(), bins + 1)
            .into_iter()
            .map(f64::exp)
            .collect()
    } else {
        crate::interpolation::linspace(k_min, k_max, bins + 1)
    };
    let lo = k_edges[0];
    let hi = k_edges[bins];

    let mut sum = vec![0.0; bins];
    let mut sum_sq = vec![0.0; bins];
    let mut count = vec![0usize; bins];
    for (&k, &v) in kmag.iter().zip(values) {
        // Log-spaced edges are rebuilt through exp(ln(·)); compare the end
        // points with a relative tolerance so the extreme modes are kept.
        if k < lo * (1.0 - 1e-12) || k > hi * (1.0 + 1e-12) {
            continue;
        }
        let idx = k_edges.partition_point(|&e| e <= k).saturating_sub(1).min(bins - 1);
        sum[idx] += v;
        sum_sq[idx] += v * v;
        count[idx] += 1;
    }

    let power: Vec<f64> =
        sum.iter().zip(&count).map(|(s, &c)| if c == 0 { f64::NAN } else { s / c as f64 }).collect();
    let variance = want_variance.then(|| {
        (0..bins)
            .map(|i| {
                if count[i] == 0 {
                    return f64::NAN;
                }
                let n = count[i] as f64;
                let mean = power[i];
                ((sum_sq[i] / n - mean * mean).max(0.0)) / n
            })
            .collect()
    });

    Ok(RawPower { power, k_edges, variance })
}

#[cfg(feature = "fft")]
pub use self::fft::FftPowerEstimator;

#[cfg(feature = "fft")]
mod fft {
    use ndarray::{Array3, ArrayView3, Axis};
    use num_complex::Complex64;
    use rustfft::FftPlanner;
    use std::f64::consts::PI;

    use super::{RawPower, PowerSpectrumEstimator, bin_by_magnitude, default_bin_count, fft_index, validate_geometry};
    use crate::likelihood::errors::LikelihoodResult;

    /// FftPowerEstimator — reference estimator using a full complex 3-D FFT.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FftPowerEstimator;

    impl PowerSpectrumEstimator for FftPowerEstimator {
        fn estimate_power(
            &self, field: ArrayView3<'_, f64>, lengths: [f64; 3], bins: Option<usize>,
            log_bins: bool, want_variance: bool,
        ) -> LikelihoodResult<RawPower> {
            let (nx, ny, nz) = field.dim();
            let shape = [nx, ny, nz];
            let bins = bins.unwrap_or_else(|| default_bin_count(shape));
            validate_geometry(shape, lengths, bins)?;

            let mut spectrum: Array3<Complex64> = field.mapv(|v| Complex64::new(v, 0.0));
            let mut planner = FftPlanner::<f64>::new();
            for axis in 0..3 {
                let n = shape[axis];
                let fft = planner.plan_fft_forward(n);
                let mut buffer = vec![Complex64::new(0.0, 0.0); n];
                for mut lane in spectrum.lanes_mut(Axis(axis)) {
                    for (b, v) in buffer.iter_mut().zip(lane.iter()) {
                        *b = *v;
                    }
                    fft.process(&mut buffer);
                    for (v, b) in lane.iter_mut().zip(buffer.iter()) {
                        *v = *b;
                    }
                }
            }

            let volume = lengths[0] * lengths[1] * lengths[2];
            let cell_volume = volume / (nx * ny * nz) as f64;
            let dk = [2.0 * PI / lengths[0], 2.0 * PI / lengths[1], 2.0 * PI / lengths[2]];

            let mut kmag = Vec::with_capacity(spectrum.len());
            let mut power = Vec::with_capacity(spectrum.len());
            for ((i, j, l), value) in spectrum.indexed_iter() {
                let kx = dk[0] * fft_index(i, nx);
                let ky = dk[1] * fft_index(j, ny);
                let kz = dk[2] * fft_index(l, nz);
                kmag.push((kx * kx + ky * ky + kz * kz).sqrt());
                power.push(cell_volume * cell_volume * value.norm_sqr() / volume);
            }

            bin_by_magnitude(&kmag, &power, bins, log_bins, want_variance)
        }
    }

}
