//! Starting values for resonator fits estimated from the magnitude of the data.

use crate::error::{check_lengths, ResonatorError, Result};
use ndarray::{s, Array1};
use num_complex::Complex64;

/// Fewest points [`guess_smooth`] accepts.
///
/// The smoothing kernel spans a tenth of the sweep and needs at least three
/// points, and the edges it corrupts must leave an interior to search.
pub const MIN_GUESS_POINTS: usize = 30;

/// Gaussian `exp(-t^2)` sampled at `width` points over `[-4, 4]`, normalized
/// to unit sum.
fn gaussian_kernel(width: usize) -> Array1<f64> {
    let kernel = Array1::linspace(-4.0, 4.0, width).mapv(|t: f64| (-t * t).exp());
    let total = kernel.sum();
    kernel / total
}

/// Discrete convolution with zero padding, cropped to the length of the
/// longer input and centered on the full result.
fn convolve_same(a: &Array1<f64>, v: &Array1<f64>) -> Array1<f64> {
    let (m, n) = (a.len(), v.len());
    if m == 0 || n == 0 {
        return Array1::zeros(m.max(n));
    }

    let mut full = Array1::zeros(m + n - 1);
    for (i, &ai) in a.iter().enumerate() {
        for (j, &vj) in v.iter().enumerate() {
            full[i + j] += ai * vj;
        }
    }

    let start = (m.min(n) - 1) / 2;
    full.slice(s![start..start + m.max(n)]).to_owned()
}

/// Index of the smallest value; the first one on ties.
fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, min), (i, &v)| {
            if v < min {
                (i, v)
            } else {
                (best, min)
            }
        })
        .0
}

/// Index of the largest value; the first one on ties.
fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

/// Estimate `(resonance_frequency, coupling_loss, internal_loss)` of a shunt
/// resonator from background-normalized data.
///
/// The resonance frequency is the frequency of the deepest point. The
/// magnitude is smoothed with a Gaussian a tenth of the sweep wide and the
/// total loss is taken from the separation of the steepest falling and
/// rising slopes, away from the edges the smoothing corrupts. The depth of
/// the dip sets the ratio of internal to coupling loss.
///
/// The separation of the slopes is narrower than the full linewidth, so the
/// total loss comes out low; the estimate is a seed for the fit, not a
/// measurement.
pub fn guess_smooth(frequency: &Array1<f64>, data: &Array1<Complex64>) -> Result<(f64, f64, f64)> {
    check_lengths("data", frequency.len(), data.len())?;
    let n = frequency.len();
    if n < MIN_GUESS_POINTS {
        return Err(ResonatorError::InvalidInput(format!(
            "at least {} points are needed to guess resonator parameters, got {}",
            MIN_GUESS_POINTS, n
        )));
    }

    let magnitude = data.mapv(|z| z.norm());
    if magnitude.iter().any(|m| !m.is_finite()) {
        return Err(ResonatorError::InvalidInput(
            "data must be finite to guess resonator parameters".to_string(),
        ));
    }

    let deepest = argmin(&magnitude.to_vec());
    let resonance_frequency = frequency[deepest];
    let minimum = magnitude[deepest];

    let width = n / 10;
    let smoothed = convolve_same(&gaussian_kernel(width), &magnitude);

    let mut derivative = smoothed.clone();
    for k in 1..n {
        derivative[k] = smoothed[k] - smoothed[k - 1];
    }

    let interior = derivative.slice(s![width..n - width]).to_vec();
    let rising = argmax(&interior) + width;
    let falling = argmin(&interior) + width;
    let linewidth = frequency[rising] - frequency[falling];

    let internal_plus_coupling = linewidth / resonance_frequency;
    let internal_over_coupling = 1.0 / (1.0 / minimum - 1.0);
    let coupling_loss = internal_plus_coupling / (1.0 + internal_over_coupling);
    let internal_loss =
        internal_plus_coupling * internal_over_coupling / (1.0 + internal_over_coupling);

    Ok((resonance_frequency, coupling_loss, internal_loss))
}
