//! Plot-ready series from a [`MeasurementModelResonance`] bundle.
//!
//! Nothing is drawn here. Each function returns the measurement, the model
//! curve and the resonance point as `(x, y)` series together with axis
//! labels and tick positions, for whatever plotting backend the caller uses.

use crate::fitter::MeasurementModelResonance;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// How magnitudes are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagnitudeScale {
    /// `20 log10 |z|`
    #[default]
    Decibels,
    /// `|z|`
    Linear,
}

/// How phases are expressed. Phases are wrapped to `(-pi, pi]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseUnit {
    #[default]
    Degrees,
    Radians,
}

/// Options shared by the frequency-axis traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Factor applied to every frequency, e.g. `1e-9` to plot in GHz
    pub frequency_scale: f64,
    /// Ticks at the minimum, resonance, and maximum frequency only
    pub three_ticks: bool,
    pub label_axes: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            frequency_scale: 1.0,
            three_ticks: true,
            label_axes: true,
        }
    }
}

/// One set of points to draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Everything needed to draw one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traces {
    pub measurement: Series,
    pub model: Series,
    /// A single point at the fitted resonance frequency
    pub resonance: Series,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_ticks: Option<Vec<f64>>,
}

/// Unit name for a frequency scale factor, if it is a power of a thousand
/// from Hz to THz.
pub fn frequency_unit(frequency_scale: f64) -> Option<&'static str> {
    [
        (1.0, "Hz"),
        (1e-3, "kHz"),
        (1e-6, "MHz"),
        (1e-9, "GHz"),
        (1e-12, "THz"),
    ]
    .iter()
    .find(|(scale, _)| *scale == frequency_scale)
    .map(|(_, unit)| *unit)
}

/// `frequency / <unit>`, or plain `frequency` for an unnamed scale.
pub fn frequency_label(frequency_scale: f64) -> String {
    match frequency_unit(frequency_scale) {
        Some(unit) => format!("frequency / {}", unit),
        None => "frequency".to_string(),
    }
}

/// Scaled minimum, resonance, and maximum frequency of the bundle.
pub fn three_ticks(bundle: &MeasurementModelResonance, frequency_scale: f64) -> Vec<f64> {
    let (min, max) = bundle
        .measurement_frequency
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| {
            (lo.min(f), hi.max(f))
        });
    vec![
        frequency_scale * min,
        frequency_scale * bundle.resonance_frequency,
        frequency_scale * max,
    ]
}

fn frequency_traces<T>(
    bundle: &MeasurementModelResonance,
    options: &TraceOptions,
    y_label: &str,
    transform: T,
) -> Traces
where
    T: Fn(Complex64) -> f64,
{
    let scaled = |f: &Array1<f64>| -> Vec<f64> {
        f.iter().map(|&f| options.frequency_scale * f).collect()
    };
    let values = |z: &Array1<Complex64>| -> Vec<f64> { z.iter().map(|&z| transform(z)).collect() };

    Traces {
        measurement: Series {
            x: scaled(&bundle.measurement_frequency),
            y: values(&bundle.measurement_data),
        },
        model: Series {
            x: scaled(&bundle.model_frequency),
            y: values(&bundle.model_data),
        },
        resonance: Series {
            x: vec![options.frequency_scale * bundle.resonance_frequency],
            y: vec![transform(bundle.resonance_data)],
        },
        x_label: options
            .label_axes
            .then(|| frequency_label(options.frequency_scale)),
        y_label: options.label_axes.then(|| y_label.to_string()),
        x_ticks: options
            .three_ticks
            .then(|| three_ticks(bundle, options.frequency_scale)),
    }
}

/// Magnitude against frequency.
pub fn magnitude_vs_frequency(
    bundle: &MeasurementModelResonance,
    scale: MagnitudeScale,
    options: &TraceOptions,
) -> Traces {
    match scale {
        MagnitudeScale::Decibels => frequency_traces(bundle, options, "magnitude / dB", |z| {
            20.0 * z.norm().log10()
        }),
        MagnitudeScale::Linear => frequency_traces(bundle, options, "magnitude", |z| z.norm()),
    }
}

/// Phase against frequency.
pub fn phase_vs_frequency(
    bundle: &MeasurementModelResonance,
    unit: PhaseUnit,
    options: &TraceOptions,
) -> Traces {
    match unit {
        PhaseUnit::Degrees => {
            frequency_traces(bundle, options, "phase / deg", |z| z.arg().to_degrees())
        }
        PhaseUnit::Radians => frequency_traces(bundle, options, "phase / rad", |z| z.arg()),
    }
}

/// Imaginary against real part; a normalized resonance traces a circle.
pub fn real_and_imaginary(bundle: &MeasurementModelResonance, label_axes: bool) -> Traces {
    let split = |z: &Array1<Complex64>| Series {
        x: z.iter().map(|z| z.re).collect(),
        y: z.iter().map(|z| z.im).collect(),
    };

    Traces {
        measurement: split(&bundle.measurement_data),
        model: split(&bundle.model_data),
        resonance: Series {
            x: vec![bundle.resonance_data.re],
            y: vec![bundle.resonance_data.im],
        },
        x_label: label_axes.then(|| "real".to_string()),
        y_label: label_axes.then(|| "imag".to_string()),
        x_ticks: None,
    }
}
