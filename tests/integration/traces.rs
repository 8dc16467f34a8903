//! Plot-ready traces built from a real fit.

use crate::test_helpers::{gain, sweep, truth};
use resonator::traces::{
    magnitude_vs_frequency, phase_vs_frequency, real_and_imaginary, MagnitudeScale, PhaseUnit,
    TraceOptions,
};
use resonator::{shunt, ResonatorFitter};

fn fitter() -> ResonatorFitter<resonator::Shunt> {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt(&frequency, &truth).unwrap() * gain();
    ResonatorFitter::shunt(frequency, data, None).unwrap()
}

#[test]
fn test_normalized_traces_of_a_fit() {
    let fitter = fitter();
    let bundle = fitter.measurement_model_resonance(true, 2001).unwrap();
    assert!(bundle.normalized);
    assert_eq!(bundle.model_frequency.len(), 2001);

    let options = TraceOptions {
        frequency_scale: 1e-9,
        ..TraceOptions::default()
    };
    let magnitude = magnitude_vs_frequency(&bundle, MagnitudeScale::Decibels, &options);
    assert_eq!(magnitude.measurement.x.len(), 1001);
    assert_eq!(magnitude.model.y.len(), 2001);
    assert_eq!(magnitude.x_label.as_deref(), Some("frequency / GHz"));

    // the dip at resonance: |1 - (1 + 0.1i) / 1.4| in dB
    let depth = 20.0 * (1.0 - num_complex::Complex64::new(1.0, 0.1) / 1.4).norm().log10();
    assert!((magnitude.resonance.y[0] - depth).abs() < 1e-4);
    // asymmetry moves the deepest point of the measurement off resonance
    let deepest = magnitude
        .measurement
        .y
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    assert!(deepest <= magnitude.resonance.y[0]);

    let ticks = magnitude.x_ticks.unwrap();
    assert!(ticks[0] < ticks[1] && ticks[1] < ticks[2]);
    assert!((ticks[1] - 5.0).abs() < 1e-6);

    let phase = phase_vs_frequency(&bundle, PhaseUnit::Radians, &options);
    assert!(phase.model.y.iter().all(|p| p.abs() <= std::f64::consts::PI));
}

#[test]
fn test_real_and_imaginary_of_raw_bundle() {
    let fitter = fitter();
    let bundle = fitter.measurement_model_resonance(false, 101).unwrap();
    assert!(!bundle.normalized);

    let traces = real_and_imaginary(&bundle, false);
    assert_eq!(traces.model.x.len(), 101);
    assert!(traces.x_label.is_none());

    // both curves start at the first measured frequency, where they agree
    assert_eq!(bundle.model_frequency[0], bundle.measurement_frequency[0]);
    assert!((traces.model.x[0] - traces.measurement.x[0]).abs() < 1e-6);
    assert!((traces.model.y[0] - traces.measurement.y[0]).abs() < 1e-6);
    assert_eq!(traces.measurement.x[0], fitter.data()[0].re);
}
