//! Fits with backgrounds other than a complex constant.

use crate::test_helpers::{gain, rel_eq, sweep, truth};
use num_complex::Complex64;
use resonator::fitter::FitOptions;
use resonator::models::background::{
    BACKGROUND_DELAY, BACKGROUND_MAGNITUDE, BACKGROUND_REFERENCE_FREQUENCY,
};
use resonator::{shunt, MagnitudePhaseDelay, One, ResonatorFitter, Shunt};
use std::f64::consts::PI;

#[test]
fn test_cable_delay_is_recovered() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let delay = 50e-9;
    // the phase reference of the generated data sits below the sweep
    let reference = frequency[0] - 1e6;
    let cable = frequency.mapv(|f| gain() * Complex64::from_polar(1.0, -2.0 * PI * (f - reference) * delay));
    let data = shunt(&frequency, &truth).unwrap() * cable;
    let start = frequency[0];

    let fitter = ResonatorFitter::fit(
        frequency,
        data,
        Shunt,
        Box::new(MagnitudePhaseDelay),
        None,
        &FitOptions::default(),
    )
    .unwrap();

    assert!(rel_eq(fitter.value(BACKGROUND_DELAY).unwrap(), delay, 1e-4));
    assert!(rel_eq(fitter.value(BACKGROUND_MAGNITUDE).unwrap(), 0.7, 1e-4));
    assert!(rel_eq(fitter.resonance_frequency().unwrap(), 5e9, 1e-8));
    assert!(rel_eq(fitter.internal_loss().unwrap(), 2e-5, 1e-4));
    assert!(rel_eq(fitter.coupling_loss().unwrap(), 5e-5, 1e-4));

    // the reference frequency is held at the start of the sweep
    let held = fitter
        .parameters()
        .get(BACKGROUND_REFERENCE_FREQUENCY)
        .unwrap();
    assert!(!held.vary());
    assert_eq!(held.value(), start);
    assert_eq!(fitter.result().nvarys, 7);
    assert_eq!(fitter.background().name(), "magnitude_phase_delay");
}

#[test]
fn test_unit_background_fits_the_resonator_alone() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt(&frequency, &truth).unwrap();

    let fitter = ResonatorFitter::fit(
        frequency.clone(),
        data,
        Shunt,
        Box::new(One),
        None,
        &FitOptions::default(),
    )
    .unwrap();

    assert_eq!(
        fitter.parameters().names(),
        vec!["resonance_frequency", "internal_loss", "coupling_loss", "asymmetry"]
    );
    assert!(rel_eq(fitter.internal_loss().unwrap(), 2e-5, 1e-4));

    // the background model is identically one, so model and foreground agree
    let model = fitter.model(&frequency).unwrap();
    let foreground = fitter.foreground_model(&frequency).unwrap();
    for (m, f) in model.iter().zip(foreground.iter()) {
        assert!((m - f).norm() < 1e-15);
    }
}
