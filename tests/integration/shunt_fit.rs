//! End-to-end fits of the linear shunt resonator.

use crate::test_helpers::{complex_noise, gain, rel_eq, sweep, truth};
use approx::assert_relative_eq;
use resonator::fitter::{FitOptions, ParameterOverride};
use resonator::model::{ASYMMETRY, COUPLING_LOSS, INTERNAL_LOSS, RESONANCE_FREQUENCY};
use resonator::models::background::{BACKGROUND_MAGNITUDE, BACKGROUND_PHASE};
use resonator::{shunt, ComplexConstant, ResonatorFitter, Shunt};

#[test]
fn test_noiseless_fit_recovers_truth() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt(&frequency, &truth).unwrap() * gain();

    let fitter = ResonatorFitter::shunt(frequency, data, None).unwrap();

    assert!(rel_eq(fitter.resonance_frequency().unwrap(), 5e9, 1e-8));
    assert!(rel_eq(fitter.internal_loss().unwrap(), 2e-5, 1e-4));
    assert!(rel_eq(fitter.coupling_loss().unwrap(), 5e-5, 1e-4));
    assert!((fitter.asymmetry().unwrap() - 0.1).abs() < 1e-4);
    assert!(rel_eq(fitter.value(BACKGROUND_MAGNITUDE).unwrap(), 0.7, 1e-4));
    assert!((fitter.value(BACKGROUND_PHASE).unwrap() - 0.5).abs() < 1e-4);

    assert_relative_eq!(
        fitter.total_quality_factor().unwrap(),
        1.0 / 7e-5,
        max_relative = 1e-4
    );
    assert!(fitter.result().chisqr < 1e-12);
}

#[test]
fn test_noisy_fit_is_within_its_error_bars() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let sigma = 0.005;
    let data =
        shunt(&frequency, &truth).unwrap() * gain() + complex_noise(frequency.len(), sigma, 42);

    let fitter = ResonatorFitter::shunt(frequency, data, None).unwrap();
    let result = fitter.result();

    // unit weights, so the reduced chi-square estimates the noise variance
    assert!(rel_eq(result.redchi, sigma * sigma, 0.2));
    assert!(result.covariance.is_some());

    for (name, expected) in [
        (RESONANCE_FREQUENCY, 5e9),
        (INTERNAL_LOSS, 2e-5),
        (COUPLING_LOSS, 5e-5),
        (ASYMMETRY, 0.1),
    ] {
        let value = fitter.value(name).unwrap();
        let stderr = fitter.stderr(name).unwrap();
        assert!(stderr.is_finite() && stderr > 0.0, "{} stderr {}", name, stderr);
        assert!(
            (value - expected).abs() < 5.0 * stderr,
            "{} = {} +/- {}, expected {}",
            name,
            value,
            stderr,
            expected
        );
    }
}

#[test]
fn test_errors_weight_the_residuals() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let sigma = 0.005;
    let data =
        shunt(&frequency, &truth).unwrap() * gain() + complex_noise(frequency.len(), sigma, 7);
    let errors = frequency.mapv(|_| num_complex::Complex64::new(sigma, sigma));

    let fitter = ResonatorFitter::shunt(frequency, data, Some(errors)).unwrap();

    // with the true errors the reduced chi-square is close to one
    let redchi = fitter.result().redchi;
    assert!(redchi > 0.8 && redchi < 1.2, "redchi {}", redchi);
}

#[test]
fn test_fixed_asymmetry_override() {
    let truth = truth();
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt(&frequency, &truth).unwrap() * gain();

    let options = FitOptions::new()
        .fix(ASYMMETRY, 0.1)
        .with_override(INTERNAL_LOSS, ParameterOverride::bounds(1e-6, 1e-3));
    let fitter = ResonatorFitter::fit(
        frequency,
        data,
        Shunt,
        Box::new(ComplexConstant),
        None,
        &options,
    )
    .unwrap();

    assert_eq!(fitter.asymmetry().unwrap(), 0.1);
    assert!(fitter.stderr(ASYMMETRY).is_none());
    assert_eq!(fitter.result().nvarys, 5);
    assert!(rel_eq(fitter.internal_loss().unwrap(), 2e-5, 1e-4));
    let li = fitter.parameters().get(INTERNAL_LOSS).unwrap();
    assert_eq!((li.min(), li.max()), (1e-6, 1e-3));
}
