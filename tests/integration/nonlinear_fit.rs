//! Fits of the Kerr-nonlinear shunt resonator.

use crate::test_helpers::{gain, rel_eq, sweep, truth};
use ndarray::{Array1, ArrayView2, Axis};
use resonator::fitter::DEFAULT_NUM_MODEL_POINTS;
use resonator::nonlinear::{kerr_detuning_at_bifurcation, kerr_detuning_roots};
use resonator::{shunt, shunt_nonlinear, Choose, ResonatorError, ResonatorFitter};

/// The middle candidate where there are three, else the only one
fn median_root(candidates: ArrayView2<f64>, axis: Axis) -> Array1<f64> {
    candidates.map_axis(axis, |roots| {
        let mut sorted = roots.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[sorted.len() / 2]
    })
}

#[test]
fn test_driven_fit_recovers_kxin() {
    let linear = truth();
    let threshold = kerr_detuning_at_bifurcation(linear.coupling_loss, linear.internal_loss);
    let truth = linear.with_kxin(0.5 * threshold);
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt_nonlinear(&frequency, &truth, &Choose::Min).unwrap() * gain();

    let fitter = ResonatorFitter::shunt_nonlinear(frequency, data, None, Choose::Min).unwrap();

    assert!(rel_eq(fitter.resonance_frequency().unwrap(), 5e9, 1e-8));
    assert!(rel_eq(fitter.internal_loss().unwrap(), 2e-5, 1e-4));
    assert!(rel_eq(fitter.coupling_loss().unwrap(), 5e-5, 1e-4));
    assert!((fitter.asymmetry().unwrap() - 0.1).abs() < 1e-4);
    assert!(rel_eq(fitter.kxin().unwrap(), truth.kxin, 1e-3));
    assert_eq!(fitter.result().nvarys, 7);
}

#[test]
fn test_nonlinear_fit_cannot_invert() {
    let truth = truth();
    let threshold = kerr_detuning_at_bifurcation(truth.coupling_loss, truth.internal_loss);
    let frequency = sweep(&truth, 1001, 6.0);
    let data = shunt(&frequency, &truth).unwrap() * gain();

    let fitter = ResonatorFitter::shunt_nonlinear(frequency, data, None, Choose::Max).unwrap();
    // undriven data leave the drive at zero
    assert!(fitter.kxin().unwrap().abs() < 1e-3 * threshold);

    let bundle = fitter
        .measurement_model_resonance(true, DEFAULT_NUM_MODEL_POINTS)
        .unwrap();
    assert!(matches!(
        fitter.invert(&bundle.measurement_data),
        Err(ResonatorError::NotImplemented(_))
    ));
}

#[test]
fn test_branches_split_above_bifurcation() {
    let linear = truth();
    let threshold = kerr_detuning_at_bifurcation(linear.coupling_loss, linear.internal_loss);
    let truth = linear.with_kxin(3.0 * threshold);
    let frequency = sweep(&truth, 401, 8.0);

    let low = shunt_nonlinear(&frequency, &truth, &Choose::Min).unwrap();
    let high = shunt_nonlinear(&frequency, &truth, &Choose::Max).unwrap();
    let middle = shunt_nonlinear(&frequency, &truth, &median_root).unwrap();

    let detuning = truth.detuning(&frequency);
    let roots = kerr_detuning_roots(&detuning, truth.coupling_loss, truth.internal_loss, truth.kxin);

    let mut bistable = 0;
    for (i, point_roots) in roots.iter().enumerate() {
        if point_roots.len() == 3 {
            bistable += 1;
            assert!((low[i] - high[i]).norm() > 0.0);
            assert!((middle[i] - low[i]).norm() > 0.0);
            assert!((middle[i] - high[i]).norm() > 0.0);
        } else if point_roots.len() == 1 {
            assert_eq!(low[i], high[i]);
        }
    }
    assert!(bistable > 0);
}
