//! Integration tests for the Parameter struct

use resonator::parameters::{Bounds, BoundsTransform, Parameter};
use std::f64::{INFINITY, NEG_INFINITY};

#[test]
fn test_parameter_lifecycle() {
    let mut param = Parameter::new("coupling_loss", 1e-4);

    assert_eq!(param.name(), "coupling_loss");
    assert_eq!(param.value(), 1e-4);
    assert!(param.vary());
    assert_eq!(param.min(), NEG_INFINITY);
    assert_eq!(param.max(), INFINITY);
    assert!(param.stderr().is_none());

    param.set_value(2e-4).unwrap();
    assert_eq!(param.value(), 2e-4);
    assert_eq!(param.init_value(), 1e-4);

    param.reset();
    assert_eq!(param.value(), 1e-4);

    param.set_bounds(1e-12, 1.0).unwrap();
    assert_eq!(param.min(), 1e-12);
    assert_eq!(param.max(), 1.0);

    // outside the bounds
    assert!(param.set_value(-1e-5).is_err());
    assert!(param.set_value(2.0).is_err());
    assert!(param.set_value(5e-5).is_ok());
    assert_eq!(param.value(), 5e-5);

    param.set_vary(false);
    assert!(!param.vary());
    param.set_vary(true);
    assert!(param.vary());

    param.set_stderr(Some(1e-7));
    assert_eq!(param.stderr(), Some(1e-7));
    param.set_stderr(None);
    assert!(param.stderr().is_none());
}

#[test]
fn test_parameter_with_bounds() {
    let param = Parameter::with_bounds("asymmetry", 0.5, -10.0, 10.0).unwrap();
    assert_eq!(param.min(), -10.0);
    assert_eq!(param.max(), 10.0);

    assert!(Parameter::with_bounds("asymmetry", 0.0, 10.0, -10.0).is_err());

    // values outside the bounds are clamped
    let param = Parameter::with_bounds("asymmetry", 30.0, -10.0, 10.0).unwrap();
    assert_eq!(param.value(), 10.0);
    let param = Parameter::with_bounds("asymmetry", -30.0, -10.0, 10.0).unwrap();
    assert_eq!(param.value(), -10.0);
}

#[test]
fn test_narrowing_bounds_clamps_value() {
    let mut param = Parameter::new("resonance_frequency", 5.2e9);
    param.set_bounds(4.9e9, 5.1e9).unwrap();
    assert_eq!(param.value(), 5.1e9);
}

#[test]
fn test_parameter_bounds_transform() {
    // unbounded: internal and external values coincide
    let param = Parameter::new("background_phase", 1.5);
    assert_eq!(param.to_internal().unwrap(), 1.5);
    assert_eq!(param.from_internal(-2.0), -2.0);

    let mut lower = Parameter::new("background_magnitude", 0.7);
    lower.set_bounds(0.0, INFINITY).unwrap();
    let internal = lower.to_internal().unwrap();
    assert_ne!(internal, 0.7);
    assert!((lower.from_internal(internal) - 0.7).abs() < 1e-12);

    let mut upper = Parameter::new("kxin", -1e-9);
    upper.set_bounds(NEG_INFINITY, 0.0).unwrap();
    let internal = upper.to_internal().unwrap();
    assert!((upper.from_internal(internal) + 1e-9).abs() < 1e-15);

    let transform = BoundsTransform::new(Bounds::new(1e-12, 1.0).unwrap());
    for &value in &[1e-12, 1e-8, 2e-5, 1e-3, 0.5, 1.0] {
        let internal = transform.to_internal(value).unwrap();
        let external = transform.to_external(internal);
        assert!((external - value).abs() <= 1e-12 * value.max(1e-3));
    }
}

#[test]
fn test_external_derivative_matches_finite_difference() {
    let transform = BoundsTransform::new(Bounds::new(-10.0, 10.0).unwrap());
    for &internal in &[-1.0, 0.0, 0.3, 1.2] {
        let h = 1e-6;
        let numeric =
            (transform.to_external(internal + h) - transform.to_external(internal - h)) / (2.0 * h);
        assert!((transform.external_derivative(internal) - numeric).abs() < 1e-6);
    }
}
