//! Tests for the UncertaintyCalculator struct
//!
//! A straight line through (1, 1), (2, 2), (3, 2), (4, 3) has the least
//! squares solution m = 0.6, b = 0.5 with chi-square 0.2, so every number
//! below can be checked by hand.

use approx::assert_relative_eq;
use ndarray::{arr2, Array2};
use resonator::parameters::Parameters;
use resonator::uncertainty::{calculate_covariance, UncertaintyCalculator};
use resonator::ResonatorError;

fn line_jacobian() -> Array2<f64> {
    // d residual / d (m, b) = (x, 1)
    arr2(&[[1.0, 1.0], [2.0, 1.0], [3.0, 1.0], [4.0, 1.0]])
}

fn line_parameters() -> Parameters {
    let mut params = Parameters::new();
    params.add_param("m", 0.6).unwrap();
    params.add_param("b", 0.5).unwrap();
    params
}

#[test]
fn test_uncertainty_calculator_new() {
    let calculator = UncertaintyCalculator::new(4, 2, 0.2);
    assert_eq!(calculator.nfree, 2);
    assert_eq!(calculator.chisqr, 0.2);
    assert_relative_eq!(calculator.redchi, 0.1);
}

#[test]
fn test_line_covariance_by_hand() {
    let calculator = UncertaintyCalculator::new(4, 2, 0.2);
    let covar = calculator.calculate_covariance(&line_jacobian()).unwrap();

    // inv(J^T J) = [[0.2, -0.5], [-0.5, 1.5]], scaled by redchi = 0.1
    assert_relative_eq!(covar[[0, 0]], 0.02, epsilon = 1e-12);
    assert_relative_eq!(covar[[0, 1]], -0.05, epsilon = 1e-12);
    assert_relative_eq!(covar[[1, 0]], -0.05, epsilon = 1e-12);
    assert_relative_eq!(covar[[1, 1]], 0.15, epsilon = 1e-12);
}

#[test]
fn test_full_analysis_of_unbounded_line() {
    let params = line_parameters();
    let calculator = UncertaintyCalculator::new(4, 2, 0.2);
    let result = calculator
        .analyze(&line_jacobian(), &params, &[0.6, 0.5])
        .unwrap();

    assert_eq!(result.nfree, 2);
    assert_relative_eq!(result.redchi, 0.1);
    assert_relative_eq!(result.standard_errors["m"], 0.02f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(result.standard_errors["b"], 0.15f64.sqrt(), epsilon = 1e-12);

    let expected = -0.05 / (0.02f64 * 0.15).sqrt();
    assert_relative_eq!(result.correlation[[0, 1]], expected, epsilon = 1e-12);
    assert_eq!(result.correlation[[0, 1]], result.correlation[[1, 0]]);
    assert_eq!(result.correlation[[0, 0]], 1.0);
}

#[test]
fn test_fixed_parameters_are_left_out() {
    let mut params = line_parameters();
    params.get_mut("b").unwrap().set_vary(false);

    let jacobian = arr2(&[[1.0], [2.0], [3.0], [4.0]]);
    let calculator = UncertaintyCalculator::new(4, 1, 0.3);
    let result = calculator.analyze(&jacobian, &params, &[0.6]).unwrap();

    assert_eq!(result.standard_errors.len(), 1);
    assert!(!result.standard_errors.contains_key("b"));
    // 0.3 / 3 / 30
    assert_relative_eq!(result.covariance[[0, 0]], 0.1 / 30.0, epsilon = 1e-12);
}

#[test]
fn test_lower_bounded_parameter() {
    let mut params = Parameters::new();
    params
        .add_param_with_bounds("background_magnitude", 0.7, 0.0, f64::INFINITY)
        .unwrap();
    let internal = params.varying_internal_values().unwrap();

    let jacobian = arr2(&[[1.0], [1.0], [1.0]]);
    let calculator = UncertaintyCalculator::new(3, 1, 2.0);
    let result = calculator.analyze(&jacobian, &params, &internal).unwrap();

    // internal variance is redchi / 3 = 1/3, scaled by (x / sqrt(x^2 + 1))^2
    let x = internal[0];
    let scale = x / (x * x + 1.0).sqrt();
    assert_relative_eq!(
        result.covariance[[0, 0]],
        scale * scale / 3.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_parameter_without_influence_is_singular() {
    let jacobian = arr2(&[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
    assert!(matches!(
        calculate_covariance(&jacobian, 1.0),
        Err(ResonatorError::SingularMatrix)
    ));

    let calculator = UncertaintyCalculator::new(3, 2, 1.0);
    assert!(calculator
        .analyze(&jacobian, &line_parameters(), &[0.6, 0.5])
        .is_err());
}
