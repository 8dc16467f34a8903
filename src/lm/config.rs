//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! Convergence tolerances, the damping schedule and the finite-difference
//! step. The configuration is serializable so it can be stored next to fit
//! results.

use crate::utils::finite_difference::DEFAULT_EPSILON;
use serde::{Deserialize, Serialize};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of iterations (Jacobian evaluations). Default: 200
    pub max_iterations: usize,

    /// Tolerance for the relative reduction in cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for the relative step length. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for the cosine between residuals and Jacobian columns. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Relative step for finite-difference Jacobians. Default: 1e-8
    pub epsilon: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            epsilon: DEFAULT_EPSILON,
        }
    }
}
