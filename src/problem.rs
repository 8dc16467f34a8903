//! Problem definition trait.
//!
//! A `Problem` is a nonlinear least-squares problem over a flat vector of
//! unbounded values, the form the Levenberg-Marquardt engine works with.
//! Resonator fits reach it through [`crate::model::ModelProblem`].

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether `jacobian` is overridden with an analytic implementation.
    ///
    /// When false the optimizer computes finite differences itself, with the
    /// step size from its configuration.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
