//! Finite difference methods for numerical differentiation.
//!
//! The resonator models are evaluated through the bounds transform, so no
//! closed-form Jacobian is available; the optimizer falls back to these.

use crate::error::{ResonatorError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Step for parameter `value`, relative to its magnitude but never below `eps`.
fn step_size(value: f64, eps: f64) -> f64 {
    eps * value.abs().max(1.0)
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// J[i,j] = ∂residual[i]/∂param[j], with a step of `epsilon` relative to
/// the magnitude of each parameter (absolute below 1).
pub fn jacobian<P>(problem: &P, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    P: Problem + ?Sized,
{
    let residuals = problem.eval(params)?;
    jacobian_from_base(problem, params, &residuals, epsilon)
}

/// Forward-difference Jacobian reusing residuals already evaluated at `params`.
pub fn jacobian_from_base<P>(
    problem: &P,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>>
where
    P: Problem + ?Sized,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    if residuals.len() != n_residuals {
        return Err(ResonatorError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let eps_j = step_size(params[j], eps);
        let mut params_perturbed = params.clone();
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        if residuals_perturbed.len() != n_residuals {
            return Err(ResonatorError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                n_residuals,
                residuals_perturbed.len()
            )));
        }

        let mut column = jac.column_mut(j);
        for i in 0..n_residuals {
            column[i] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}
