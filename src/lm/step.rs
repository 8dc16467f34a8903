//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The step solves `(J^T J + lambda * D) step = -J^T r`, where `D` is the
//! diagonal of `J^T J` (Marquardt scaling), so parameters with very different
//! sensitivities are damped alike.

use crate::error::{ResonatorError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in cost, `|r|^2 - |r + J step|^2`
    pub predicted_reduction: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the damped step at the current Jacobian and residuals.
    ///
    /// Fails with `SingularMatrix` if the damped normal equations cannot be
    /// solved; the caller increases the damping and retries.
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        lambda: f64,
    ) -> Result<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);
        let n = j_t_j.nrows();

        let max_diag = j_t_j.diag().iter().cloned().fold(0.0, f64::max);
        let floor = (f64::EPSILON * max_diag).max(f64::MIN_POSITIVE);

        let mut augmented = DMatrix::from_fn(n, n, |i, j| j_t_j[[i, j]]);
        for i in 0..n {
            augmented[(i, i)] += lambda * j_t_j[[i, i]].max(floor);
        }
        let rhs = DVector::from_iterator(n, j_t_r.iter().map(|g| -g));

        let solution = Self::solve(augmented, &rhs)?;
        let step: Array1<f64> = solution.iter().cloned().collect();
        if step.iter().any(|s| !s.is_finite()) {
            return Err(ResonatorError::SingularMatrix);
        }

        let j_step = jacobian.dot(&step);
        let predicted_reduction = -(2.0 * residuals.dot(&j_step) + j_step.dot(&j_step));

        Ok(StepResult {
            step,
            predicted_reduction,
        })
    }

    /// Cholesky first, LU as a fallback for matrices that lost definiteness
    /// to rounding.
    fn solve(matrix: DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        if let Some(cholesky) = matrix.clone().cholesky() {
            return Ok(cholesky.solve(rhs));
        }

        matrix.lu().solve(rhs).ok_or(ResonatorError::SingularMatrix)
    }
}
