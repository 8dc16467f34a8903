//! # Covariance Matrix Calculations
//!
//! Covariance, correlation and standard errors from the Jacobian of the
//! residuals at the solution of a least-squares problem.

use crate::error::{ResonatorError, Result};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where redchi is the reduced chi-square (chi^2 / dof).
///
/// Returns `SingularMatrix` when `J^T J` cannot be inverted, which happens
/// when a parameter has no influence on the residuals.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let n = jtj.nrows();

    let matrix = DMatrix::from_fn(n, n, |i, j| jtj[[i, j]]);
    let inverse = matrix
        .clone()
        .cholesky()
        .map(|chol| chol.inverse())
        .or_else(|| matrix.try_inverse())
        .ok_or(ResonatorError::SingularMatrix)?;

    let covar = Array2::from_shape_fn((n, n), |(i, j)| inverse[(i, j)] * redchi);
    if covar.iter().any(|v| !v.is_finite()) {
        return Err(ResonatorError::SingularMatrix);
    }

    Ok(covar)
}

/// Calculate correlation matrix from covariance matrix.
///
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Standard errors are the square roots of the diagonal elements.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
