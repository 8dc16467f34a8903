//! # Uncertainty Calculation
//!
//! Parameter uncertainties for a converged least-squares fit:
//!
//! - Covariance matrix estimation from the Jacobian of the residuals
//! - Standard errors and the correlation matrix derived from it
//!
//! The optimizer works on internal (unbounded) parameter values, so the
//! covariance is first estimated in the internal domain and then carried to
//! the external parameters through the derivative of the bounds transform.

mod covariance;

pub use covariance::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};

use crate::error::{ResonatorError, Result};
use crate::parameters::Parameters;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Structure to hold uncertainty calculation results.
#[derive(Debug, Clone)]
pub struct UncertaintyResult {
    /// Covariance matrix of the varying parameters, in external units
    pub covariance: Array2<f64>,
    /// Standard errors for each varying parameter
    pub standard_errors: HashMap<String, f64>,
    /// Correlation matrix derived from covariance
    pub correlation: Array2<f64>,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
}

/// Calculator for parameter uncertainties.
#[derive(Debug, Clone)]
pub struct UncertaintyCalculator {
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
}

impl UncertaintyCalculator {
    /// Create a new UncertaintyCalculator
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let nfree = if ndata > nvarys { ndata - nvarys } else { 1 };
        let redchi = chisqr / nfree as f64;

        Self {
            nfree,
            chisqr,
            redchi,
        }
    }

    /// Covariance in the internal domain from the internal-domain Jacobian.
    pub fn calculate_covariance(&self, jacobian: &Array2<f64>) -> Result<Array2<f64>> {
        covariance::calculate_covariance(jacobian, self.redchi)
    }

    /// Carry an internal covariance to the external parameters.
    ///
    /// With `D = diag(d external / d internal)` evaluated at `internal`, the
    /// external covariance is `D C D`.
    pub fn to_external(
        &self,
        covar: &Array2<f64>,
        params: &Parameters,
        internal: &[f64],
    ) -> Result<Array2<f64>> {
        let varying = params.varying();
        if varying.len() != internal.len() || covar.nrows() != internal.len() {
            return Err(ResonatorError::DimensionMismatch(format!(
                "covariance of size {} for {} varying parameters and {} internal values",
                covar.nrows(),
                varying.len(),
                internal.len()
            )));
        }

        let scale: Array1<f64> = varying
            .iter()
            .zip(internal)
            .map(|(p, &x)| p.bounds_transform().external_derivative(x))
            .collect();

        let n = scale.len();
        Ok(Array2::from_shape_fn((n, n), |(i, j)| {
            covar[[i, j]] * scale[i] * scale[j]
        }))
    }

    /// Calculate standard errors from covariance matrix
    pub fn calculate_standard_errors(
        &self,
        covar: &Array2<f64>,
        params: &Parameters,
    ) -> HashMap<String, f64> {
        let std_errors = covariance::standard_errors_from_covariance(covar);

        params
            .varying()
            .iter()
            .zip(std_errors.iter())
            .map(|(param, &err)| (param.name().to_string(), err))
            .collect()
    }

    /// Calculate correlation matrix from covariance matrix
    pub fn calculate_correlation(&self, covar: &Array2<f64>) -> Array2<f64> {
        covariance::calculate_correlation(covar)
    }

    /// Full uncertainty analysis from the internal-domain Jacobian at the solution.
    pub fn analyze(
        &self,
        jacobian: &Array2<f64>,
        params: &Parameters,
        internal: &[f64],
    ) -> Result<UncertaintyResult> {
        let internal_covar = self.calculate_covariance(jacobian)?;
        let covariance = self.to_external(&internal_covar, params, internal)?;
        let standard_errors = self.calculate_standard_errors(&covariance, params);
        let correlation = self.calculate_correlation(&covariance);

        Ok(UncertaintyResult {
            covariance,
            standard_errors,
            correlation,
            chisqr: self.chisqr,
            redchi: self.redchi,
            nfree: self.nfree,
        })
    }
}
