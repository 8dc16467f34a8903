//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the default least-squares engine. Fitters only see
//! the [`LeastSquaresSolver`] trait, so another engine can be swapped in.

use log::debug;
use ndarray::Array1;
use serde::Serialize;
use std::fmt;

use crate::error::{ResonatorError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone, Serialize)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// A least-squares engine: minimizes the sum of squared residuals of a
/// [`Problem`] starting from an initial vector.
pub trait LeastSquaresSolver {
    /// Minimize `problem` starting at `initial_params`.
    ///
    /// Failure to converge is reported through `LmResult::success`, not as
    /// an error; errors are reserved for problems the engine cannot start on.
    fn minimize(&self, problem: &dyn Problem, initial_params: Array1<f64>) -> Result<LmResult>;
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for the relative reduction in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for the relative step length.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient cosine.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the relative finite-difference step.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    fn jacobian(
        &self,
        problem: &dyn Problem,
        params: &Array1<f64>,
        residuals: &Array1<f64>,
    ) -> Result<ndarray::Array2<f64>> {
        if problem.has_custom_jacobian() {
            problem.jacobian(params)
        } else {
            finite_difference::jacobian_from_base(
                problem,
                params,
                residuals,
                Some(self.config.epsilon),
            )
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    pub fn minimize(&self, problem: &dyn Problem, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(ResonatorError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;

        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(ResonatorError::FunctionEvaluation(
                "residuals are not finite at the initial parameters".to_string(),
            ));
        }

        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let criteria =
            ConvergenceCriteria::new(self.config.xtol, self.config.ftol, self.config.gtol);
        let mut region = TrustRegion::from_config(&self.config);
        let mut iterations = 0;

        let status = 'outer: loop {
            if cost == 0.0 {
                break ConvergenceStatus::FunctionValueConvergence;
            }
            if iterations >= self.config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let jacobian = self.jacobian(problem, &params, &residuals)?;
            func_evals += n_params;
            iterations += 1;

            if criteria.small_gradient(&jacobian, &residuals) {
                break ConvergenceStatus::GradientConvergence;
            }

            loop {
                let step = match LmStep::calculate_step(&jacobian, &residuals, region.lambda) {
                    Ok(step) => step,
                    Err(ResonatorError::SingularMatrix) => {
                        if region.exhausted() {
                            break 'outer ConvergenceStatus::DampingExhausted;
                        }
                        region.reject();
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                let new_params = &params + &step.step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;

                let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();
                let gain = TrustRegion::gain_ratio(cost, new_cost, step.predicted_reduction);
                let small_step = criteria.small_step(&params, &step.step);

                if region.update_lambda(gain) {
                    debug!(
                        "lm iteration {}: accepted, cost {:.6e} -> {:.6e}, lambda {:.1e}",
                        iterations, cost, new_cost, region.lambda
                    );
                    let small_reduction =
                        criteria.small_reduction(cost, cost - new_cost, step.predicted_reduction);

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;

                    if small_reduction {
                        break 'outer ConvergenceStatus::FunctionValueConvergence;
                    }
                    if small_step {
                        break 'outer ConvergenceStatus::ParameterConvergence;
                    }
                    break;
                }

                debug!(
                    "lm iteration {}: rejected, gain ratio {:.3e}, lambda {:.1e}",
                    iterations, gain, region.lambda
                );
                if small_step {
                    break 'outer ConvergenceStatus::ParameterConvergence;
                }
                if region.exhausted() {
                    break 'outer ConvergenceStatus::DampingExhausted;
                }
            }
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message: status.description().to_string(),
        })
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn minimize(&self, problem: &dyn Problem, initial_params: Array1<f64>) -> Result<LmResult> {
        LevenbergMarquardt::minimize(self, problem, initial_params)
    }
}
