//! Convergence criteria for the Levenberg-Marquardt iteration.
//!
//! The tests follow MINPACK: a relative step length (`xtol`), the relative
//! actual and predicted cost reductions (`ftol`) and the largest cosine
//! between the residual vector and a Jacobian column (`gtol`).

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Possible convergence states for an optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small function value change.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// The damping reached its maximum without finding a step that lowers the cost.
    DampingExhausted,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small function value change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::DampingExhausted => {
                "Terminated: damping reached its maximum without reducing the cost"
            }
        }
    }
}

/// Criteria for determining when an optimization algorithm has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for change in parameter values.
    pub xtol: f64,

    /// Tolerance for change in function value.
    pub ftol: f64,

    /// Tolerance for the gradient cosine.
    pub gtol: f64,
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64) -> Self {
        Self { xtol, ftol, gtol }
    }

    /// `|step| <= xtol * (xtol + |params|)`
    pub fn small_step(&self, params: &Array1<f64>, step: &Array1<f64>) -> bool {
        let xnorm = params.dot(params).sqrt();
        let dnorm = step.dot(step).sqrt();
        dnorm <= self.xtol * (self.xtol + xnorm)
    }

    /// Both the actual and the predicted reduction are below `ftol * cost`.
    pub fn small_reduction(&self, cost: f64, actual: f64, predicted: f64) -> bool {
        actual.abs() <= self.ftol * cost && predicted <= self.ftol * cost
    }

    /// Largest `|J_j . r| / (|J_j| |r|)` over the columns with non-zero norm.
    pub fn gradient_cosine(jacobian: &Array2<f64>, residuals: &Array1<f64>) -> f64 {
        let rnorm = residuals.dot(residuals).sqrt();
        if rnorm == 0.0 {
            return 0.0;
        }

        jacobian
            .columns()
            .into_iter()
            .filter_map(|column| {
                let cnorm = column.dot(&column).sqrt();
                (cnorm > 0.0).then(|| column.dot(residuals).abs() / (cnorm * rnorm))
            })
            .fold(0.0, f64::max)
    }

    /// The residuals are orthogonal to every Jacobian column within `gtol`.
    pub fn small_gradient(&self, jacobian: &Array2<f64>, residuals: &Array1<f64>) -> bool {
        Self::gradient_cosine(jacobian, residuals) <= self.gtol
    }
}
