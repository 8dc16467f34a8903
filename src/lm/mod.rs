//! Levenberg-Marquardt algorithm implementation.
//!
//! The default least-squares engine behind [`LeastSquaresSolver`]. Steps use
//! Marquardt's diagonal scaling, the damping follows the gain ratio, and the
//! stopping tests are the MINPACK ones.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{LeastSquaresSolver, LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
