//! # resonator-rs
//!
//! `resonator-rs` fits frequency-swept complex transmission data of
//! microwave and optical resonators in the shunt ("hanger") configuration,
//! including resonators with a Kerr-type nonlinearity.
//!
//! The library provides:
//! - Linear and Kerr-nonlinear shunt resonator models, with the Kerr detuning
//!   solved per point from a cubic (Cardano's method)
//! - Background models for the non-resonant part of the measurement chain
//! - A fitter that guesses starting values, fits `background * resonator`
//!   with Levenberg-Marquardt, and reports standard errors
//! - Plot-ready traces of the measurement, the model and the resonance
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use resonator::{shunt, ResonatorFitter, ResonatorParameters};
//!
//! let truth = ResonatorParameters::linear(5e9, 2e-5, 5e-5, 0.0);
//! let frequency = Array1::linspace(4.999e9, 5.001e9, 501);
//! let data = shunt(&frequency, &truth).unwrap();
//!
//! let fitter = ResonatorFitter::shunt(frequency, data, None).unwrap();
//! let qi = fitter.internal_quality_factor().unwrap();
//! assert!((qi / 5e4 - 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod fitter;
pub mod lm;
pub mod model;
pub mod models;
pub mod nonlinear;
pub mod parameters;
pub mod problem;
pub mod traces;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{ResonatorError, Result};
pub use fitter::{FitOptions, FitResult, MeasurementModelResonance, ResonatorFitter};
pub use lm::{LeastSquaresSolver, LevenbergMarquardt, LmConfig};
pub use model::{ResonatorModel, ResonatorParameters, ResponseModel};
pub use models::{shunt, shunt_nonlinear, ComplexConstant, MagnitudePhaseDelay, One, Shunt, ShuntNonlinear};
pub use nonlinear::{kerr_detuning, Choose, ChooseRoot};
pub use parameters::{Parameter, Parameters};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
