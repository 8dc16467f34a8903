//! # Parameter System
//!
//! Named parameters with bounds, used to describe both the resonator and the
//! background models and to hand a bounded problem to the least-squares engine.
//!
//! - [`Parameter`]: a value, bounds, a vary flag and a standard error
//! - [`Parameters`]: an ordered collection looked up by name
//! - [`Bounds`] and [`BoundsTransform`]: the Minuit-style mapping between the
//!   bounded external values and the unbounded internal values the optimizer sees
//!
//! ## Example Usage
//!
//! ```rust
//! use resonator::parameters::Parameters;
//!
//! let mut params = Parameters::new();
//! params.add_param_with_bounds("coupling_loss", 1e-4, 1e-12, 1.0).unwrap();
//! params.add_param_with_bounds("asymmetry", 0.0, -10.0, 10.0).unwrap();
//! params.get_mut("asymmetry").unwrap().set_vary(false);
//!
//! let internal = params.varying_internal_values().unwrap();
//! assert_eq!(internal.len(), 1);
//! params.update_from_internal(&internal).unwrap();
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
