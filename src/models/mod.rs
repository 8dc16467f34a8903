//! Built-in response models.
//!
//! - [`shunt`]: linear and Kerr-nonlinear shunt ("hanger") resonators
//! - [`background`]: non-resonant responses of the measurement chain
//! - [`guess`]: starting values estimated from the data
//!
//! ## Example Usage
//!
//! ```rust
//! use ndarray::Array1;
//! use resonator::model::{ResonatorParameters, ResponseModel};
//! use resonator::models::{shunt, Shunt};
//!
//! let truth = ResonatorParameters::linear(5e9, 2e-5, 5e-5, 0.0);
//! let frequency = Array1::linspace(4.999e9, 5.001e9, 501);
//! let data = shunt(&frequency, &truth).unwrap();
//!
//! let params = Shunt.guess(&frequency, &data).unwrap();
//! assert_eq!(params.len(), 4);
//! ```

pub mod background;
pub mod guess;
pub mod shunt;

pub use background::{ComplexConstant, MagnitudePhaseDelay, One};
pub use guess::guess_smooth;
pub use shunt::{shunt, shunt_at, shunt_nonlinear, shunt_nonlinear_at, Shunt, ShuntNonlinear};
