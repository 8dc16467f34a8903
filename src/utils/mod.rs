//! Numerical helpers shared by the optimizer.

pub mod finite_difference;

pub use finite_difference::jacobian;
