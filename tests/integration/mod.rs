//! Integration tests for the resonator-rs library
//!
//! Each module fits synthetic measurements end to end and checks the
//! recovered parameters against the values the data were generated with.

// Linear shunt resonator, with and without noise
pub mod shunt_fit;

// Kerr-nonlinear resonator and the cubic behind it
pub mod nonlinear_fit;

// Backgrounds other than a complex constant
pub mod background_fit;

// Plot-ready traces from a real fit
pub mod traces;
