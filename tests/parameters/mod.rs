//! Integration tests for the parameter system
//!
//! Bounds, vary flags and JSON persistence of the named parameters the
//! resonator and background models share.

// Tests for the Parameter struct
mod parameter_tests;

// Tests for the Parameters collection
mod parameters_tests;
