//! Integration tests for parameter uncertainties

mod uncertainty_calculator_tests;
