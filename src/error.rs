use thiserror::Error;

use crate::parameters::ParameterError;

/// Error types for the resonator-rs library.
#[derive(Error, Debug)]
pub enum ResonatorError {
    /// Error indicating a mismatch in array lengths or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for physical parameter values outside their valid region.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error raised by the parameter system (bounds, names).
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Error indicating the least-squares engine failed to converge.
    #[error("Fit failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error during residual or model evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Not implemented functionality.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for resonator-rs operations.
pub type Result<T> = std::result::Result<T, ResonatorError>;

/// Check that two sequences paired positionally have the same length.
pub(crate) fn check_lengths(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ResonatorError::DimensionMismatch(format!(
            "{}: expected {} values, got {}",
            what, expected, actual
        )));
    }
    Ok(())
}
