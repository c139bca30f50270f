//! Error types for curve fitting.

use thiserror::Error;

/// Errors that can occur while fitting.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("Fit did not converge after {iterations} iterations: {what}")]
    DidNotConverge { what: String, iterations: usize },

    #[error("Insufficient data: {what}")]
    InsufficientData { what: String },

    #[error("Non-finite input: {what}")]
    NonFinite { what: String },
}

pub type FitResult<T> = Result<T, FitError>;

impl From<sd_core::CoreError> for FitError {
    fn from(e: sd_core::CoreError) -> Self {
        FitError::NonFinite {
            what: e.to_string(),
        }
    }
}
