//! Error types for diagnostics.

use thiserror::Error;

/// Errors raised by the diagnostics engine.
#[derive(Error, Debug)]
pub enum DiagError {
    /// Recoverable: analyses turn this into an unconverged estimate.
    #[error("Fit did not converge (seed {seed}): {reason}")]
    FitDidNotConverge { seed: f64, reason: String },

    #[error("No samples: {what}")]
    NoSamples { what: &'static str },

    #[error("Numeric error: {0}")]
    Numeric(#[from] sd_core::CoreError),
}

pub type DiagResult<T> = Result<T, DiagError>;
