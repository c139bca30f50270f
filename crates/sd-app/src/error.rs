//! Error types for the sd-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read profile file: {path}")]
    ProfileFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Diagnostics error: {0}")]
    Diagnostics(String),

    #[error("Report serialization failed: {0}")]
    Serialize(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sd-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<sd_format::FormatError> for AppError {
    fn from(err: sd_format::FormatError) -> Self {
        AppError::Format(err.to_string())
    }
}

impl From<sd_diag::DiagError> for AppError {
    fn from(err: sd_diag::DiagError) -> Self {
        AppError::Diagnostics(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialize(err.to_string())
    }
}
