//! Error types for parsing simulator output.

use thiserror::Error;

/// Errors raised while reading an output stream or a schema.
///
/// Every variant carries enough location context (line, column, row index or
/// field name) to find the fault in the source file.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Schema mismatch: {what}")]
    SchemaMismatch { what: String },

    #[error(
        "Malformed {section} row {row} (line {line}): expected {expected} values, found {found}"
    )]
    MalformedRow {
        section: String,
        row: usize,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Parse error at line {line}, column {column}: '{token}' is not a number")]
    ParseError {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("Invalid parameter {name}: {what}")]
    InvalidParameter { name: String, what: String },

    #[error("Unknown simulation family: {name}")]
    UnknownFamily { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type FormatResult<T> = Result<T, FormatError>;
