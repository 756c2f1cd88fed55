//! Error types for the churn core

use thiserror::Error;

/// Errors that can occur while generating, encoding or scoring churn data
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Missing or invalid configuration (files, parameters, column lists)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Classifier and feature matrix disagree on the feature layout
    #[error("Schema mismatch: classifier expects {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// Classifier was fitted on a different ordered column set than the schema
    #[error("Schema fingerprint mismatch: classifier {model}, schema {schema}")]
    FingerprintMismatch { model: String, schema: String },

    /// Malformed or out-of-range input record (row 0 is the header)
    #[error("Data error at row {row}: {reason}")]
    Data { row: usize, reason: String },

    /// Invalid parameters passed to a draw, split or fit
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delimited-text error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for churn core operations
pub type Result<T> = std::result::Result<T, ChurnError>;
