//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// SDK error (configuration, remote service, extraction)
    #[error(transparent)]
    Sdk(#[from] docweave_sdk::SdkError),

    /// Core error outside a client call
    #[error(transparent)]
    Docweave(#[from] docweave_domain::DocweaveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema file could not be read as JSON or YAML
    #[error("Invalid schema file {path}: {message}")]
    SchemaFile {
        /// File that failed to parse
        path: String,
        /// Parser message
        message: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
