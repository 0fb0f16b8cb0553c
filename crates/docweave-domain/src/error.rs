//! Error taxonomy shared across the workspace

use thiserror::Error;

/// Result alias for Docweave operations.
pub type Result<T> = std::result::Result<T, DocweaveError>;

/// Errors surfaced by extraction and its collaborators.
///
/// The orchestrator never catches or downgrades these; each one propagates
/// to the immediate caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocweaveError {
    /// Malformed schema declaration, or provider output that fails
    /// required-field/type checks
    #[error("Schema error: {0}")]
    Schema(String),

    /// Document unreadable/unavailable, or an empty document list
    #[error("Document error: {0}")]
    Document(String),

    /// Profile not found or malformed
    #[error("Profile error: {0}")]
    Profile(String),

    /// Upstream model/service failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Orchestration misuse (invalid multi-mode, too many documents, ...)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`DocweaveError`].
///
/// Service boundaries map this to a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`DocweaveError::Schema`]
    Schema,
    /// See [`DocweaveError::Document`]
    Document,
    /// See [`DocweaveError::Profile`]
    Profile,
    /// See [`DocweaveError::Provider`]
    Provider,
    /// See [`DocweaveError::Extraction`]
    Extraction,
    /// See [`DocweaveError::Config`]
    Config,
}

impl DocweaveError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocweaveError::Schema(_) => ErrorKind::Schema,
            DocweaveError::Document(_) => ErrorKind::Document,
            DocweaveError::Profile(_) => ErrorKind::Profile,
            DocweaveError::Provider(_) => ErrorKind::Provider,
            DocweaveError::Extraction(_) => ErrorKind::Extraction,
            DocweaveError::Config(_) => ErrorKind::Config,
        }
    }

    /// The message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            DocweaveError::Schema(m)
            | DocweaveError::Document(m)
            | DocweaveError::Profile(m)
            | DocweaveError::Provider(m)
            | DocweaveError::Extraction(m)
            | DocweaveError::Config(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = DocweaveError::Schema("Missing required field 'name'".to_string());
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.message(), "Missing required field 'name'");
        assert_eq!(err.to_string(), "Schema error: Missing required field 'name'");
    }

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(DocweaveError::Provider("x".into()).kind(), ErrorKind::Provider);
        assert_eq!(DocweaveError::Extraction("x".into()).kind(), ErrorKind::Extraction);
        assert_eq!(DocweaveError::Document("x".into()).kind(), ErrorKind::Document);
    }
}
