//! Error types for the Docweave SDK.

use docweave_domain::DocweaveError;
use thiserror::Error;

/// SDK operation errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Invalid or incomplete client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service answered with an error
    #[error("Service error (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Error message from the service body, or the raw body
        message: String,
    },

    /// The remote service answered with something unreadable
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    /// Connection error (network, DNS, timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Local extraction failed
    #[error(transparent)]
    Extraction(#[from] DocweaveError),
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            SdkError::Connection(e.to_string())
        } else if e.is_decode() {
            SdkError::InvalidResponse(e.to_string())
        } else {
            match e.status() {
                Some(status) => SdkError::Remote {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => SdkError::Connection(e.to_string()),
            }
        }
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(e: toml::de::Error) -> Self {
        SdkError::Config(format!("Failed to parse config TOML: {}", e))
    }
}
