//! Docweave Model Provider Layer
//!
//! Implementations of the `ModelProvider` trait from `docweave-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted fake for tests (per-document payloads, failures, delays)
//! - `StubProvider`: Offline provider returning schema-shaped nulls
//! - `OllamaProvider`: Local Ollama chat API with JSON-schema constrained output
//!
//! # Examples
//!
//! ```
//! use docweave_domain::{GenerationRequest, ModelProvider};
//! use docweave_llm::MockProvider;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new(json!({"name": "Test"}));
//! let response = provider
//!     .generate_structured(GenerationRequest::new("prompt"))
//!     .await
//!     .unwrap();
//! assert_eq!(response.data, json!({"name": "Test"}));
//! assert_eq!(provider.call_count(), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod mock;
pub mod ollama;
pub mod parser;
pub mod response_schema;
pub mod stub;

use docweave_domain::DocweaveError;
use thiserror::Error;

pub use mock::{MockProvider, RecordedCall};
pub use ollama::OllamaProvider;
pub use response_schema::sanitize_response_schema;
pub use stub::StubProvider;

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response could not be interpreted as JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<LlmError> for DocweaveError {
    fn from(err: LlmError) -> Self {
        DocweaveError::Provider(err.to_string())
    }
}
