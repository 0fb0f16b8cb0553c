//! Capability traits for the collaborators of the extractor
//!
//! Implementations live outside this crate: providers in `docweave-llm`,
//! document sources in `docweave-extractor`, and profile resolvers in
//! `docweave-catalog`. All of them are shared behind `Arc` and must be
//! `Send + Sync`.

use crate::error::Result;
use crate::options::ProviderOptions;
use crate::profile::ExtractionProfile;
use crate::schema::InternalSchema;
use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;

/// Raw content of a loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// Binary content (PDFs, images, ...)
    Bytes(Vec<u8>),
    /// Already-decoded text
    Text(String),
}

impl DocumentContent {
    /// Content as text, decoding bytes lossily as UTF-8
    pub fn as_text_lossy(&self) -> Cow<'_, str> {
        match self {
            DocumentContent::Bytes(bytes) => String::from_utf8_lossy(bytes),
            DocumentContent::Text(text) => Cow::Borrowed(text),
        }
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DocumentContent::Bytes(bytes) => bytes,
            DocumentContent::Text(text) => text.as_bytes(),
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for zero-length content
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A loaded document handed to the provider for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Display name of the source
    pub name: String,
    /// Loaded content
    pub content: DocumentContent,
}

impl Attachment {
    /// Create an attachment
    pub fn new(name: impl Into<String>, content: DocumentContent) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Something that can produce document content
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load the content. Failures are reported as `DocweaveError::Document`.
    async fn load(&self) -> Result<DocumentContent>;

    /// Human-readable name used in prompts and result metadata
    fn display_name(&self) -> String;
}

/// Everything a provider needs for one structured-generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Prompt body
    pub prompt: &'a str,
    /// Target shape, when known
    pub schema: Option<&'a InternalSchema>,
    /// Effective generation options
    pub options: Option<&'a ProviderOptions>,
    /// System instruction
    pub system_instruction: Option<&'a str>,
    /// Documents for this call, in request order
    pub attachments: &'a [Attachment],
}

impl<'a> GenerationRequest<'a> {
    /// Request with only a prompt
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            schema: None,
            options: None,
            system_instruction: None,
            attachments: &[],
        }
    }

    /// Effective model name, if the options set one
    pub fn model(&self) -> Option<&'a str> {
        self.options.and_then(ProviderOptions::model)
    }
}

/// Result of one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResponse {
    /// Parsed JSON produced by the model
    pub data: Value,
    /// Model that actually served the call
    pub model: Option<String>,
    /// Provider-specific usage accounting
    pub usage: Option<Value>,
}

impl StructuredResponse {
    /// Response carrying only data
    pub fn new(data: Value) -> Self {
        Self {
            data,
            model: None,
            usage: None,
        }
    }

    /// Attach the serving model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach usage information
    pub fn with_usage(mut self, usage: Value) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Generative-model backend producing structured JSON
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Produce JSON for the request. Failures are `DocweaveError::Provider`.
    async fn generate_structured(&self, request: GenerationRequest<'_>) -> Result<StructuredResponse>;
}

/// Lookup of named extraction profiles
pub trait ProfileResolver: Send + Sync {
    /// Load a profile by name (`DocweaveError::Profile` when not found)
    fn load(&self, name: &str) -> Result<ExtractionProfile>;

    /// Names of every resolvable profile
    fn list(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text_lossy() {
        let bytes = DocumentContent::Bytes(vec![b'h', b'i', 0xff]);
        assert_eq!(bytes.as_text_lossy(), "hi\u{fffd}");
        assert_eq!(bytes.len(), 3);

        let text = DocumentContent::Text("hello".to_string());
        assert_eq!(text.as_text_lossy(), "hello");
        assert_eq!(text.as_bytes(), b"hello");
        assert!(DocumentContent::Text(String::new()).is_empty());
    }

    #[test]
    fn test_request_model_ignores_empty() {
        let opts = ProviderOptions::default().with_model("");
        let request = GenerationRequest {
            options: Some(&opts),
            ..GenerationRequest::new("p")
        };
        assert!(request.model().is_none());
    }
}
