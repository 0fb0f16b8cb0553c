//! Docweave Extractor
//!
//! Turns documents plus a target schema into validated, normalized JSON by
//! calling a model provider.
//!
//! # Architecture
//!
//! ```text
//! DocumentSource(s) → Extractor → ModelProvider → validate → normalize → ExtractionOutput
//! ```
//!
//! # Multi-document modes
//!
//! - **per_file**: one provider call per document, bounded concurrency, results in document order
//! - **aggregate**: one provider call with every document attached
//! - **both**: per-file calls first, then the aggregate call
//!
//! Any failure aborts the whole extraction. In-flight per-file calls are
//! cancelled and the error of the first failing document (in document
//! order) is returned.
//!
//! # Example Usage
//!
//! ```no_run
//! use docweave_extractor::{ExtractRequest, Extractor, ExtractorConfig, RawTextSource};
//! use docweave_llm::MockProvider;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(MockProvider::new(json!({"name": "Test"})));
//! let extractor = Extractor::new(provider, ExtractorConfig::default());
//!
//! let request = ExtractRequest::new(vec![Arc::new(RawTextSource::new("hello").with_name("doc1"))])
//!     .with_schema(json!({"type": "object", "properties": {"name": {"type": "string"}}}));
//!
//! let output = extractor.extract(request).await?;
//! println!("{}", output.to_value());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod extractor;
mod prompt;
mod sources;
mod types;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, DEFAULT_MODEL_NAME};
pub use extractor::Extractor;
pub use prompt::{
    PromptBuilder, AGGREGATE_NOTE, DEFAULT_PROMPT, DEFAULT_SYSTEM_INSTRUCTION, DESCRIBE_PROMPT,
    EXTRACT_ALL_PROMPT,
};
pub use sources::{source_from_uri, FileSource, HttpSource, RawTextSource};
pub use types::{
    ExtractRequest, ExtractionOutput, ExtractionResult, MultiResult, ResultMeta, SchemaInput,
};
