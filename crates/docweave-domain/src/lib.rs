//! Docweave Domain Layer
//!
//! Core types and capability traits shared by every other Docweave crate.
//!
//! ## Key Concepts
//!
//! - **InternalSchema**: Normalized target shape (flat fields + named record sets)
//! - **Validation / Normalization**: Checking and canonicalizing provider output
//! - **ExtractionProfile**: Reusable bundle of schema, prompt and option defaults
//! - **ProviderOptions**: Layered generation settings
//! - **Capabilities**: `DocumentSource`, `ModelProvider`, `ProfileResolver`
//!
//! ## Architecture
//!
//! This crate holds no I/O. Provider, source and catalog implementations live
//! in `docweave-llm`, `docweave-extractor` and `docweave-catalog`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod normalize;
pub mod options;
pub mod profile;
pub mod schema;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use error::{DocweaveError, ErrorKind, Result};
pub use normalize::normalize_output;
pub use options::ProviderOptions;
pub use profile::{ExtractionProfile, MultiMode, ProfileMode};
pub use schema::{parse_schema, Field, FieldType, InternalSchema, RecordSet};
pub use traits::{
    Attachment, DocumentContent, DocumentSource, GenerationRequest, ModelProvider,
    ProfileResolver, StructuredResponse,
};
pub use validation::validate_output;
