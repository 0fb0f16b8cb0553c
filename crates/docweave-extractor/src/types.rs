//! Request and result types for extraction

use docweave_domain::{
    DocumentSource, ExtractionProfile, InternalSchema, MultiMode, ProviderOptions, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Schema supplied with a request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SchemaInput {
    /// No schema: provider output is passed through untouched
    #[default]
    None,
    /// Raw declaration, parsed before any document is loaded
    Raw(Value),
    /// Already parsed schema
    Internal(InternalSchema),
}

/// Request to extract structured data from documents
#[derive(Clone, Default)]
pub struct ExtractRequest {
    /// Documents, in order
    pub docs: Vec<Arc<dyn DocumentSource>>,

    /// Explicit schema (a profile schema takes precedence)
    pub schema: SchemaInput,

    /// Resolved profile, if any
    pub profile: Option<ExtractionProfile>,

    /// Per-call option overrides
    pub options: Option<ProviderOptions>,

    /// Explicit multi-mode
    pub multi_mode: Option<MultiMode>,
}

impl ExtractRequest {
    /// Create a request over `docs`
    pub fn new(docs: Vec<Arc<dyn DocumentSource>>) -> Self {
        Self {
            docs,
            ..Default::default()
        }
    }

    /// Use a raw schema declaration
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = SchemaInput::Raw(schema);
        self
    }

    /// Use a parsed schema
    pub fn with_internal_schema(mut self, schema: InternalSchema) -> Self {
        self.schema = SchemaInput::Internal(schema);
        self
    }

    /// Use a profile
    pub fn with_profile(mut self, profile: ExtractionProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set per-call option overrides
    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the multi-mode
    pub fn with_multi_mode(mut self, mode: MultiMode) -> Self {
        self.multi_mode = Some(mode);
        self
    }

    /// Set the multi-mode from its wire name
    ///
    /// Fails with `DocweaveError::Extraction` for unknown names.
    pub fn with_multi(self, mode: &str) -> Result<Self> {
        Ok(self.with_multi_mode(mode.parse()?))
    }
}

impl fmt::Debug for ExtractRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let docs: Vec<String> = self.docs.iter().map(|d| d.display_name()).collect();
        f.debug_struct("ExtractRequest")
            .field("docs", &docs)
            .field("schema", &self.schema)
            .field("profile", &self.profile.as_ref().map(|p| &p.name))
            .field("options", &self.options)
            .field("multi_mode", &self.multi_mode)
            .finish()
    }
}

/// Metadata attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMeta {
    /// Model that served the call (provider-reported, else requested)
    pub model: Option<String>,

    /// Provider usage accounting, opaque
    pub usage: Option<Value>,

    /// Display names of the documents covered by this result
    pub docs: Vec<String>,

    /// `per_file` or `aggregate`
    pub mode: MultiMode,

    /// Profile name, if one was used
    pub profile: Option<String>,
}

/// Output of one provider call after validation and normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Normalized data (or raw provider output when no schema applies)
    pub data: Value,

    /// Call metadata
    pub meta: ResultMeta,
}

impl ExtractionResult {
    /// `{"data": ..., "meta": {...}}`
    pub fn to_value(&self) -> Value {
        json!({
            "data": self.data,
            "meta": {
                "model": self.meta.model,
                "usage": self.meta.usage,
                "docs": self.meta.docs,
                "mode": self.meta.mode.as_str(),
                "profile": self.meta.profile,
            },
        })
    }
}

/// Results of `both` mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiResult {
    /// One result per document, in document order
    pub per_file: Vec<ExtractionResult>,

    /// The aggregate result
    pub aggregate: Option<ExtractionResult>,
}

impl MultiResult {
    /// `{"per_file": [...], "aggregate": {...} | null}`
    pub fn to_value(&self) -> Value {
        json!({
            "per_file": self.per_file.iter().map(ExtractionResult::to_value).collect::<Vec<_>>(),
            "aggregate": self.aggregate.as_ref().map(ExtractionResult::to_value),
        })
    }
}

/// What `Extractor::extract` returns, shaped by the multi-mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionOutput {
    /// `per_file`: one result per document
    PerFile(Vec<ExtractionResult>),
    /// `both`: per-file results plus the aggregate
    Both(MultiResult),
    /// `aggregate`: a single result
    Aggregate(ExtractionResult),
}

impl ExtractionOutput {
    /// Serialized form: list, result object, or multi object
    pub fn to_value(&self) -> Value {
        match self {
            ExtractionOutput::PerFile(results) => {
                Value::Array(results.iter().map(ExtractionResult::to_value).collect())
            }
            ExtractionOutput::Aggregate(result) => result.to_value(),
            ExtractionOutput::Both(multi) => multi.to_value(),
        }
    }

    /// Every result, per-file ones first
    pub fn results(&self) -> Vec<&ExtractionResult> {
        match self {
            ExtractionOutput::PerFile(results) => results.iter().collect(),
            ExtractionOutput::Aggregate(result) => vec![result],
            ExtractionOutput::Both(multi) => multi.per_file.iter().chain(multi.aggregate.as_ref()).collect(),
        }
    }

    /// Model of the first result
    pub fn model(&self) -> Option<&str> {
        self.results().first().and_then(|r| r.meta.model.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(doc: &str, mode: MultiMode) -> ExtractionResult {
        ExtractionResult {
            data: json!({"name": doc}),
            meta: ResultMeta {
                model: Some("mock-model".to_string()),
                usage: None,
                docs: vec![doc.to_string()],
                mode,
                profile: None,
            },
        }
    }

    #[test]
    fn test_result_to_value() {
        let value = result("doc1", MultiMode::PerFile).to_value();
        assert_eq!(
            value,
            json!({
                "data": {"name": "doc1"},
                "meta": {"model": "mock-model", "usage": null, "docs": ["doc1"], "mode": "per_file", "profile": null}
            })
        );
    }

    #[test]
    fn test_output_round_trips_through_json() {
        let outputs = vec![
            ExtractionOutput::PerFile(vec![result("a", MultiMode::PerFile), result("b", MultiMode::PerFile)]),
            ExtractionOutput::Aggregate(result("a", MultiMode::Aggregate)),
            ExtractionOutput::Both(MultiResult {
                per_file: vec![result("a", MultiMode::PerFile)],
                aggregate: Some(result("a", MultiMode::Aggregate)),
            }),
        ];

        for output in outputs {
            let parsed: ExtractionOutput = serde_json::from_value(output.to_value()).unwrap();
            assert_eq!(parsed, output);
        }
    }

    #[test]
    fn test_results_and_model() {
        let output = ExtractionOutput::Both(MultiResult {
            per_file: vec![result("a", MultiMode::PerFile)],
            aggregate: Some(result("a", MultiMode::Aggregate)),
        });
        assert_eq!(output.results().len(), 2);
        assert_eq!(output.model(), Some("mock-model"));
        assert_eq!(ExtractionOutput::PerFile(vec![]).model(), None);
    }

    #[test]
    fn test_invalid_multi_name() {
        let err = ExtractRequest::new(vec![]).with_multi("sideways").unwrap_err();
        assert_eq!(err.message(), "Invalid multi-mode: sideways");
    }
}
