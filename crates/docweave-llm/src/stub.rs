//! Offline provider returning schema-shaped placeholders

use async_trait::async_trait;
use docweave_domain::{GenerationRequest, ModelProvider, Result, StructuredResponse};
use serde_json::{json, Map, Value};

/// Model name reported by [`StubProvider`]
pub const STUB_MODEL: &str = "stub-model";

/// Provider that never calls out
///
/// Every global field comes back `null` and every record set empty, which
/// always satisfies validation when no field is required. Useful for wiring
/// checks and for running the service without a model backend.
#[derive(Debug, Clone, Default)]
pub struct StubProvider;

impl StubProvider {
    /// Create a stub provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModelProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_structured(&self, request: GenerationRequest<'_>) -> Result<StructuredResponse> {
        let mut data = Map::new();
        if let Some(schema) = request.schema {
            for field in &schema.global_fields {
                data.insert(field.name.clone(), Value::Null);
            }
            for rs in &schema.record_sets {
                data.insert(rs.name.clone(), Value::Array(Vec::new()));
            }
        }

        Ok(StructuredResponse::new(Value::Object(data))
            .with_model(STUB_MODEL)
            .with_usage(json!({"note": "stub"})))
    }
}
