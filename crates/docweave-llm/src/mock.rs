//! Scripted provider for deterministic tests
//!
//! Responses, failures and delays are keyed by the attachment names of a
//! call joined with `,`. A per-file call is keyed by its one document name,
//! so fan-out can be steered document by document. An aggregate call over
//! `a.txt` and `b.txt` is keyed `a.txt,b.txt` and never picks up what was
//! scripted for `a.txt` alone. Calls without attachments use the default
//! payload.

use crate::LlmError;
use async_trait::async_trait;
use docweave_domain::{GenerationRequest, ModelProvider, Result, StructuredResponse};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Separator between attachment names in a multi-document key
pub const KEY_SEPARATOR: &str = ",";

/// Model name reported by [`MockProvider`]
pub const MOCK_MODEL: &str = "mock-model";

/// What the mock saw for one call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Prompt body
    pub prompt: String,
    /// System instruction, if any
    pub system_instruction: Option<String>,
    /// Attachment names in order
    pub attachments: Vec<String>,
    /// Effective model option, if any
    pub model: Option<String>,
}

/// Mock model provider
///
/// Clones share state, so a test can hand one clone to the extractor and
/// inspect calls through another.
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: Value,
    responses: Arc<Mutex<HashMap<String, Value>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a mock returning `response` for every call
    pub fn new(response: Value) -> Self {
        Self {
            default_response: response,
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return `response` for calls keyed `doc`
    pub fn add_response(&self, doc: impl Into<String>, response: Value) {
        lock(&self.responses).insert(doc.into(), response);
    }

    /// Fail with `message` for calls keyed `doc`
    pub fn add_failure(&self, doc: impl Into<String>, message: impl Into<String>) {
        lock(&self.failures).insert(doc.into(), message.into());
    }

    /// Sleep before answering for calls keyed `doc`
    pub fn add_delay(&self, doc: impl Into<String>, delay: Duration) {
        lock(&self.delays).insert(doc.into(), delay);
    }

    /// Number of calls started so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.prompt.clone()).collect()
    }

    /// Every recorded call, in call order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(json!({}))
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_structured(&self, request: GenerationRequest<'_>) -> Result<StructuredResponse> {
        lock(&self.calls).push(RecordedCall {
            prompt: request.prompt.to_string(),
            system_instruction: request.system_instruction.map(str::to_string),
            attachments: request.attachments.iter().map(|a| a.name.clone()).collect(),
            model: request.model().map(str::to_string),
        });

        let key = (!request.attachments.is_empty()).then(|| {
            request
                .attachments
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(KEY_SEPARATOR)
        });
        let key = key.as_deref();

        let delay = key.and_then(|k| lock(&self.delays).get(k).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = key.and_then(|k| lock(&self.failures).get(k).cloned()) {
            return Err(LlmError::Other(message).into());
        }

        let data = key
            .and_then(|k| lock(&self.responses).get(k).cloned())
            .unwrap_or_else(|| self.default_response.clone());

        let usage = json!({
            "input_tokens": request.prompt.split_whitespace().count(),
            "output_tokens": data.to_string().len(),
        });

        Ok(StructuredResponse::new(data)
            .with_model(MOCK_MODEL)
            .with_usage(usage))
    }
}
