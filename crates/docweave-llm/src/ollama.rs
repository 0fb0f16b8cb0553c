//! Ollama Provider Implementation
//!
//! Talks to Ollama's `/api/chat` endpoint and asks for JSON output. When a
//! schema is known it is sent as the `format` constraint (sanitized JSON
//! Schema); otherwise plain JSON mode is requested.
//!
//! # Features
//!
//! - Configurable endpoint and default model
//! - Retry with exponential backoff on transport errors, 429 and 5xx
//! - Text attachments inlined into the user message, images sent base64
//!
//! # Examples
//!
//! ```no_run
//! use docweave_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1");
//! ```

use crate::parser::parse_json_content;
use crate::response_schema::sanitize_response_schema;
use crate::LlmError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use docweave_domain::{
    Attachment, GenerationRequest, ModelProvider, Result, StructuredResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Model asked for when neither the request nor the caller names one
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default timeout for a single chat request
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Ollama API provider
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: Value,
    #[serde(skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// `model` is used when the call options do not name one.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_secs(1),
        }
    }

    /// Create a provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the first backoff delay (doubled after each failed attempt)
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Default model
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages(request: &GenerationRequest<'_>) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(system) = request.system_instruction.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
                images: Vec::new(),
            });
        }

        let mut content = request.prompt.to_string();
        let mut images = Vec::new();
        for attachment in request.attachments {
            if is_image(attachment) {
                content.push_str(&format!("\n\n--- Document: {} (image attached) ---", attachment.name));
                images.push(BASE64.encode(attachment.content.as_bytes()));
            } else {
                content.push_str(&format!(
                    "\n\n--- Document: {} ---\n{}",
                    attachment.name,
                    attachment.content.as_text_lossy()
                ));
            }
        }

        messages.push(ChatMessage {
            role: "user",
            content,
            images,
        });
        messages
    }

    fn build_options(request: &GenerationRequest<'_>) -> Map<String, Value> {
        let mut options = Map::new();
        if let Some(opts) = request.options {
            if let Some(temperature) = opts.temperature {
                options.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(top_p) = opts.top_p {
                options.insert("top_p".to_string(), json!(top_p));
            }
            if let Some(max_tokens) = opts.max_output_tokens {
                options.insert("num_predict".to_string(), json!(max_tokens));
            }
        }
        options
    }

    async fn chat(&self, body: &ChatRequest<'_>) -> std::result::Result<ChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            debug!(url = %url, model = body.model, attempt = attempts + 1, "Sending chat request");
            match self.client.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ChatResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(body.model.to_string()));
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else if status.is_server_error() {
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    } else {
                        return Err(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: base, 2x base, 4x base, ...
                let delay = self.retry_base_delay * 2u32.pow(attempts - 1);
                warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Retrying Ollama request");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

fn is_image(attachment: &Attachment) -> bool {
    attachment
        .name
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate_structured(&self, request: GenerationRequest<'_>) -> Result<StructuredResponse> {
        let model = request.model().unwrap_or(self.model.as_str());
        let format = request
            .schema
            .map(|schema| sanitize_response_schema(&schema.to_json_schema()))
            .unwrap_or_else(|| json!("json"));

        let body = ChatRequest {
            model,
            messages: Self::build_messages(&request),
            stream: false,
            format,
            options: Self::build_options(&request),
        };

        let response = self.chat(&body).await?;
        let data = parse_json_content(&response.message.content)?;

        let usage = json!({
            "prompt_eval_count": response.prompt_eval_count,
            "eval_count": response.eval_count,
        });

        Ok(StructuredResponse {
            data,
            model: Some(response.model.unwrap_or_else(|| model.to_string())),
            usage: Some(usage),
        })
    }
}
