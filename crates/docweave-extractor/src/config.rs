//! Configuration for the Extractor

use docweave_domain::{MultiMode, ProviderOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model when neither profile nor caller names one. Matches the
/// default Ollama provider.
pub const DEFAULT_MODEL_NAME: &str = docweave_llm::ollama::DEFAULT_MODEL;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Compiled-default model name (lowest option layer)
    pub default_model: String,

    /// Compiled-default temperature
    pub default_temperature: f64,

    /// Compiled-default output token cap
    pub default_max_output_tokens: Option<u32>,

    /// Multi-mode used when neither the caller nor a profile picks one
    pub default_multi_mode: MultiMode,

    /// Upper bound on documents per extraction
    pub max_docs_per_extraction: usize,

    /// Per-file calls allowed in flight at once (1 = sequential)
    pub max_concurrent_calls: usize,

    /// Optional limit on a single provider call (seconds)
    pub call_timeout_secs: Option<u64>,

    /// Endpoint for the default Ollama provider
    pub ollama_endpoint: String,
}

impl ExtractorConfig {
    /// Bottom layer of the provider option merge
    pub fn default_options(&self) -> ProviderOptions {
        ProviderOptions {
            model_name: Some(self.default_model.clone()).filter(|m| !m.is_empty()),
            temperature: Some(self.default_temperature),
            max_output_tokens: self.default_max_output_tokens,
            top_p: None,
        }
    }

    /// Provider call timeout as a Duration
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_docs_per_extraction == 0 {
            return Err("max_docs_per_extraction must be greater than 0".to_string());
        }
        if self.max_concurrent_calls == 0 {
            return Err("max_concurrent_calls must be greater than 0".to_string());
        }
        if self.call_timeout_secs == Some(0) {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err("default_temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL_NAME.to_string(),
            default_temperature: 0.0,
            default_max_output_tokens: None,
            default_multi_mode: MultiMode::PerFile,
            max_docs_per_extraction: 16,
            max_concurrent_calls: 4,
            call_timeout_secs: None,
            ollama_endpoint: docweave_llm::ollama::DEFAULT_ENDPOINT.to_string(),
        }
    }
}
