//! Generation settings passed to providers

use serde::{Deserialize, Serialize};

/// Optional generation settings
///
/// Options are layered: compiled defaults, then profile defaults, then
/// per-call overrides. Each layer only replaces the fields it sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// Model identifier (empty strings are treated as unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Output token cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Nucleus sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl ProviderOptions {
    /// Set the model name
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token cap
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Set top-p
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Model name, ignoring empty strings
    pub fn model(&self) -> Option<&str> {
        self.model_name.as_deref().filter(|m| !m.is_empty())
    }

    /// Right-biased merge: fields set in `overrides` win, others are kept.
    pub fn merged(&self, overrides: &ProviderOptions) -> ProviderOptions {
        ProviderOptions {
            model_name: overrides
                .model()
                .or_else(|| self.model())
                .map(str::to_string),
            temperature: overrides.temperature.or(self.temperature),
            max_output_tokens: overrides.max_output_tokens.or(self.max_output_tokens),
            top_p: overrides.top_p.or(self.top_p),
        }
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.model().is_none()
            && self.temperature.is_none()
            && self.max_output_tokens.is_none()
            && self.top_p.is_none()
    }
}
