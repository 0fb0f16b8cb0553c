//! Prompt composition for extraction calls

use docweave_domain::{ExtractionProfile, ProfileMode};

/// System instruction used when the profile does not provide one
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Return JSON that matches the provided schema. Use null for missing values. Do not add extra text.";

/// Prompt body for describe-mode profiles without their own prompt
pub const DESCRIBE_PROMPT: &str = "Provide a concise description of the document content.";

/// Prompt body for the `extract_all` profile
pub const EXTRACT_ALL_PROMPT: &str = "Extract all salient structured data you can find.";

/// Fallback prompt body
pub const DEFAULT_PROMPT: &str =
    "Extract the requested structured fields. Use null for missing values.";

/// Appended to the body for aggregate calls
pub const AGGREGATE_NOTE: &str = "Multiple documents provided.";

/// Builds the prompt body and system instruction for one call
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    profile: Option<&'a ExtractionProfile>,
    aggregate: bool,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for an optional profile
    pub fn new(profile: Option<&'a ExtractionProfile>) -> Self {
        Self {
            profile,
            aggregate: false,
        }
    }

    /// Mark the call as covering several documents at once
    pub fn aggregate(mut self, aggregate: bool) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Profile system instruction, or the default one
    pub fn system_instruction(&self) -> &'a str {
        self.profile
            .and_then(|p| non_empty(p.system_instruction.as_deref()))
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Build the prompt body
    pub fn build(&self) -> String {
        let mut lines = vec![self.body()];
        if self.aggregate {
            lines.push(AGGREGATE_NOTE);
        }
        lines.join("\n\n")
    }

    fn body(&self) -> &'a str {
        let Some(profile) = self.profile else {
            return DEFAULT_PROMPT;
        };

        if let Some(prompt) = non_empty(profile.prompt.as_deref()) {
            return prompt;
        }
        if let Some(description) = non_empty(profile.description.as_deref()) {
            return description;
        }
        match profile.mode {
            ProfileMode::Describe => DESCRIBE_PROMPT,
            _ if profile.name == "extract_all" || profile.mode == ProfileMode::ExtractAll => {
                EXTRACT_ALL_PROMPT
            }
            _ => DEFAULT_PROMPT,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
