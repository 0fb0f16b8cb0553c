//! Extraction profiles and the enums they carry

use crate::error::DocweaveError;
use crate::options::ProviderOptions;
use crate::schema::InternalSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// How a multi-document request is dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMode {
    /// One provider call per document
    #[default]
    PerFile,
    /// One provider call with every document attached
    Aggregate,
    /// Per-file calls followed by one aggregate call
    Both,
}

impl MultiMode {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiMode::PerFile => "per_file",
            MultiMode::Aggregate => "aggregate",
            MultiMode::Both => "both",
        }
    }
}

impl FromStr for MultiMode {
    type Err = DocweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_file" => Ok(MultiMode::PerFile),
            "aggregate" => Ok(MultiMode::Aggregate),
            "both" => Ok(MultiMode::Both),
            other => Err(DocweaveError::Extraction(format!(
                "Invalid multi-mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MultiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a profile asks the model to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// Fill the declared fields
    #[default]
    Extract,
    /// Extract everything salient
    ExtractAll,
    /// Summarize the document
    Describe,
    /// Assign a category
    Classify,
}

impl ProfileMode {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileMode::Extract => "extract",
            ProfileMode::ExtractAll => "extract_all",
            ProfileMode::Describe => "describe",
            ProfileMode::Classify => "classify",
        }
    }
}

impl FromStr for ProfileMode {
    type Err = DocweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract" => Ok(ProfileMode::Extract),
            "extract_all" => Ok(ProfileMode::ExtractAll),
            "describe" => Ok(ProfileMode::Describe),
            "classify" => Ok(ProfileMode::Classify),
            other => Err(DocweaveError::Profile(format!(
                "Invalid profile mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reusable bundle of schema, prompts and option defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionProfile {
    /// Profile name (catalog path for stored profiles)
    pub name: String,

    /// Target shape, if the profile declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<InternalSchema>,

    /// Task mode
    #[serde(default)]
    pub mode: ProfileMode,

    /// Multi-document policy used when the caller does not pick one
    #[serde(default)]
    pub multi_mode_default: MultiMode,

    /// Free-text description (also a prompt fallback)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Option defaults layered under per-call overrides
    #[serde(default)]
    pub provider_options: ProviderOptions,

    /// Prompt body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// System instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Free-form parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl ExtractionProfile {
    /// Create an empty profile
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the schema
    pub fn with_schema(mut self, schema: InternalSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the task mode
    pub fn with_mode(mut self, mode: ProfileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the default multi-mode
    pub fn with_multi_mode(mut self, multi_mode: MultiMode) -> Self {
        self.multi_mode_default = multi_mode;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set option defaults
    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.provider_options = options;
        self
    }

    /// Set the prompt body
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_multi_mode_parse() {
        assert_eq!("per_file".parse::<MultiMode>().unwrap(), MultiMode::PerFile);
        assert_eq!("both".parse::<MultiMode>().unwrap(), MultiMode::Both);

        let err = "sideways".parse::<MultiMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert_eq!(err.message(), "Invalid multi-mode: sideways");
    }

    #[test]
    fn test_profile_mode_parse() {
        assert_eq!(
            "extract_all".parse::<ProfileMode>().unwrap(),
            ProfileMode::ExtractAll
        );
        assert_eq!(
            "nope".parse::<ProfileMode>().unwrap_err().kind(),
            ErrorKind::Profile
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_value(MultiMode::PerFile).unwrap(), "per_file");
        let mode: ProfileMode = serde_json::from_value("describe".into()).unwrap();
        assert_eq!(mode, ProfileMode::Describe);
    }

    #[test]
    fn test_profile_defaults() {
        let profile = ExtractionProfile::new("invoices/v1").with_prompt("Read the invoice.");
        assert_eq!(profile.mode, ProfileMode::Extract);
        assert_eq!(profile.multi_mode_default, MultiMode::PerFile);
        assert!(profile.schema.is_none());
        assert_eq!(profile.prompt.as_deref(), Some("Read the invoice."));
    }
}
