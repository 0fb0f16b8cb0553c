//! Profiles compiled into the binary

use docweave_domain::{ExtractionProfile, Field, FieldType, InternalSchema, ProfileMode};

/// Names of the built-in profiles, sorted
pub const BUILTIN_PROFILES: [&str; 4] = ["classify", "describe", "extract", "extract_all"];

const CLASSIFY_PROMPT: &str = "Classify the document. Return the best matching label, a confidence between 0 and 1, and a one-sentence rationale.";

/// Look up a built-in profile by name
pub fn builtin_profile(name: &str) -> Option<ExtractionProfile> {
    let profile = match name {
        // Schema comes from the caller
        "extract" => ExtractionProfile::new(name).with_mode(ProfileMode::Extract),
        "extract_all" => ExtractionProfile::new(name).with_mode(ProfileMode::ExtractAll),
        "describe" => ExtractionProfile::new(name)
            .with_mode(ProfileMode::Describe)
            .with_schema(InternalSchema {
                global_fields: vec![
                    Field::new("description", FieldType::String).required(),
                    Field::new("document_type", FieldType::String),
                    Field::new("language", FieldType::String),
                ],
                record_sets: Vec::new(),
            }),
        "classify" => ExtractionProfile::new(name)
            .with_mode(ProfileMode::Classify)
            .with_prompt(CLASSIFY_PROMPT)
            .with_schema(InternalSchema {
                global_fields: vec![
                    Field::new("label", FieldType::String).required(),
                    Field::new("confidence", FieldType::Number),
                    Field::new("rationale", FieldType::String),
                ],
                record_sets: Vec::new(),
            }),
        _ => return None,
    };
    Some(profile)
}
