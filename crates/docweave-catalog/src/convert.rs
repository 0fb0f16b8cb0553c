//! Stored profile to ExtractionProfile

use crate::fs::ProfileData;
use docweave_domain::{
    parse_schema, DocweaveError, ExtractionProfile, MultiMode, ProfileMode, ProviderOptions, Result,
};
use serde_json::{Map, Value};

/// Build an [`ExtractionProfile`] from catalog data.
///
/// Recognized `config.yaml` keys: `mode`, `multi_doc_behavior` (or `multi`),
/// `description` and `generation_config`. The whole config is also kept in
/// `params`. Schema errors surface as schema errors; bad modes as profile
/// errors.
pub fn profile_from_data(data: &ProfileData) -> Result<ExtractionProfile> {
    let config = &data.config;

    let mode = match config_str(config, "mode") {
        Some(raw) => raw.parse::<ProfileMode>()?,
        None => ProfileMode::default(),
    };
    let multi = config_str(config, "multi_doc_behavior").or_else(|| config_str(config, "multi"));
    let multi_mode = match multi {
        Some(raw) => raw
            .parse::<MultiMode>()
            .map_err(|e| DocweaveError::Profile(format!("{}: {}", data.path, e.message())))?,
        None => MultiMode::default(),
    };

    let schema = parse_schema(&data.schema)?;

    let mut profile = ExtractionProfile::new(data.path.clone())
        .with_schema(schema)
        .with_mode(mode)
        .with_multi_mode(multi_mode)
        .with_options(generation_options(config)?)
        .with_prompt(data.prompt.clone())
        .with_system_instruction(data.system_instruction.clone());
    if let Some(description) = config_str(config, "description") {
        profile = profile.with_description(description);
    }
    profile.params = config.clone();
    Ok(profile)
}

fn config_str<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn generation_options(config: &Map<String, Value>) -> Result<ProviderOptions> {
    let mut options = ProviderOptions::default();
    let Some(generation) = config.get("generation_config").and_then(Value::as_object) else {
        return Ok(options);
    };

    if let Some(model) = config_str(generation, "model").or_else(|| config_str(generation, "model_name")) {
        options = options.with_model(model);
    }
    if let Some(temperature) = generation.get("temperature").and_then(Value::as_f64) {
        options = options.with_temperature(temperature);
    }
    if let Some(top_p) = generation.get("top_p").and_then(Value::as_f64) {
        options = options.with_top_p(top_p);
    }
    if let Some(raw) = generation.get("max_output_tokens").filter(|v| !v.is_null()) {
        let tokens = raw
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| DocweaveError::Profile(format!("Invalid max_output_tokens: {}", raw)))?;
        options = options.with_max_output_tokens(tokens);
    }
    Ok(options)
}
