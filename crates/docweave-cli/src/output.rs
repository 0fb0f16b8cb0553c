//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use docweave_catalog::ProfileMetadata;
use docweave_domain::{ExtractionProfile, MultiMode};
use docweave_extractor::{ExtractionOutput, ExtractionResult};
use docweave_sdk::OutputFormat;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction output.
    pub fn format_output(&self, output: &ExtractionOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&output.to_value())?),
            OutputFormat::Print => {
                let blocks = output
                    .results()
                    .into_iter()
                    .map(|result| self.format_result(result))
                    .collect::<Result<Vec<_>>>()?;
                Ok(blocks.join("\n\n"))
            }
        }
    }

    /// One result: a header line naming the documents, then the data.
    fn format_result(&self, result: &ExtractionResult) -> Result<String> {
        let label = match result.meta.mode {
            MultiMode::Aggregate => "aggregate",
            _ => "document",
        };
        let mut header = format!("{}: {}", label, result.meta.docs.join(", "));
        if let Some(model) = &result.meta.model {
            header.push_str(&format!(" (model: {})", model));
        }
        if let Some(profile) = &result.meta.profile {
            header.push_str(&format!(" [profile: {}]", profile));
        }

        Ok(format!(
            "{}\n{}",
            self.colorize(&header, "cyan"),
            serde_json::to_string_pretty(&result.data)?
        ))
    }

    /// Format a list of profile names.
    pub fn format_profiles(&self, names: &[String]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(names)?);
        }
        if names.is_empty() {
            return Ok(self.colorize("No profiles found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Profile"]);
        for name in names {
            builder.push_record([name.as_str()]);
        }
        Ok(self.table(builder))
    }

    /// Format stored profile bases with their versions.
    pub fn format_versions(&self, versions: &BTreeMap<String, Vec<String>>) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(versions)?);
        }
        if versions.is_empty() {
            return Ok(self.colorize("No stored profiles found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Profile", "Versions", "Latest"]);
        for (base, list) in versions {
            let latest = list.last().map(String::as_str).unwrap_or("-");
            builder.push_record([base.as_str(), &list.join(", "), latest]);
        }
        Ok(self.table(builder))
    }

    /// Format one resolved profile, with store metadata for stored profiles.
    pub fn format_profile(
        &self,
        profile: &ExtractionProfile,
        metadata: Option<&ProfileMetadata>,
    ) -> Result<String> {
        if self.format == OutputFormat::Json {
            let mut summary = profile_summary(profile);
            if let (Some(meta), Some(object)) = (metadata, summary.as_object_mut()) {
                object.insert("version".to_string(), json!(meta.version));
                object.insert("available_versions".to_string(), json!(meta.available_versions));
            }
            return Ok(serde_json::to_string_pretty(&summary)?);
        }

        let mut lines = vec![format!("Profile: {}", self.colorize(&profile.name, "green"))];
        match metadata {
            Some(meta) => {
                lines.push(format!("  Version: {}", meta.version));
                lines.push(format!("  Available: {}", meta.available_versions.join(", ")));
            }
            None => lines.push("  Source: built-in".to_string()),
        }
        lines.push(format!("  Mode: {}", profile.mode));
        lines.push(format!("  Multi: {}", profile.multi_mode_default));
        if let Some(description) = &profile.description {
            lines.push(format!("  Description: {}", description));
        }
        if let Some(model) = profile.provider_options.model() {
            lines.push(format!("  Model: {}", model));
        }
        match &profile.schema {
            Some(schema) => {
                for field in &schema.global_fields {
                    let marker = if field.required { " (required)" } else { "" };
                    lines.push(format!("  Field: {} {}{}", field.name, field.field_type, marker));
                }
                for rs in &schema.record_sets {
                    lines.push(format!("  Record set: {} ({} fields)", rs.name, rs.fields.len()));
                }
            }
            None => lines.push("  Schema: none".to_string()),
        }
        Ok(lines.join("\n"))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// `{name, mode, multi, description, model, fields}`
pub fn profile_summary(profile: &ExtractionProfile) -> Value {
    let fields: Vec<&str> = profile
        .schema
        .iter()
        .flat_map(|s| s.global_fields.iter().map(|f| f.name.as_str()))
        .collect();
    json!({
        "name": profile.name,
        "mode": profile.mode.as_str(),
        "multi": profile.multi_mode_default.as_str(),
        "description": profile.description,
        "model": profile.provider_options.model(),
        "fields": fields,
    })
}
