//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docweave_domain::{MultiMode, ProviderOptions};
use docweave_extractor::ExtractionOutput;
use docweave_sdk::{DocweaveClient, ExtractRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the extract command.
///
/// Results go to stdout unless an output directory is given (or configured),
/// in which case each result is written to its own JSON file.
pub async fn execute_extract(
    args: ExtractArgs,
    client: &DocweaveClient,
    formatter: &Formatter,
    default_out_dir: Option<PathBuf>,
) -> Result<()> {
    let out_dir = args.out_dir.clone().or(default_out_dir);
    let request = build_request(args)?;
    debug!(files = request.files.len(), mode = %client.mode(), "Running extraction");

    let output = client.extract(request).await?;

    match out_dir {
        Some(dir) => {
            for path in write_results(&dir, &output)? {
                println!("{}", formatter.success(&format!("Wrote {}", path.display())));
            }
        }
        None => println!("{}", formatter.format_output(&output)?),
    }
    Ok(())
}

fn build_request(args: ExtractArgs) -> Result<ExtractRequest> {
    if args.schema.is_none() && args.profile.is_none() {
        return Err(CliError::InvalidInput(
            "Either --schema or --profile is required".to_string(),
        ));
    }
    if let Some(t) = args.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(CliError::InvalidInput(
                "Temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
    }

    let mut request = ExtractRequest::new(args.files);
    if let Some(path) = &args.schema {
        request = request.with_schema(load_schema_file(path)?);
    }
    if let Some(profile) = args.profile {
        request = request.with_profile(profile);
    }
    if let Some(multi) = args.multi {
        request = request.with_multi(multi.into());
    }

    let mut options = ProviderOptions::default();
    if let Some(model) = args.model {
        options = options.with_model(model);
    }
    if let Some(temperature) = args.temperature {
        options = options.with_temperature(temperature);
    }
    if let Some(max) = args.max_output_tokens {
        options = options.with_max_output_tokens(max);
    }
    if !options.is_empty() {
        request = request.with_options(options);
    }
    Ok(request)
}

/// Read a schema declaration from a JSON or YAML file.
///
/// `.yaml`/`.yml` files are read as YAML, `.json` as JSON; anything else is
/// tried as JSON first.
pub fn load_schema_file(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parsed: std::result::Result<Value, String> = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
        Some("json") => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&contents)
            .or_else(|_| serde_yaml::from_str(&contents))
            .map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| CliError::SchemaFile {
        path: path.display().to_string(),
        message,
    })
}

/// Write one `<stem>.json` per per-file result and `aggregate.json` for the
/// aggregate result. Repeated stems get a numeric suffix.
pub fn write_results(dir: &Path, output: &ExtractionOutput) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut written = Vec::new();
    for result in output.results() {
        let stem = match result.meta.mode {
            MultiMode::Aggregate => "aggregate".to_string(),
            _ => result
                .meta
                .docs
                .first()
                .map(|doc| file_stem(doc))
                .unwrap_or_else(|| "result".to_string()),
        };

        let count = seen.entry(stem.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            format!("{}.json", stem)
        } else {
            format!("{}_{}.json", stem, count)
        };

        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(&result.to_value())?)?;
        written.push(path);
    }
    Ok(written)
}

fn file_stem(doc: &str) -> String {
    Path::new(doc)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(doc)
        .to_string()
}
