//! SDK configuration.
//!
//! Read from `~/.docweave/config.toml` (settings may sit under a
//! `[docweave]` table or at top level), then `DOCWEAVE_MODE`,
//! `DOCWEAVE_ENDPOINT` and `DOCWEAVE_PROFILE_DIR` from the environment.

use crate::error::SdkError;
use docweave_catalog::{default_store_dir, CatalogConfig, FsCatalog, LayeredResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where extractions run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    /// In-process extractor
    #[default]
    Local,
    /// Docweave service over HTTP
    Remote,
}

impl FromStr for ClientMode {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ClientMode::Local),
            "remote" => Ok(ClientMode::Remote),
            other => Err(SdkError::Config(format!("Invalid mode: {}", other))),
        }
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Local => f.write_str("local"),
            ClientMode::Remote => f.write_str("remote"),
        }
    }
}

/// How results are rendered by front ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Readable summary
    #[default]
    Print,
    /// Serialized output
    Json,
}

impl FromStr for OutputFormat {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "print" => Ok(OutputFormat::Print),
            "json" => Ok(OutputFormat::Json),
            other => Err(SdkError::Config(format!("Unsupported output format: {}", other))),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SdkConfig {
    /// Local or remote execution
    pub mode: ClientMode,
    /// Service base URL for remote mode
    pub endpoint_url: Option<String>,
    /// Profile store root; `~/.docweave/profiles` when unset
    pub profile_dir: Option<PathBuf>,
    /// Default output format for front ends
    pub default_output_format: OutputFormat,
    /// Default directory for written results
    pub default_output_dir: Option<PathBuf>,
}

/// File layout, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSection {
    mode: Option<String>,
    endpoint: Option<String>,
    endpoint_url: Option<String>,
    profile_dir: Option<String>,
    default_output_format: Option<String>,
    default_output_dir: Option<String>,
}

/// `~/.docweave/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".docweave").join("config.toml"))
}

impl SdkConfig {
    /// Load from the default path and the process environment
    pub fn load() -> Result<Self, SdkError> {
        let lookup = |key: &str| std::env::var(key).ok();
        match default_config_path() {
            Some(path) => Self::load_from(&path, lookup),
            None => Self::from_sources(FileSection::default(), lookup),
        }
    }

    /// Load from `path` (missing file means defaults) with environment
    /// values read through `lookup`
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self, SdkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = if path.is_file() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                SdkError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            parse_section(&contents)?
        } else {
            FileSection::default()
        };
        Self::from_sources(section, lookup)
    }

    fn from_sources<F>(section: FileSection, lookup: F) -> Result<Self, SdkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match env("DOCWEAVE_MODE").or(section.mode) {
            Some(raw) => raw
                .parse()
                .map_err(|_| SdkError::Config(format!("Invalid DOCWEAVE_MODE: {}", raw)))?,
            None => ClientMode::default(),
        };
        let endpoint_url = env("DOCWEAVE_ENDPOINT")
            .or(section.endpoint)
            .or(section.endpoint_url);
        let profile_dir = env("DOCWEAVE_PROFILE_DIR")
            .or(section.profile_dir)
            .map(|dir| expand_home(&dir));
        let default_output_format = match section.default_output_format {
            Some(raw) => raw.parse()?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            mode,
            endpoint_url,
            profile_dir,
            default_output_format,
            default_output_dir: section.default_output_dir.map(|dir| expand_home(&dir)),
        })
    }

    /// Copy with command-line choices applied on top
    pub fn merge_cli_overrides(&self, mode: Option<&str>, endpoint: Option<&str>) -> Result<Self, SdkError> {
        let mut updated = self.clone();
        if let Some(mode) = mode.filter(|m| !m.is_empty()) {
            updated.mode = mode.parse()?;
        }
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            updated.endpoint_url = Some(endpoint.to_string());
        }
        Ok(updated)
    }

    /// Profile store location
    pub fn catalog_config(&self) -> Option<CatalogConfig> {
        self.profile_dir
            .clone()
            .or_else(default_store_dir)
            .map(CatalogConfig::new)
    }

    /// Resolver over the configured store and the built-ins
    pub fn resolver(&self) -> LayeredResolver {
        match self.catalog_config() {
            Some(catalog) => LayeredResolver::new(FsCatalog::new(catalog)),
            None => LayeredResolver::builtin_only(),
        }
    }
}

fn parse_section(contents: &str) -> Result<FileSection, SdkError> {
    let mut table: toml::Table = toml::from_str(contents)?;
    let section = match table.remove("docweave") {
        Some(toml::Value::Table(section)) => section,
        _ => table,
    };
    toml::Value::Table(section)
        .try_into()
        .map_err(|e| SdkError::Config(format!("Invalid config: {}", e)))
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}
