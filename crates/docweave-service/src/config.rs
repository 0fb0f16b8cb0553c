//! Configuration for the extraction service.
//!
//! Settings come from an optional TOML file, then `DOCWEAVE_*` environment
//! overrides. Extractor tuning lives in the `[extractor]` table.

use docweave_catalog::{default_store_dir, CatalogConfig, DEFAULT_CACHE_TTL_SECS};
use docweave_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Service configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Environment override could not be parsed
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },

    /// Settings are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which model backend serves extraction calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Schema-shaped placeholder output, no model involved
    Stub,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "stub" => Ok(ProviderKind::Stub),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ollama => f.write_str("ollama"),
            ProviderKind::Stub => f.write_str("stub"),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Model backend
    pub provider: ProviderKind,

    /// Profile store root; `~/.docweave/profiles` when unset
    pub profile_dir: Option<PathBuf>,

    /// Profile cache lifetime in seconds
    pub cache_ttl_secs: u64,

    /// Extractor settings
    pub extractor: ExtractorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            provider: ProviderKind::default(),
            profile_dir: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// File (if given) or defaults, then process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCWEAVE_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(address) = get("DOCWEAVE_BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(port) = get("DOCWEAVE_BIND_PORT") {
            self.bind_port = parse_value("DOCWEAVE_BIND_PORT", &port)?;
        }
        if let Some(model) = get("DOCWEAVE_DEFAULT_MODEL") {
            self.extractor.default_model = model;
        }
        if let Some(temperature) = get("DOCWEAVE_DEFAULT_TEMPERATURE") {
            self.extractor.default_temperature =
                parse_value("DOCWEAVE_DEFAULT_TEMPERATURE", &temperature)?;
        }
        if let Some(dir) = get("DOCWEAVE_PROFILE_DIR") {
            self.profile_dir = Some(PathBuf::from(dir));
        }
        if let Some(endpoint) = get("DOCWEAVE_OLLAMA_ENDPOINT") {
            self.extractor.ollama_endpoint = endpoint;
        }
        if let Some(provider) = get("DOCWEAVE_PROVIDER") {
            self.provider = parse_value("DOCWEAVE_PROVIDER", &provider)?;
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        self.extractor.validate().map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Catalog settings for the profile store, if a root can be determined
    pub fn catalog_config(&self) -> Option<CatalogConfig> {
        self.profile_dir
            .clone()
            .or_else(default_store_dir)
            .map(|root| CatalogConfig::new(root).with_cache_ttl_secs(self.cache_ttl_secs))
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_domain::MultiMode;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.cache_ttl_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            provider = "stub"
            profile_dir = "/srv/profiles"

            [extractor]
            default_model = "llama3.1"
            default_multi_mode = "both"
            max_concurrent_calls = 8
        "#;

        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.provider, ProviderKind::Stub);
        assert_eq!(config.profile_dir, Some(PathBuf::from("/srv/profiles")));
        assert_eq!(config.extractor.default_model, "llama3.1");
        assert_eq!(config.extractor.default_multi_mode, MultiMode::Both);
        assert_eq!(config.extractor.max_concurrent_calls, 8);
        assert_eq!(config.extractor.max_docs_per_extraction, 16);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(env(&[
                ("DOCWEAVE_BIND_ADDRESS", "0.0.0.0"),
                ("DOCWEAVE_BIND_PORT", "9100"),
                ("DOCWEAVE_DEFAULT_MODEL", "qwen2.5"),
                ("DOCWEAVE_DEFAULT_TEMPERATURE", "0.3"),
                ("DOCWEAVE_PROFILE_DIR", "/tmp/profiles"),
                ("DOCWEAVE_OLLAMA_ENDPOINT", "http://ollama:11434"),
                ("DOCWEAVE_PROVIDER", "STUB"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.extractor.default_model, "qwen2.5");
        assert_eq!(config.extractor.default_temperature, 0.3);
        assert_eq!(config.profile_dir, Some(PathBuf::from("/tmp/profiles")));
        assert_eq!(config.extractor.ollama_endpoint, "http://ollama:11434");
        assert_eq!(config.provider, ProviderKind::Stub);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(env(&[("DOCWEAVE_BIND_PORT", "  ")]))
            .unwrap();
        assert_eq!(config.bind_port, 8080);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(env(&[("DOCWEAVE_BIND_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DOCWEAVE_BIND_PORT"));

        let err = config
            .apply_overrides(env(&[("DOCWEAVE_PROVIDER", "gemini")]))
            .unwrap_err();
        assert!(err.to_string().contains("DOCWEAVE_PROVIDER"));
    }

    #[test]
    fn test_catalog_config_uses_profile_dir() {
        let config = ServiceConfig {
            profile_dir: Some(PathBuf::from("/srv/docweave")),
            cache_ttl_secs: 30,
            ..ServiceConfig::default()
        };
        let catalog = config.catalog_config().unwrap();
        assert_eq!(catalog.root_dir, PathBuf::from("/srv/docweave"));
        assert_eq!(catalog.cache_ttl_secs, 30);
    }
}
