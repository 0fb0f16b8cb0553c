//! Configuration resolution for the CLI.
//!
//! Starts from the SDK configuration file and environment, then applies the
//! global command-line flags on top.

use crate::cli::Cli;
use crate::error::Result;
use docweave_sdk::{default_config_path, ClientMode, OutputFormat, SdkConfig};

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Client configuration after flag overrides
    pub client: SdkConfig,

    /// Output format
    pub format: OutputFormat,

    /// Enable colored output
    pub color: bool,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolve settings, reading environment values through `lookup`.
    pub fn resolve<F>(cli: &Cli, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // A missing file (or no home directory) means defaults.
        let path = cli.config.clone().or_else(default_config_path).unwrap_or_default();
        let base = SdkConfig::load_from(&path, lookup)?;

        let mode = cli.mode.map(|m| ClientMode::from(m).to_string());
        let mut client = base.merge_cli_overrides(mode.as_deref(), cli.endpoint.as_deref())?;
        if let Some(dir) = &cli.profile_dir {
            client.profile_dir = Some(dir.clone());
        }

        let format = cli.format.map(Into::into).unwrap_or(client.default_output_format);

        Ok(Self {
            client,
            format,
            color: !cli.no_color,
        })
    }
}
