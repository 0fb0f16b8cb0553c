//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use docweave_domain::MultiMode;
use docweave_sdk::{ClientMode, OutputFormat};
use std::path::PathBuf;

/// Docweave CLI - Extract structured data from documents.
#[derive(Debug, Parser)]
#[command(name = "docweave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run locally or against a service
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeArg>,

    /// Service base URL (remote mode)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Profile store root
    #[arg(long, global = true)]
    pub profile_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Readable summary (default)
    Print,
    /// Serialized JSON
    Json,
}

/// Execution mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    /// In-process extractor
    Local,
    /// Docweave service over HTTP
    Remote,
}

/// Multi-document mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MultiArg {
    /// One call per document
    #[value(name = "per_file")]
    PerFile,
    /// One call over every document
    Aggregate,
    /// Per-file calls, then one aggregate call
    Both,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract structured data from documents
    Extract(ExtractArgs),

    /// Inspect extraction profiles
    Profiles(ProfilesArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document paths or http(s) URLs, in order
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Schema file (JSON or YAML)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Profile name, optionally with a version (e.g. invoices/v2)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Multi-document mode
    #[arg(short, long, value_enum)]
    pub multi: Option<MultiArg>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Output token cap
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Write one JSON file per result into this directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

/// Arguments for profile inspection.
#[derive(Debug, Parser)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub action: ProfilesAction,
}

/// Profile inspection actions.
#[derive(Debug, Subcommand)]
pub enum ProfilesAction {
    /// List profile names
    List {
        /// Show the versions of stored profiles
        #[arg(long)]
        include_versions: bool,

        /// Only profiles under this path
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show one profile
    Show {
        /// Profile name
        name: String,
    },

    /// List the versions of a stored profile
    Versions {
        /// Profile base path
        base: String,
    },
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Print => OutputFormat::Print,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

impl From<ModeArg> for ClientMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => ClientMode::Local,
            ModeArg::Remote => ClientMode::Remote,
        }
    }
}

impl From<MultiArg> for MultiMode {
    fn from(multi: MultiArg) -> Self {
        match multi {
            MultiArg::PerFile => MultiMode::PerFile,
            MultiArg::Aggregate => MultiMode::Aggregate,
            MultiArg::Both => MultiMode::Both,
        }
    }
}
