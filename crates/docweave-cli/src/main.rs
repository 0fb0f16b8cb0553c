//! Docweave CLI - Extract structured data from documents.

use anyhow::Context;
use clap::Parser;
use docweave_cli::commands;
use docweave_cli::{Cli, Command, Formatter, Settings};
use docweave_sdk::{DocweaveClient, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::from_cli(&cli).context("Failed to load configuration")?;
    let formatter = Formatter::new(settings.format, settings.color);

    // Written results only default to the configured directory for JSON output.
    let default_out_dir = settings
        .client
        .default_output_dir
        .clone()
        .filter(|_| settings.format == OutputFormat::Json);

    let client = DocweaveClient::new(settings.client)?;

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &client, &formatter, default_out_dir).await?;
        }
        Command::Profiles(args) => {
            commands::execute_profiles(args, &client, &formatter).await?;
        }
    }

    Ok(())
}
