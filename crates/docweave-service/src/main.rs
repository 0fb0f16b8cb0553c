//! Docweave service binary
//!
//! Starts the HTTP extraction service.

use docweave_service::{config::ServiceConfig, start_server, ServiceError};
use std::env;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServiceError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ServiceConfig::load(Some(Path::new(&args[2])))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        ServiceConfig::load(None)?
    };

    start_server(config).await
}

fn print_help() {
    println!("Docweave Service - Document extraction over HTTP");
    println!();
    println!("USAGE:");
    println!("    docweave-service [--config <path-to-config.toml>]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DOCWEAVE_BIND_ADDRESS        Bind address (default 127.0.0.1)");
    println!("    DOCWEAVE_BIND_PORT           Bind port (default 8080)");
    println!("    DOCWEAVE_PROVIDER            ollama | stub");
    println!("    DOCWEAVE_DEFAULT_MODEL       Model used when none is requested");
    println!("    DOCWEAVE_DEFAULT_TEMPERATURE Default sampling temperature");
    println!("    DOCWEAVE_OLLAMA_ENDPOINT     Ollama base URL");
    println!("    DOCWEAVE_PROFILE_DIR         Profile store root");
    println!("    RUST_LOG                     Log filter (default info)");
    println!();
}
