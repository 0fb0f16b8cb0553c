//! Docweave Rust SDK
//!
//! Runs extractions either in-process (local mode) or against a Docweave
//! service (remote mode), with the same request and result types.
//!
//! # Example
//!
//! ```no_run
//! use docweave_sdk::{DocweaveClient, ExtractRequest, SdkConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), docweave_sdk::SdkError> {
//! let client = DocweaveClient::new(SdkConfig::load()?)?;
//!
//! let request = ExtractRequest::new(["invoice.pdf"])
//!     .with_schema(json!({"type": "object", "properties": {"total": {"type": "number"}}}));
//! let output = client.extract(request).await?;
//! println!("{}", output.to_value());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;

pub use client::{DocweaveClient, ExtractRequest, REMOTE_TIMEOUT_SECS};
pub use config::{default_config_path, ClientMode, OutputFormat, SdkConfig};
pub use error::SdkError;
