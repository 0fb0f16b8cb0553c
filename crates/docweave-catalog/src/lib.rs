//! Docweave Profile Catalog
//!
//! Versioned extraction profiles stored on the filesystem, a TTL cache in
//! front of them, compiled-in built-in profiles, and a resolver that layers
//! the two.
//!
//! # Layout
//!
//! ```text
//! <root>/<prefix>/<profile_base>/<version>/
//!     prompt.txt
//!     system_instruction.txt
//!     schema.json
//!     [config.yaml]
//! ```
//!
//! A path without a version segment resolves to the latest version
//! (`v10` sorts after `v2`). Resolved paths always include the version.

#![warn(missing_docs)]

pub mod builtin;
pub mod cache;
pub mod clock;
pub mod convert;
pub mod fs;
pub mod resolver;

use docweave_domain::DocweaveError;
use thiserror::Error;

pub use builtin::{builtin_profile, BUILTIN_PROFILES};
pub use cache::{ProfileCache, DEFAULT_CACHE_TTL_SECS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use convert::profile_from_data;
pub use fs::{default_store_dir, CatalogConfig, FsCatalog, ProfileData, ProfileFileInfo, ProfileMetadata};
pub use resolver::LayeredResolver;

/// Errors raised by the catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No such profile, version or file
    #[error("{0}")]
    NotFound(String),

    /// Path escapes the catalog root or is otherwise unusable
    #[error("Invalid profile path: {0}")]
    InvalidPath(String),

    /// Filesystem failure other than not-found
    #[error("I/O error: {0}")]
    Io(String),

    /// Profile files exist but cannot be interpreted
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

impl From<CatalogError> for DocweaveError {
    fn from(err: CatalogError) -> Self {
        DocweaveError::Profile(err.to_string())
    }
}
