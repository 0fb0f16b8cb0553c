//! Store-then-builtin profile resolution

use crate::builtin::{builtin_profile, BUILTIN_PROFILES};
use crate::convert::profile_from_data;
use crate::fs::FsCatalog;
use crate::CatalogError;
use docweave_domain::{DocweaveError, ExtractionProfile, ProfileResolver, Result};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Resolves names against the user store first, then the built-ins
pub struct LayeredResolver {
    store: Option<FsCatalog>,
}

impl LayeredResolver {
    /// Resolver over a user store
    pub fn new(store: FsCatalog) -> Self {
        Self { store: Some(store) }
    }

    /// Resolver with built-ins only
    pub fn builtin_only() -> Self {
        Self { store: None }
    }

    /// The user store, if any
    pub fn store(&self) -> Option<&FsCatalog> {
        self.store.as_ref()
    }
}

impl ProfileResolver for LayeredResolver {
    fn load(&self, name: &str) -> Result<ExtractionProfile> {
        if let Some(store) = &self.store {
            match store.load_profile(name, false) {
                Ok(data) => return profile_from_data(&data),
                Err(CatalogError::NotFound(reason)) => {
                    debug!(profile = name, reason = %reason, "Not in user store");
                }
                Err(err) => return Err(err.into()),
            }
        }
        builtin_profile(name.trim())
            .ok_or_else(|| DocweaveError::Profile(format!("Profile '{}' not found", name)))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = BUILTIN_PROFILES.iter().map(|n| n.to_string()).collect();
        if let Some(store) = &self.store {
            match store.list_profiles() {
                Ok(stored) => names.extend(stored),
                Err(err) => warn!(error = %err, "Failed to list user profiles"),
            }
        }
        Ok(names.into_iter().collect())
    }
}
