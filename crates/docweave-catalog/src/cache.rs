//! TTL cache for loaded profiles
//!
//! Construct one per process and share it by reference; it is safe for
//! concurrent callers.

use crate::clock::{Clock, SystemClock};
use crate::fs::ProfileData;
use crate::CatalogError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default entry lifetime
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

struct CacheEntry {
    profile: Arc<ProfileData>,
    fetched_at: Instant,
}

/// Profile cache keyed by backend and resolved path
pub struct ProfileCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ProfileCache {
    /// Cache on the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache on an injected clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached profile for `key`, or run `load` and store the
    /// result. `bypass` forces a reload and refreshes the entry.
    ///
    /// The lock is not held while `load` runs.
    pub fn get_or_load<F>(&self, key: &str, bypass: bool, load: F) -> Result<Arc<ProfileData>, CatalogError>
    where
        F: FnOnce() -> Result<ProfileData, CatalogError>,
    {
        let now = self.clock.now();
        if !bypass {
            if let Some(entry) = self.entries().get(key) {
                if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                    debug!(key, "Profile cache hit");
                    return Ok(entry.profile.clone());
                }
            }
        }

        debug!(key, bypass, "Profile cache miss");
        let profile = Arc::new(load()?);
        self.entries().insert(
            key.to_string(),
            CacheEntry {
                profile: profile.clone(),
                fetched_at: now,
            },
        );
        Ok(profile)
    }

    /// Drop one entry
    pub fn invalidate(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries (expired ones included)
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }
}
