//! Filesystem-backed profile catalog

use crate::cache::{ProfileCache, DEFAULT_CACHE_TTL_SECS};
use crate::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, info};

const PROMPT_FILE: &str = "prompt.txt";
const SYSTEM_FILE: &str = "system_instruction.txt";
const SCHEMA_FILE: &str = "schema.json";
const CONFIG_FILE: &str = "config.yaml";
const REQUIRED_FILES: [&str; 3] = [PROMPT_FILE, SYSTEM_FILE, SCHEMA_FILE];

/// User-level store, `~/.docweave/profiles`
pub fn default_store_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".docweave").join("profiles"))
}

/// Where the catalog lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Store root
    pub root_dir: PathBuf,
    /// Directory under the root holding profile bases
    pub prefix: String,
    /// Cache entry lifetime in seconds
    pub cache_ttl_secs: u64,
}

impl CatalogConfig {
    /// Catalog at `root_dir` with the default prefix and TTL
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the cache TTL
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// Directory that profile paths are relative to
    pub fn base_dir(&self) -> PathBuf {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            self.root_dir.clone()
        } else {
            self.root_dir.join(prefix)
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            prefix: "profiles".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Size and modification time of one profile file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFileInfo {
    /// File name within the version directory
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub updated: Option<u64>,
}

/// Raw contents of one profile version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Resolved path, version included
    pub path: String,
    /// Contents of prompt.txt
    pub prompt: String,
    /// Contents of system_instruction.txt
    pub system_instruction: String,
    /// Parsed schema.json
    pub schema: Value,
    /// Parsed config.yaml, empty when absent or not a mapping
    pub config: Map<String, Value>,
    /// Content hash of the required files
    pub version: String,
    /// Per-file info
    pub files: Vec<ProfileFileInfo>,
    /// Sibling versions, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_versions: Option<Vec<String>>,
}

/// Descriptive view of a profile without its contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Path as the caller wrote it
    pub requested_path: String,
    /// Resolved path, version included
    pub path: String,
    /// Content hash of the required files
    pub version: String,
    /// Per-file info
    pub files: Vec<ProfileFileInfo>,
    /// Sibling versions
    pub available_versions: Vec<String>,
    /// Parsed config.yaml
    pub config: Map<String, Value>,
}

/// Profile catalog over a directory tree
pub struct FsCatalog {
    config: CatalogConfig,
    cache: Arc<ProfileCache>,
}

impl FsCatalog {
    /// Catalog with its own cache
    pub fn new(config: CatalogConfig) -> Self {
        let cache = ProfileCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self::with_cache(config, Arc::new(cache))
    }

    /// Catalog sharing an existing cache. Only share a cache between
    /// catalogs over the same root; keys carry the resolved path only.
    pub fn with_cache(config: CatalogConfig, cache: Arc<ProfileCache>) -> Self {
        Self { config, cache }
    }

    /// Configuration in use
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Cache in use
    pub fn cache(&self) -> &Arc<ProfileCache> {
        &self.cache
    }

    /// Profile bases with their versions, optionally limited to bases under
    /// `prefix_filter`
    pub fn list_profiles_with_versions(
        &self,
        prefix_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>, CatalogError> {
        let base_dir = self.config.base_dir();
        let search_dir = match prefix_filter.map(normalize_path).transpose()? {
            Some(filter) if !filter.is_empty() => base_dir.join(filter),
            _ => base_dir.clone(),
        };

        let mut schema_files = Vec::new();
        collect_schema_files(&search_dir, &mut schema_files)?;

        let mut listing: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in schema_files {
            let Ok(relative) = file.strip_prefix(&base_dir) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.len() < 3 {
                continue;
            }
            let base = parts[..parts.len() - 2].join("/");
            let version = parts[parts.len() - 2].clone();
            listing.entry(base).or_default().push(version);
        }

        for versions in listing.values_mut() {
            versions.sort_by(|a, b| compare_versions(a, b));
            versions.dedup();
        }
        Ok(listing)
    }

    /// Profile bases, sorted
    pub fn list_profiles(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.list_profiles_with_versions(None)?.into_keys().collect())
    }

    /// Versions of one base, oldest first
    pub fn list_profile_versions(&self, base: &str) -> Result<Vec<String>, CatalogError> {
        let base = normalize_path(base)?;
        if base.is_empty() {
            return Ok(Vec::new());
        }
        let mut listing = self.list_profiles_with_versions(Some(&base))?;
        Ok(listing.remove(&base).unwrap_or_default())
    }

    /// Resolve `path` to a concrete version. Returns the resolved path and,
    /// when `collect_versions` is set, the sibling versions.
    pub fn resolve_profile_path(
        &self,
        path: &str,
        collect_versions: bool,
    ) -> Result<(String, Option<Vec<String>>), CatalogError> {
        let normalized = normalize_path(path)?;
        let dir = self.config.base_dir().join(&normalized);

        if !normalized.is_empty() && REQUIRED_FILES.iter().all(|f| dir.join(f).is_file()) {
            let versions = if collect_versions {
                let parent = normalized.rsplit_once('/').map(|(base, _)| base).unwrap_or("");
                Some(self.list_profile_versions(parent)?)
            } else {
                None
            };
            return Ok((normalized, versions));
        }

        let versions = self.list_profile_versions(&normalized)?;
        let Some(latest) = versions.last() else {
            return Err(CatalogError::NotFound(format!(
                "No versions found for profile path '{}'",
                normalized
            )));
        };
        let resolved = format!("{}/{}", normalized, latest);
        debug!(requested = %normalized, resolved = %resolved, "Resolved latest profile version");
        Ok((resolved, collect_versions.then_some(versions)))
    }

    /// Load a profile through the cache
    pub fn load_profile(&self, path: &str, bypass_cache: bool) -> Result<Arc<ProfileData>, CatalogError> {
        let (resolved, _) = self.resolve_profile_path(path, false)?;
        let key = format!("fs:{}", resolved);
        self.cache
            .get_or_load(&key, bypass_cache, || self.read_profile(&resolved, None))
    }

    /// Metadata for a profile, read fresh from disk
    pub fn profile_metadata(&self, path: &str) -> Result<ProfileMetadata, CatalogError> {
        let (resolved, versions) = self.resolve_profile_path(path, true)?;
        let key = format!("fs:{}", resolved);
        let data = self
            .cache
            .get_or_load(&key, true, || self.read_profile(&resolved, versions.clone()))?;

        Ok(ProfileMetadata {
            requested_path: path.to_string(),
            path: data.path.clone(),
            version: data.version.clone(),
            files: data.files.clone(),
            available_versions: versions.unwrap_or_default(),
            config: data.config.clone(),
        })
    }

    fn read_profile(
        &self,
        resolved: &str,
        available_versions: Option<Vec<String>>,
    ) -> Result<ProfileData, CatalogError> {
        let dir = self.config.base_dir().join(resolved);

        let prompt = read_text(&dir.join(PROMPT_FILE))?;
        let system_instruction = read_text(&dir.join(SYSTEM_FILE))?;
        let schema_text = read_text(&dir.join(SCHEMA_FILE))?;
        let schema: Value = serde_json::from_str(&schema_text).map_err(|e| {
            CatalogError::InvalidProfile(format!("{}/{}: {}", resolved, SCHEMA_FILE, e))
        })?;

        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            read_config(&config_path)?
        } else {
            Map::new()
        };

        let mut files: Vec<ProfileFileInfo> = REQUIRED_FILES
            .iter()
            .map(|name| file_info(&dir, name))
            .collect();
        if config_path.is_file() {
            files.push(file_info(&dir, CONFIG_FILE));
        }

        info!(profile = %resolved, "Loaded profile from catalog");
        Ok(ProfileData {
            path: resolved.to_string(),
            prompt,
            system_instruction,
            schema,
            config,
            version: version_hash(&dir),
            files,
            available_versions,
        })
    }
}

/// Trim surrounding whitespace and slashes, reject anything that could
/// leave the catalog root
fn normalize_path(path: &str) -> Result<String, CatalogError> {
    let normalized = path.trim().trim_matches('/');
    let escapes = Path::new(normalized)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || normalized.contains('\\') {
        return Err(CatalogError::InvalidPath(path.to_string()));
    }
    Ok(normalized.to_string())
}

/// `vN` versions first by number, anything else lexicographically after
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (numbered_version(a), numbered_version(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numbered_version(version: &str) -> Option<u64> {
    let digits = version.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn collect_schema_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CatalogError::Io(format!("{}: {}", dir.display(), e))),
    };
    for entry in entries {
        let entry = entry.map_err(|e| CatalogError::Io(format!("{}: {}", dir.display(), e)))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
        if file_type.is_dir() {
            collect_schema_files(&path, out)?;
        } else if file_type.is_file() && entry.file_name() == SCHEMA_FILE {
            out.push(path);
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CatalogError::NotFound(format!("File not found: {}", path.display())),
        _ => CatalogError::Io(format!("{}: {}", path.display(), e)),
    })
}

/// Invalid YAML or a non-mapping document yields an empty config
fn read_config(path: &Path) -> Result<Map<String, Value>, CatalogError> {
    let text = read_text(path)?;
    match serde_yaml::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring unreadable profile config");
            Ok(Map::new())
        }
    }
}

fn modified_since_epoch(meta: &std::fs::Metadata) -> Option<Duration> {
    meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()
}

fn file_info(dir: &Path, name: &str) -> ProfileFileInfo {
    let meta = std::fs::metadata(dir.join(name)).ok();
    ProfileFileInfo {
        name: name.to_string(),
        size: meta.as_ref().map(|m| m.len()).unwrap_or(0),
        updated: meta.as_ref().and_then(modified_since_epoch).map(|d| d.as_secs()),
    }
}

/// First 16 hex chars of SHA-256 over `path:mtime_ns:size` of the
/// required files, joined by `|`
fn version_hash(dir: &Path) -> String {
    let parts: Vec<String> = REQUIRED_FILES
        .iter()
        .map(|name| {
            let path = dir.join(name);
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            match std::fs::metadata(&path) {
                Ok(meta) => {
                    let mtime_ns = modified_since_epoch(&meta).map(|d| d.as_nanos()).unwrap_or(0);
                    format!("{}:{}:{}", path.display(), mtime_ns, meta.len())
                }
                Err(_) => format!("{}:0:0", path.display()),
            }
        })
        .collect();

    let digest = Sha256::digest(parts.join("|").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_profile(root: &Path, path: &str, prompt: &str, config: Option<&str>) {
        let dir = root.join("profiles").join(path);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PROMPT_FILE), prompt).unwrap();
        fs::write(dir.join(SYSTEM_FILE), "Be precise.").unwrap();
        fs::write(
            dir.join(SCHEMA_FILE),
            r#"{"type":"object","properties":{"total":{"type":"number"}},"required":["total"]}"#,
        )
        .unwrap();
        if let Some(config) = config {
            fs::write(dir.join(CONFIG_FILE), config).unwrap();
        }
    }

    fn catalog(root: &TempDir) -> FsCatalog {
        FsCatalog::new(CatalogConfig::new(root.path()))
    }

    #[test]
    fn test_version_ordering() {
        let mut versions = vec!["v10", "draft", "v2", "v1", "beta"];
        versions.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(versions, vec!["v1", "v2", "v10", "beta", "draft"]);
    }

    #[test]
    fn test_normalize_rejects_escapes() {
        assert_eq!(normalize_path(" /invoices/v1/ ").unwrap(), "invoices/v1");
        assert!(matches!(normalize_path("../secrets"), Err(CatalogError::InvalidPath(_))));
        assert!(matches!(normalize_path("a/../../b"), Err(CatalogError::InvalidPath(_))));
    }

    #[test]
    fn test_listing() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "invoices/v1", "p", None);
        write_profile(root.path(), "invoices/v10", "p", None);
        write_profile(root.path(), "invoices/v2", "p", None);
        write_profile(root.path(), "acme/receipts/v1", "p", None);
        let catalog = catalog(&root);

        assert_eq!(catalog.list_profiles().unwrap(), vec!["acme/receipts", "invoices"]);
        assert_eq!(
            catalog.list_profile_versions("/invoices/").unwrap(),
            vec!["v1", "v2", "v10"]
        );
        let listing = catalog.list_profiles_with_versions(Some("acme")).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["acme/receipts"], vec!["v1"]);
    }

    #[test]
    fn test_missing_store_lists_nothing() {
        let root = TempDir::new().unwrap();
        let catalog = FsCatalog::new(CatalogConfig::new(root.path().join("absent")));
        assert!(catalog.list_profiles().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_latest_and_concrete() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "invoices/v2", "p", None);
        write_profile(root.path(), "invoices/v10", "p", None);
        let catalog = catalog(&root);

        let (resolved, versions) = catalog.resolve_profile_path("invoices", true).unwrap();
        assert_eq!(resolved, "invoices/v10");
        assert_eq!(versions.unwrap(), vec!["v2", "v10"]);

        let (resolved, versions) = catalog.resolve_profile_path("invoices/v2", true).unwrap();
        assert_eq!(resolved, "invoices/v2");
        assert_eq!(versions.unwrap(), vec!["v2", "v10"]);

        let (_, versions) = catalog.resolve_profile_path("invoices/v2", false).unwrap();
        assert!(versions.is_none());
    }

    #[test]
    fn test_resolve_not_found() {
        let root = TempDir::new().unwrap();
        let err = catalog(&root).resolve_profile_path("missing", false).unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound("No versions found for profile path 'missing'".to_string())
        );
    }

    #[test]
    fn test_load_profile_contents() {
        let root = TempDir::new().unwrap();
        write_profile(
            root.path(),
            "invoices/v1",
            "Extract the invoice.",
            Some("mode: extract\nmulti_doc_behavior: aggregate\n"),
        );
        let data = catalog(&root).load_profile("invoices", false).unwrap();

        assert_eq!(data.path, "invoices/v1");
        assert_eq!(data.prompt, "Extract the invoice.");
        assert_eq!(data.system_instruction, "Be precise.");
        assert_eq!(data.schema["required"][0], "total");
        assert_eq!(data.config["multi_doc_behavior"], "aggregate");
        assert_eq!(data.version.len(), 16);
        assert!(data.version.bytes().all(|b| b.is_ascii_hexdigit()));
        let names: Vec<&str> = data.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![PROMPT_FILE, SYSTEM_FILE, SCHEMA_FILE, CONFIG_FILE]);
        assert_eq!(data.files[0].size, "Extract the invoice.".len() as u64);
    }

    #[test]
    fn test_non_mapping_config_is_empty() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "a/v1", "p", Some("- just\n- a list\n"));
        write_profile(root.path(), "b/v1", "p", Some("key: [unterminated\n"));
        let catalog = catalog(&root);
        assert!(catalog.load_profile("a", false).unwrap().config.is_empty());
        assert!(catalog.load_profile("b", false).unwrap().config.is_empty());
    }

    #[test]
    fn test_invalid_schema_json() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "broken/v1", "p", None);
        fs::write(root.path().join("profiles/broken/v1").join(SCHEMA_FILE), "{not json").unwrap();
        let err = catalog(&root).load_profile("broken", false).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidProfile(_)));
    }

    #[test]
    fn test_cache_serves_stale_until_bypassed() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "invoices/v1", "first", None);
        let catalog = catalog(&root);

        assert_eq!(catalog.load_profile("invoices", false).unwrap().prompt, "first");
        fs::write(root.path().join("profiles/invoices/v1").join(PROMPT_FILE), "second").unwrap();

        assert_eq!(catalog.load_profile("invoices", false).unwrap().prompt, "first");
        assert_eq!(catalog.load_profile("invoices", true).unwrap().prompt, "second");
        assert_eq!(catalog.load_profile("invoices/v1", false).unwrap().prompt, "second");
    }

    #[test]
    fn test_metadata_collects_versions() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "invoices/v1", "p", None);
        write_profile(root.path(), "invoices/v2", "p", None);
        let meta = catalog(&root).profile_metadata("invoices").unwrap();

        assert_eq!(meta.requested_path, "invoices");
        assert_eq!(meta.path, "invoices/v2");
        assert_eq!(meta.available_versions, vec!["v1", "v2"]);
        assert_eq!(meta.files.len(), 3);
    }

    #[test]
    fn test_version_hash_changes_with_content() {
        let root = TempDir::new().unwrap();
        write_profile(root.path(), "invoices/v1", "short", None);
        let catalog = catalog(&root);
        let before = catalog.load_profile("invoices", false).unwrap().version.clone();

        fs::write(
            root.path().join("profiles/invoices/v1").join(PROMPT_FILE),
            "a considerably longer prompt",
        )
        .unwrap();
        let after = catalog.load_profile("invoices", true).unwrap().version.clone();
        assert_ne!(before, after);
    }
}
