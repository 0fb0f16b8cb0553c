//! Docweave client implementation.

use crate::config::{ClientMode, SdkConfig};
use crate::error::SdkError;
use docweave_catalog::LayeredResolver;
use docweave_domain::{ModelProvider, MultiMode, ProfileResolver, ProviderOptions};
use docweave_extractor::{source_from_uri, ExtractionOutput, Extractor, ExtractorConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout for calls to a remote service
pub const REMOTE_TIMEOUT_SECS: u64 = 60;

/// What to extract and how
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    /// Paths or URIs, in order
    pub files: Vec<String>,
    /// Raw schema declaration
    pub schema: Option<Value>,
    /// Profile name
    pub profile: Option<String>,
    /// Multi-document mode
    pub multi: Option<MultiMode>,
    /// Provider option overrides
    pub options: Option<ProviderOptions>,
}

impl ExtractRequest {
    /// Request over `files`
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Use a raw schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use a profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the multi-document mode
    pub fn with_multi(mut self, multi: MultiMode) -> Self {
        self.multi = Some(multi);
        self
    }

    /// Set provider option overrides
    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = Some(options);
        self
    }
}

enum Backend {
    Local {
        extractor: Extractor,
        resolver: Arc<LayeredResolver>,
    },
    Remote {
        endpoint: String,
        http: reqwest::Client,
    },
}

#[derive(Deserialize)]
struct ServiceReply {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ProfilesReply {
    #[serde(default)]
    profiles: Vec<String>,
    #[serde(default)]
    versions: Option<BTreeMap<String, Vec<String>>>,
}

/// Docweave SDK client
pub struct DocweaveClient {
    config: SdkConfig,
    backend: Backend,
}

impl DocweaveClient {
    /// Create a client. Local mode talks to Ollama with default extractor
    /// settings.
    pub fn new(config: SdkConfig) -> Result<Self, SdkError> {
        Self::build(config, || Extractor::with_default_provider(ExtractorConfig::default()))
    }

    /// Create a client whose local extractions use `provider`
    pub fn with_provider(config: SdkConfig, provider: Arc<dyn ModelProvider>) -> Result<Self, SdkError> {
        Self::with_extractor(config, Extractor::new(provider, ExtractorConfig::default()))
    }

    /// Create a client around a ready extractor (ignored in remote mode)
    pub fn with_extractor(config: SdkConfig, extractor: Extractor) -> Result<Self, SdkError> {
        Self::build(config, || extractor)
    }

    fn build<F>(config: SdkConfig, extractor: F) -> Result<Self, SdkError>
    where
        F: FnOnce() -> Extractor,
    {
        let backend = match config.mode {
            ClientMode::Local => Backend::Local {
                extractor: extractor(),
                resolver: Arc::new(config.resolver()),
            },
            ClientMode::Remote => {
                let endpoint = config
                    .endpoint_url
                    .as_deref()
                    .map(|e| e.trim().trim_end_matches('/'))
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| SdkError::Config("Remote mode requires endpoint_url".to_string()))?
                    .to_string();
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
                    .build()
                    .map_err(|e| SdkError::Connection(e.to_string()))?;
                Backend::Remote { endpoint, http }
            }
        };
        Ok(Self { config, backend })
    }

    /// Configuration in use
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Local or remote
    pub fn mode(&self) -> ClientMode {
        self.config.mode
    }

    /// Run one extraction
    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractionOutput, SdkError> {
        match &self.backend {
            Backend::Local { extractor, resolver } => {
                extract_local(extractor, resolver, request).await
            }
            Backend::Remote { endpoint, http } => extract_remote(http, endpoint, request).await,
        }
    }

    /// Profile names, built-ins included, sorted
    pub async fn list_profiles(&self) -> Result<Vec<String>, SdkError> {
        match &self.backend {
            Backend::Local { resolver, .. } => {
                let resolver = resolver.clone();
                run_blocking(move || Ok(resolver.list()?)).await
            }
            Backend::Remote { endpoint, http } => {
                Ok(fetch_profiles(http, endpoint, false, None).await?.profiles)
            }
        }
    }

    /// Stored profile bases with their versions, optionally limited to bases
    /// under `prefix`
    pub async fn list_profiles_with_versions(
        &self,
        prefix: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<String>>, SdkError> {
        let prefix = prefix.map(|p| p.trim().trim_matches('/').to_string()).filter(|p| !p.is_empty());
        match &self.backend {
            Backend::Local { resolver, .. } => {
                let resolver = resolver.clone();
                run_blocking(move || match resolver.store() {
                    Some(store) => Ok(store
                        .list_profiles_with_versions(prefix.as_deref())
                        .map_err(docweave_domain::DocweaveError::from)?),
                    None => Ok(BTreeMap::new()),
                })
                .await
            }
            Backend::Remote { endpoint, http } => Ok(fetch_profiles(http, endpoint, true, prefix.as_deref())
                .await?
                .versions
                .unwrap_or_default()),
        }
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, SdkError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SdkError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| SdkError::Config(format!("Background task failed: {}", e)))?
}

async fn extract_local(
    extractor: &Extractor,
    resolver: &Arc<LayeredResolver>,
    request: ExtractRequest,
) -> Result<ExtractionOutput, SdkError> {
    let ExtractRequest {
        files,
        schema,
        profile,
        multi,
        options,
    } = request;

    let docs = files.iter().map(|f| source_from_uri(f)).collect();
    let mut engine_request = docweave_extractor::ExtractRequest::new(docs);

    if let Some(name) = profile.filter(|p| !p.trim().is_empty()) {
        let resolver = resolver.clone();
        let profile = run_blocking(move || Ok(resolver.load(&name)?)).await?;
        engine_request = engine_request.with_profile(profile);
    }
    if let Some(schema) = schema.filter(|s| !s.is_null()) {
        engine_request = engine_request.with_schema(schema);
    }
    if let Some(multi) = multi {
        engine_request = engine_request.with_multi_mode(multi);
    }
    if let Some(options) = options {
        engine_request = engine_request.with_options(options);
    }

    Ok(extractor.extract(engine_request).await?)
}

async fn extract_remote(
    http: &reqwest::Client,
    endpoint: &str,
    request: ExtractRequest,
) -> Result<ExtractionOutput, SdkError> {
    let payload = json!({
        "schema": request.schema,
        "profile": request.profile,
        "files": request.files.iter().map(|f| json!({"uri": f})).collect::<Vec<_>>(),
        "multi": request.multi.map(|m| m.as_str()),
        "options": request.options.unwrap_or_default(),
    });

    let url = format!("{}/extract-data", endpoint);
    debug!(url = %url, files = request.files.len(), "Posting remote extraction");
    let response = http.post(&url).json(&payload).send().await?;
    let reply: ServiceReply = read_reply(response).await?;

    if reply.ok == Some(false) {
        return Err(SdkError::InvalidResponse(
            reply.error.unwrap_or_else(|| "Service reported failure".to_string()),
        ));
    }
    serde_json::from_value(reply.data)
        .map_err(|e| SdkError::InvalidResponse(format!("Unexpected extraction output: {}", e)))
}

async fn fetch_profiles(
    http: &reqwest::Client,
    endpoint: &str,
    include_versions: bool,
    prefix: Option<&str>,
) -> Result<ProfilesReply, SdkError> {
    let mut query = Vec::new();
    if include_versions {
        query.push(("include_versions", "true"));
    }
    if let Some(prefix) = prefix {
        query.push(("prefix", prefix));
    }
    let response = http
        .get(format!("{}/profiles", endpoint))
        .query(&query)
        .send()
        .await?;
    read_reply(response).await
}

/// Decode a success body, or turn an error status into `SdkError::Remote`
/// carrying the service's `error` message when it sent one
async fn read_reply<T>(response: reqwest::Response) -> Result<T, SdkError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        return Err(SdkError::Remote {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| SdkError::InvalidResponse(e.to_string()))
}
