//! HTTP request handlers for the extraction service.
//!
//! Implements extraction, profile listing and health check endpoints using
//! axum.

use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use docweave_catalog::LayeredResolver;
use docweave_domain::{DocweaveError, ErrorKind, ExtractionProfile, ProfileResolver, ProviderOptions};
use docweave_extractor::{source_from_uri, ExtractRequest, Extractor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Response header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Extraction orchestrator
    pub extractor: Arc<Extractor>,
    /// Profile lookup (user store, then built-ins)
    pub resolver: Arc<LayeredResolver>,
}

/// Reference to one input document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRef {
    /// Local path, `file://` or `http(s)://` URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Alternate spelling accepted for object-store style clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
}

impl FileRef {
    /// Reference by URI
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            gcs_uri: None,
        }
    }

    fn location(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .or(self.gcs_uri.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Body of `POST /extract-data`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractDataRequest {
    /// Raw schema declaration
    #[serde(default)]
    pub schema: Option<Value>,
    /// Profile name
    #[serde(default)]
    pub profile: Option<String>,
    /// Input documents, in order
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// `per_file`, `aggregate` or `both`
    #[serde(default)]
    pub multi: Option<String>,
    /// Provider option overrides
    #[serde(default)]
    pub options: Option<ProviderOptions>,
}

/// Response metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Model of the first result
    pub model: Option<String>,
}

/// Successful extraction response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractDataResponse {
    /// Always true
    pub ok: bool,
    /// Serialized extraction output
    pub data: Value,
    /// Response metadata
    pub meta: ResponseMeta,
}

/// Query of `GET /profiles`
#[derive(Debug, Default, Deserialize)]
pub struct ProfilesQuery {
    /// Include stored versions per profile base
    #[serde(default)]
    pub include_versions: bool,
    /// Only names starting with this prefix
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Profile listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilesResponse {
    /// Profile names, sorted
    pub profiles: Vec<String>,
    /// Stored versions per base, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub ok: bool,
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Error from the extraction pipeline
    Docweave(DocweaveError),
    /// Malformed request
    BadRequest(String),
    /// Internal server error
    InternalError(String),
}

/// HTTP status for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Schema | ErrorKind::Document => StatusCode::BAD_REQUEST,
        ErrorKind::Profile => StatusCode::NOT_FOUND,
        ErrorKind::Provider => StatusCode::BAD_GATEWAY,
        ErrorKind::Extraction | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Docweave(e) => (status_for(e.kind()), e.message().to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = Json(ErrorResponse {
            ok: false,
            error: message,
        });
        (status, body).into_response()
    }
}

impl From<DocweaveError> for AppError {
    fn from(e: DocweaveError) -> Self {
        AppError::Docweave(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

/// Catalog access touches the filesystem, so it runs off the async workers
async fn load_profile(state: &AppState, name: &str) -> Result<ExtractionProfile, AppError> {
    let resolver = state.resolver.clone();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || resolver.load(&name))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(AppError::from)
}

fn has_unsupported_scheme(location: &str) -> bool {
    match location.split_once("://") {
        Some((scheme, _)) => !matches!(scheme, "http" | "https" | "file"),
        None => false,
    }
}

/// POST /extract-data - Run one extraction
async fn extract_data(
    State(state): State<AppState>,
    payload: Result<Json<ExtractDataRequest>, JsonRejection>,
) -> Result<Json<ExtractDataResponse>, AppError> {
    let Json(body) = payload?;

    let profile = match body.profile.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(name) => Some(load_profile(&state, name).await?),
        None => None,
    };
    let schema = body.schema.filter(|s| !s.is_null());
    if schema.is_none() && profile.as_ref().map_or(true, |p| p.schema.is_none()) {
        return Err(DocweaveError::Schema("schema is required".to_string()).into());
    }

    let mut docs = Vec::with_capacity(body.files.len());
    for (idx, file) in body.files.iter().enumerate() {
        let location = file.location().ok_or_else(|| {
            AppError::BadRequest(format!("files[{}] requires 'uri' or 'gcs_uri'", idx))
        })?;
        if has_unsupported_scheme(location) {
            return Err(DocweaveError::Document(format!("Unsupported document URI: {}", location)).into());
        }
        docs.push(source_from_uri(location));
    }

    let mut request = ExtractRequest::new(docs);
    if let Some(schema) = schema {
        request = request.with_schema(schema);
    }
    if let Some(profile) = profile {
        request = request.with_profile(profile);
    }
    if let Some(options) = body.options {
        request = request.with_options(options);
    }
    if let Some(multi) = body.multi.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        request = request
            .with_multi(multi)
            .map_err(|e| AppError::BadRequest(e.message().to_string()))?;
    }

    let output = state.extractor.extract(request).await?;

    Ok(Json(ExtractDataResponse {
        ok: true,
        meta: ResponseMeta {
            model: output.model().map(str::to_string),
        },
        data: output.to_value(),
    }))
}

/// GET /profiles - Built-in and stored profile names
async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfilesQuery>,
) -> Result<Json<ProfilesResponse>, AppError> {
    let resolver = state.resolver.clone();
    let listing = tokio::task::spawn_blocking(move || {
        let prefix = query.prefix.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let mut profiles = resolver.list()?;
        if let Some(prefix) = prefix {
            profiles.retain(|name| name.starts_with(prefix));
        }

        let versions = match (query.include_versions, resolver.store()) {
            (true, Some(store)) => Some(
                store
                    .list_profiles_with_versions(prefix)
                    .map_err(DocweaveError::from)?,
            ),
            (true, None) => Some(BTreeMap::new()),
            (false, _) => None,
        };
        Ok::<_, DocweaveError>(ProfilesResponse { profiles, versions })
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))??;

    Ok(Json(listing))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Wrap each request in a span carrying a fresh request id
async fn request_span(request: Request, next: Next) -> Response {
    let request_id = Uuid::now_v7();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request complete"
        );
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/extract-data", post(extract_data))
        .route("/profiles", get(list_profiles))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}
