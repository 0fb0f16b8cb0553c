//! Document sources: local files, inline text and HTTP URLs

use async_trait::async_trait;
use docweave_domain::{DocumentContent, DocumentSource, DocweaveError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout for fetching a document over HTTP
pub const HTTP_FETCH_TIMEOUT_SECS: u64 = 60;

/// A document on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn load(&self) -> Result<DocumentContent> {
        debug!(path = %self.path.display(), "Reading document");
        tokio::fs::read(&self.path)
            .await
            .map(DocumentContent::Bytes)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    DocweaveError::Document(format!("File not found: {}", self.path.display()))
                }
                _ => DocweaveError::Document(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )),
            })
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Text supplied directly by the caller
#[derive(Debug, Clone)]
pub struct RawTextSource {
    text: String,
    name: String,
}

impl RawTextSource {
    /// Create a source named `inline`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: "inline".to_string(),
        }
    }

    /// Override the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl DocumentSource for RawTextSource {
    async fn load(&self) -> Result<DocumentContent> {
        Ok(DocumentContent::Text(self.text.clone()))
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// A document fetched with HTTP GET
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    name: Option<String>,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for `url`
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            name: None,
            client,
        }
    }

    /// Override the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// URL being fetched
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn load(&self) -> Result<DocumentContent> {
        debug!(url = %self.url, "Fetching document");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DocweaveError::Document(format!("Failed to fetch {}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocweaveError::Document(format!(
                "Failed to fetch {}: HTTP {}",
                self.url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocweaveError::Document(format!("Failed to fetch {}: {}", self.url, e)))?;
        Ok(DocumentContent::Bytes(bytes.to_vec()))
    }

    fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        last_path_segment(&self.url)
            .map(str::to_string)
            .unwrap_or_else(|| self.url.clone())
    }
}

fn last_path_segment(url: &str) -> Option<&str> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let (_, path) = without_scheme.split_once('/')?;
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// Build a source from a URI: `http(s)://` → [`HttpSource`], anything else
/// (optionally `file://`) → [`FileSource`]
pub fn source_from_uri(uri: &str) -> Arc<dyn DocumentSource> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Arc::new(HttpSource::new(uri))
    } else {
        Arc::new(FileSource::new(uri.strip_prefix("file://").unwrap_or(uri)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use docweave_domain::ErrorKind as DocErrorKind;
    use std::io::Write;

    async fn spawn_files() -> String {
        let app = Router::new()
            .route("/files/report.txt", get(|| async { "quarterly numbers" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_file_source_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"invoice body").unwrap();

        let source = FileSource::new(file.path());
        let content = source.load().await.unwrap();
        assert_eq!(content, DocumentContent::Bytes(b"invoice body".to_vec()));
        assert_eq!(
            source.display_name(),
            file.path().file_name().unwrap().to_string_lossy()
        );
    }

    #[tokio::test]
    async fn test_file_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.pdf"));

        let err = source.load().await.unwrap_err();
        assert_eq!(err.kind(), DocErrorKind::Document);
        assert!(err.message().starts_with("File not found"));
        assert_eq!(source.display_name(), "nope.pdf");
    }

    #[tokio::test]
    async fn test_raw_text_source() {
        let source = RawTextSource::new("hello");
        assert_eq!(source.display_name(), "inline");
        assert_eq!(source.load().await.unwrap(), DocumentContent::Text("hello".to_string()));
        assert_eq!(source.with_name("doc1").display_name(), "doc1");
    }

    #[tokio::test]
    async fn test_http_source_fetch() {
        let base = spawn_files().await;

        let source = HttpSource::new(format!("{}/files/report.txt", base));
        assert_eq!(source.display_name(), "report.txt");
        let content = source.load().await.unwrap();
        assert_eq!(content.as_text_lossy(), "quarterly numbers");

        let err = HttpSource::new(format!("{}/missing", base)).load().await.unwrap_err();
        assert_eq!(err.kind(), DocErrorKind::Document);
        assert!(err.message().contains("HTTP 404"));
    }

    #[test]
    fn test_http_display_names() {
        assert_eq!(HttpSource::new("https://x.io/a/b.pdf?sig=1").display_name(), "b.pdf");
        assert_eq!(HttpSource::new("https://x.io/a/dir/").display_name(), "dir");
        assert_eq!(HttpSource::new("https://x.io").display_name(), "https://x.io");
        assert_eq!(HttpSource::new("https://x.io/a").with_name("named").display_name(), "named");
    }

    #[test]
    fn test_source_from_uri() {
        assert_eq!(source_from_uri("https://x.io/doc.pdf").display_name(), "doc.pdf");
        assert_eq!(source_from_uri("file:///tmp/scan.png").display_name(), "scan.png");
        assert_eq!(source_from_uri("relative/notes.txt").display_name(), "notes.txt");
    }
}
