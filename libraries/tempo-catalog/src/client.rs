//! Main catalog client.

use crate::download::DownloadClient;
use crate::error::{CatalogError, Result};
use crate::library::LibraryClient;
use crate::types::{CatalogConfig, ErrorBody};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Client for the download backend.
///
/// Library listing and deletion go through [`CatalogClient::library`];
/// search and downloads through [`CatalogClient::download`].
///
/// # Example
///
/// ```ignore
/// use tempo_catalog::{CatalogClient, CatalogConfig};
///
/// let client = CatalogClient::new(CatalogConfig::new("http://192.168.1.11:3001"))?;
///
/// let tracks = client.library().tracks().await?;
/// println!("Found {} tracks", tracks.len());
///
/// let results = client.download().search("daft punk").await?;
/// let track = client.download().download(&results[0].id, &results[0].title).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(CatalogError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url =
            Url::parse(&config.url).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Tempo/{} (Mobile)", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Base URL with any trailing slash removed.
    pub fn url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Library operations (list, delete).
    pub fn library(&self) -> LibraryClient<'_> {
        LibraryClient::new(self)
    }

    /// Search and download operations.
    pub fn download(&self) -> DownloadClient<'_> {
        DownloadClient::new(self)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl("URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-2xx response into an error, reading the backend's `{ "error": ... }` body
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    debug!(status = status.as_u16(), message = %message, "Backend returned an error");

    Err(CatalogError::ServerError {
        status: status.as_u16(),
        message,
    })
}
