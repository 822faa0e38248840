//! Search and download operations.
//!
//! Downloads run on the backend; the response names the stored file and the
//! URL it is served from, which is all the player needs.

use crate::client::{check, CatalogClient};
use crate::error::{CatalogError, Result};
use crate::types::{DownloadRequest, DownloadResponse, SearchRequest, SearchResponse, SearchResult};
use tempo_playback::Track;
use tracing::{debug, info};

/// Download client for the backend.
pub struct DownloadClient<'a> {
    client: &'a CatalogClient,
}

impl<'a> DownloadClient<'a> {
    pub(crate) fn new(client: &'a CatalogClient) -> Self {
        Self { client }
    }

    /// Search for downloadable audio.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidRequest("Query is required".into()));
        }

        let url = self.client.endpoint(&["api", "search"])?;
        debug!(url = %url, query = %query, "Searching");

        let response = self
            .client
            .http()
            .post(url)
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(CatalogError::from_send)?;
        let response = check(response).await?;

        let search: SearchResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        debug!(results = search.results.len(), "Search complete");
        Ok(search.results)
    }

    /// Ask the backend to download a video's audio, returning the new track.
    ///
    /// The call returns once the file is stored, which can take a while.
    pub async fn download(&self, video_id: &str, title: &str) -> Result<Track> {
        if video_id.is_empty() {
            return Err(CatalogError::InvalidRequest("Video ID is required".into()));
        }

        let url = self.client.endpoint(&["api", "download"])?;
        debug!(url = %url, video_id = %video_id, "Requesting download");

        let response = self
            .client
            .http()
            .post(url)
            .json(&DownloadRequest { video_id, title })
            .send()
            .await
            .map_err(CatalogError::from_send)?;
        let response = check(response).await?;

        let download: DownloadResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse download response: {}", e))
        })?;

        info!(
            filename = %download.filename,
            size = ?download.size,
            "Download complete"
        );
        Ok(download.into())
    }
}
