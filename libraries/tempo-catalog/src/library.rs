//! Library operations: list and delete downloaded songs.

use crate::client::{check, CatalogClient};
use crate::error::{CatalogError, Result};
use crate::types::{DeleteResponse, LibraryResponse, Song};
use tempo_playback::Track;
use tracing::{debug, info};

/// Library client for the download backend.
pub struct LibraryClient<'a> {
    client: &'a CatalogClient,
}

impl<'a> LibraryClient<'a> {
    pub(crate) fn new(client: &'a CatalogClient) -> Self {
        Self { client }
    }

    /// List downloaded songs, newest first (as the backend orders them).
    pub async fn songs(&self) -> Result<Vec<Song>> {
        let url = self.client.endpoint(&["api", "library"])?;
        debug!(url = %url, "Fetching library");

        let response = self
            .client
            .http()
            .get(url)
            .send()
            .await
            .map_err(CatalogError::from_send)?;
        let response = check(response).await?;

        let library: LibraryResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse library response: {}", e))
        })?;

        debug!(songs = library.songs.len(), "Fetched library");
        Ok(library.songs)
    }

    /// List the library as playable tracks.
    pub async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.songs().await?.into_iter().map(Track::from).collect())
    }

    /// Delete a downloaded file by name.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let url = self.client.endpoint(&["api", "library", filename])?;
        debug!(url = %url, filename = %filename, "Deleting song");

        let response = self
            .client
            .http()
            .delete(url)
            .send()
            .await
            .map_err(CatalogError::from_send)?;

        if response.status().as_u16() == 404 {
            return Err(CatalogError::NotFound(filename.to_string()));
        }
        let response = check(response).await?;

        let body: DeleteResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse delete response: {}", e))
        })?;
        if !body.success {
            return Err(CatalogError::ServerError {
                status: 200,
                message: format!("Backend refused to delete {}", filename),
            });
        }

        info!(filename = %filename, "Deleted song");
        Ok(())
    }
}
