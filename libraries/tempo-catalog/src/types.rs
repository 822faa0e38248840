//! Types for the download backend's requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempo_playback::Track;

/// Placeholder the backend uses for unknown artist/duration
const UNKNOWN: &str = "Unknown";

/// Configuration for connecting to the download backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the backend (e.g., "http://192.168.1.11:3001")
    pub url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CatalogConfig {
    /// Create a config with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

// =============================================================================
// Library Types
// =============================================================================

/// A downloaded song as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// File name, unique within the library
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Display duration, or "Unknown"
    pub duration: String,
    /// Playable URL
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

impl From<Song> for Track {
    fn from(song: Song) -> Self {
        let mut track = Track::new(song.id, song.title, song.artist, song.path);
        track.duration_label = known(song.duration);
        track.size_bytes = song.size;
        track
    }
}

/// Response from `GET /api/library`.
#[derive(Debug, Deserialize)]
pub struct LibraryResponse {
    pub songs: Vec<Song>,
}

/// Response from `DELETE /api/library/:file`.
#[derive(Debug, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// =============================================================================
// Search & Download Types
// =============================================================================

/// Request body for search.
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
}

/// A remote video that can be downloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub channel: String,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Response from `POST /api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Request body for download.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
}

/// Response from `POST /api/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub success: bool,
    pub filename: String,
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl From<DownloadResponse> for Track {
    fn from(download: DownloadResponse) -> Self {
        let mut track = Track::new(download.filename, download.title, UNKNOWN, download.path);
        track.size_bytes = download.size;
        track
    }
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

fn known(value: String) -> Option<String> {
    if value.is_empty() || value == UNKNOWN {
        None
    } else {
        Some(value)
    }
}
