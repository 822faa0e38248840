//! Tempo Catalog Client
//!
//! HTTP client for the download backend that feeds the player.
//!
//! # Features
//!
//! - **Library**: List downloaded songs as playable [`Track`]s, delete files
//! - **Search**: Find downloadable audio
//! - **Download**: Have the backend fetch audio and get the new track back
//!
//! # Example
//!
//! ```ignore
//! use tempo_catalog::{CatalogClient, CatalogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::new("http://192.168.1.11:3001"))?;
//!
//!     let tracks = client.library().tracks().await?;
//!     println!("Found {} tracks", tracks.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod download;
mod error;
mod library;
mod types;

// Re-export main types
pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use types::{
    CatalogConfig, DeleteResponse, DownloadResponse, LibraryResponse, SearchResult, Song,
};

// Re-export sub-clients for direct use if needed
pub use download::DownloadClient;
pub use library::LibraryClient;

pub use tempo_playback::Track;
