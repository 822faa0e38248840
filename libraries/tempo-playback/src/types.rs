//! Core types for playback control

use serde::{Deserialize, Serialize};

use crate::engine::LoadId;

/// A playable audio item
///
/// `id` is stable and unique within a queue. `uri` is whatever the engine
/// accepts for `load` (typically an HTTP URL served by the download backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable track identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Playable URI handed to the engine
    pub uri: String,

    /// Display duration as reported by the catalog (e.g. "3:42"), if known
    #[serde(default)]
    pub duration_label: Option<String>,

    /// File size in bytes, if known
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl Track {
    /// Create a track with the required fields only
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            uri: uri.into(),
            duration_label: None,
            size_bytes: None,
        }
    }
}

/// Repeat mode
///
/// Cycles Off → Track → Queue → Off. There are no other transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the last track finishes
    #[default]
    Off,

    /// Loop the current track
    Track,

    /// Wrap around to the first track after the last one
    Queue,
}

impl RepeatMode {
    /// The mode that follows this one in the cycle
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::Track,
            RepeatMode::Track => RepeatMode::Queue,
            RepeatMode::Queue => RepeatMode::Off,
        }
    }
}

/// Canonical transport state, always in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub buffering: bool,

    /// Set on the status update where the track reached its end
    pub finished: bool,
}

/// Result of a control operation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed without a new load
    Applied,

    /// Nothing to do (empty queue, index out of range, no current track)
    NoOp,

    /// A load was issued and has not completed yet
    Loading(LoadId),

    /// The requested track finished loading and is playing
    Playing(Track),

    /// A later request replaced this one before its load completed
    Superseded,
}

/// Read-only view of the player for rendering transport controls and "up next"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub current_index: Option<usize>,
    pub playing: bool,
    pub buffering: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
}

impl PlayerSnapshot {
    /// Tracks after the current one in play order
    pub fn up_next(&self) -> &[Track] {
        match self.current_index {
            Some(index) if index < self.queue.len() => &self.queue[index + 1..],
            _ => &[],
        }
    }
}

/// Format milliseconds as `m:ss`, the way transport controls display time
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
