//! Error types for playback control

use thiserror::Error;

/// Playback errors
///
/// Operations on an empty queue or with an out-of-range index are not errors;
/// they report [`crate::Outcome::NoOp`] instead.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine could not load a track (unreachable or unplayable URI)
    #[error("Failed to load {uri}: {reason}")]
    EngineLoad { uri: String, reason: String },

    /// The engine rejected a transport operation (play/pause/seek/stop/loop)
    #[error("Engine rejected {operation}: {reason}")]
    EngineTransport {
        operation: &'static str,
        reason: String,
    },

    /// The player service task is no longer running
    #[error("Player service is not running")]
    ServiceClosed,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlaybackError {
    pub(crate) fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::EngineTransport {
            operation,
            reason: err.to_string(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
