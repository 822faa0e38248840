//! Audio engine capability contract
//!
//! The engine decodes and outputs audio; the controller only drives it.
//! Every platform binding implements [`AudioEngine`] so the controller never
//! depends on one library's shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identifies one `load` request
///
/// Ids increase monotonically per controller, so a larger id always means a
/// more recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadId(pub u64);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Request to bind a new resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: LoadId,
    pub uri: String,
}

/// Native time unit of an engine's status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Millis,
    Seconds,
}

impl TimeUnit {
    /// Convert a native value to whole milliseconds
    ///
    /// Negative and non-finite values collapse to 0.
    pub fn to_millis(self, value: f64) -> u64 {
        if !value.is_finite() || value <= 0.0 {
            return 0;
        }
        match self {
            TimeUnit::Millis => value.round() as u64,
            TimeUnit::Seconds => (value * 1000.0).round() as u64,
        }
    }
}

/// What an engine can do beyond the mandatory operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCapabilities {
    /// Unit used by `RawStatus::position` and `RawStatus::duration`
    pub time_unit: TimeUnit,

    /// Engine can loop the bound resource by itself
    pub native_loop: bool,

    /// Engine pushes statuses on its event channel; otherwise the service polls
    pub push_status: bool,
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Millis,
            native_loop: false,
            push_status: true,
        }
    }
}

/// Status exactly as the engine reports it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawStatus {
    /// Load this status belongs to, when the engine tags statuses
    pub load: Option<LoadId>,
    pub playing: bool,
    pub position: f64,
    pub duration: Option<f64>,
    pub buffering: bool,
    pub did_just_finish: bool,
}

/// Error reported by an engine operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Asynchronous notifications from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A load finished, successfully or not
    Loaded {
        id: LoadId,
        result: std::result::Result<(), EngineError>,
    },

    /// Pushed status update
    Status(RawStatus),
}

/// Platform audio engine
///
/// `load` only starts loading: completion arrives later as
/// [`EngineEvent::Loaded`], possibly after newer loads were issued. Loading
/// replaces whatever resource was bound, so [`AudioEngine::bound`] always
/// names the most recently requested load.
#[async_trait]
pub trait AudioEngine: Send {
    /// Capabilities of this engine
    fn capabilities(&self) -> EngineCapabilities;

    /// Start loading a resource, replacing any bound one
    ///
    /// An `Err` means the request was rejected outright and no completion
    /// event will follow.
    async fn load(&mut self, request: LoadRequest) -> std::result::Result<(), EngineError>;

    /// Start or resume playback of the bound resource
    async fn play(&mut self) -> std::result::Result<(), EngineError>;

    /// Pause playback
    async fn pause(&mut self) -> std::result::Result<(), EngineError>;

    /// Seek the bound resource; the engine clamps out-of-range positions
    async fn seek(&mut self, position_ms: u64) -> std::result::Result<(), EngineError>;

    /// Stop playback and release the bound resource
    async fn stop(&mut self) -> std::result::Result<(), EngineError>;

    /// Toggle native single-track looping
    ///
    /// Only called when `capabilities().native_loop` is set.
    async fn set_looping(&mut self, looping: bool) -> std::result::Result<(), EngineError> {
        let _ = looping;
        Err(EngineError::new("native looping not supported"))
    }

    /// Most recently requested load, if any resource is bound
    fn bound(&self) -> Option<LoadId>;

    /// Query the current status (used when the engine does not push)
    async fn poll_status(&mut self) -> std::result::Result<RawStatus, EngineError>;

    /// Take the engine's event channel
    ///
    /// Returns `Some` exactly once.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_normalize_to_millis() {
        assert_eq!(TimeUnit::Seconds.to_millis(1.5), 1500);
        assert_eq!(TimeUnit::Seconds.to_millis(182.0004), 182_000);
    }

    #[test]
    fn millis_pass_through() {
        assert_eq!(TimeUnit::Millis.to_millis(2500.4), 2500);
    }

    #[test]
    fn invalid_values_collapse_to_zero() {
        assert_eq!(TimeUnit::Seconds.to_millis(f64::NAN), 0);
        assert_eq!(TimeUnit::Seconds.to_millis(-3.0), 0);
        assert_eq!(TimeUnit::Millis.to_millis(f64::INFINITY), 0);
    }

    #[test]
    fn load_ids_order_by_recency() {
        assert!(LoadId(3) > LoadId(2));
        assert_eq!(LoadId(7).to_string(), "load#7");
    }
}
