//! Player events
//!
//! Event-based notifications for UI synchronization. The snapshot channel
//! always carries the full state; events mark the moments worth animating or
//! surfacing (a new track, the end of the queue, a failure).

use serde::{Deserialize, Serialize};

use crate::types::RepeatMode;

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A track finished loading and became current
    TrackChanged {
        /// ID of the new current track
        track_id: String,
        /// Its index in the active queue
        index: usize,
    },

    /// Playing/paused flipped
    StateChanged { playing: bool },

    /// Queue replaced or reordered
    QueueChanged {
        /// New queue length
        length: usize,
        /// Whether the active order is shuffled
        shuffle: bool,
    },

    /// Repeat mode cycled
    RepeatChanged { mode: RepeatMode },

    /// Last track finished with nothing to follow
    QueueEnded,

    /// An engine failure outside of any caller's request (e.g. auto-advance)
    Error { message: String },
}
