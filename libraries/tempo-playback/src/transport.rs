//! Transport sync
//!
//! Folds the engine's raw status stream into one canonical [`PlaybackStatus`]
//! in milliseconds. Works the same for pushed statuses and polled ones.

use tracing::{debug, trace};

use crate::engine::{LoadId, RawStatus, TimeUnit};
use crate::types::PlaybackStatus;

/// Change worth reacting to after a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportUpdate {
    /// The bound track reached its end on this update
    pub finished: bool,
}

/// Canonical transport state for the bound resource
#[derive(Debug, Clone)]
pub struct TransportSync {
    unit: TimeUnit,

    /// Load whose statuses are accepted
    bound: Option<LoadId>,

    status: PlaybackStatus,

    /// Bound load completed; untagged statuses can be attributed to it
    loaded: bool,

    /// Finished condition seen on the previous update (edge detection)
    ///
    /// Only an engine status clears it, so a restart does not open a new edge
    /// for the rest of a finished burst.
    was_finished: bool,

    /// Queue ran out: position is pinned at duration until the next load
    ended: bool,
}

impl TransportSync {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            bound: None,
            loaded: false,
            status: PlaybackStatus::default(),
            was_finished: false,
            ended: false,
        }
    }

    /// Start tracking a new load
    ///
    /// Position and duration drop to 0; duration stays 0 until the engine
    /// reports the new track's real duration.
    pub fn reset_for(&mut self, load: LoadId) {
        self.bound = Some(load);
        self.loaded = false;
        self.status = PlaybackStatus::default();
        self.was_finished = false;
        self.ended = false;
    }

    /// Forget the bound resource entirely
    pub fn clear(&mut self) {
        self.bound = None;
        self.loaded = false;
        self.status = PlaybackStatus::default();
        self.was_finished = false;
        self.ended = false;
    }

    /// Fold one engine status into the canonical view
    ///
    /// Returns `None` for statuses that belong to a superseded load, arrive
    /// while nothing is bound, or carry no load tag while the bound load is
    /// still pending. The finished flag is edge-triggered: a burst of
    /// identical "finished" statuses reports `finished` once.
    pub fn apply(&mut self, raw: RawStatus) -> Option<TransportUpdate> {
        let bound = self.bound?;
        match raw.load {
            Some(load) if load != bound => {
                trace!(%load, %bound, "dropping status for superseded load");
                return None;
            }
            None if !self.loaded => {
                trace!(%bound, "dropping untagged status while loading");
                return None;
            }
            _ => {}
        }

        if self.ended {
            // Frozen at the end of the queue; only a new load or restart thaws it
            return Some(TransportUpdate { finished: false });
        }

        let position_ms = self.unit.to_millis(raw.position);
        let duration_ms = raw
            .duration
            .map(|d| self.unit.to_millis(d))
            .filter(|d| *d > 0)
            .unwrap_or(self.status.duration_ms);

        // Poll-based engines can miss the transient finish flag; a stopped
        // player sitting at its end counts as finished too
        let at_end = !raw.playing && duration_ms > 0 && position_ms >= duration_ms;
        let finished_now = raw.did_just_finish || at_end;
        let edge = finished_now && !self.was_finished;

        self.status = PlaybackStatus {
            playing: raw.playing && !finished_now,
            position_ms,
            duration_ms,
            buffering: raw.buffering,
            finished: edge,
        };
        self.was_finished = finished_now;

        if edge {
            debug!(%bound, position_ms, duration_ms, "track reached its end");
        }

        Some(TransportUpdate { finished: edge })
    }

    /// Record a confirmed play/pause
    pub fn set_playing(&mut self, playing: bool) {
        self.status.playing = playing;
    }

    /// The bound load completed
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Record a seek
    pub fn set_position(&mut self, position_ms: u64) {
        self.status.position_ms = position_ms;
        self.status.finished = false;
        self.ended = false;
    }

    /// The bound track was sent back to 0 to play again
    pub fn restart(&mut self) {
        self.set_position(0);
    }

    /// Leave the engine stopped at the end of the last track
    pub fn freeze_at_end(&mut self) {
        self.status.playing = false;
        self.status.buffering = false;
        self.status.position_ms = self.status.duration_ms;
        self.ended = true;
    }

    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    pub fn bound(&self) -> Option<LoadId> {
        self.bound
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}
