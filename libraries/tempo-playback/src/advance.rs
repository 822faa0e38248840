//! Auto-advance handler
//!
//! Decides what happens when the bound track reaches its end. A one-shot
//! guard, armed on every new load, makes sure a burst of duplicate
//! "finished" statuses produces a single reaction.

use crate::ordering::{NextStep, OrderingPolicy};
use crate::types::RepeatMode;

/// Reaction to a finished track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceAction {
    /// Seek the same track to 0 and play it again
    Restart,

    /// Load and play the track at this index
    Play(usize),

    /// Leave the engine stopped at the end
    Stop,
}

/// One-shot end-of-track guard
#[derive(Debug, Clone, Default)]
pub struct AutoAdvance {
    armed: bool,
}

impl AutoAdvance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow one reaction to the next end-of-track
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Take the pending reaction; `true` only for the first call after `arm`
    pub fn consume(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    /// Pick the reaction for the track at `index` in a queue of `len`
    ///
    /// Repeat-track loops wherever the track sits in the queue; otherwise the
    /// regular next-index resolution applies.
    pub fn decide(policy: &OrderingPolicy, index: Option<usize>, len: usize) -> AdvanceAction {
        let Some(index) = index else {
            return AdvanceAction::Stop;
        };

        if policy.repeat() == RepeatMode::Track {
            return AdvanceAction::Restart;
        }

        match policy.next_step(index, len) {
            Some(NextStep::Advance(next)) => AdvanceAction::Play(next),
            Some(NextStep::RepeatTrack) => AdvanceAction::Restart,
            Some(NextStep::End) | None => AdvanceAction::Stop,
        }
    }
}
