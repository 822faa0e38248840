//! Ordering policy
//!
//! Repeat mode state machine plus next/previous index resolution. Shuffle
//! does not appear here: it only changes which permutation occupies the
//! queue, never the resolution rule.

use crate::types::RepeatMode;

/// Default threshold after which "previous" restarts the current track
pub const RESTART_THRESHOLD_MS: u64 = 3000;

/// Where "next" leads from the current index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Move to this index
    Advance(usize),

    /// Last track under repeat-track: the auto-advance handler loops it
    RepeatTrack,

    /// Last track with repeat off: nothing follows
    End,
}

/// Where "previous" leads from the current index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousStep {
    /// Seek the current track back to 0, index unchanged
    Restart,

    /// Move to this index
    Retreat(usize),
}

/// Repeat mode plus the resolution rules that depend on it
#[derive(Debug, Clone)]
pub struct OrderingPolicy {
    repeat: RepeatMode,
    restart_threshold_ms: u64,
}

impl OrderingPolicy {
    pub fn new(repeat: RepeatMode, restart_threshold_ms: u64) -> Self {
        Self {
            repeat,
            restart_threshold_ms,
        }
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Advance the repeat mode one step (Off → Track → Queue → Off)
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycled();
        self.repeat
    }

    /// Resolve "next" for a queue of `len` tracks at `index`
    ///
    /// `None` when the queue is empty or `index` is out of range.
    pub fn next_step(&self, index: usize, len: usize) -> Option<NextStep> {
        if index >= len {
            return None;
        }

        if index + 1 < len {
            return Some(NextStep::Advance(index + 1));
        }

        Some(match self.repeat {
            RepeatMode::Queue => NextStep::Advance(0),
            RepeatMode::Track => NextStep::RepeatTrack,
            RepeatMode::Off => NextStep::End,
        })
    }

    /// Resolve "previous" for a queue of `len` tracks at `index`, with the
    /// current track at `position_ms`
    pub fn previous_step(&self, index: usize, len: usize, position_ms: u64) -> Option<PreviousStep> {
        if index >= len {
            return None;
        }

        if position_ms > self.restart_threshold_ms {
            return Some(PreviousStep::Restart);
        }

        if index > 0 {
            Some(PreviousStep::Retreat(index - 1))
        } else if self.repeat == RepeatMode::Queue {
            Some(PreviousStep::Retreat(len - 1))
        } else {
            Some(PreviousStep::Restart)
        }
    }
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self::new(RepeatMode::Off, RESTART_THRESHOLD_MS)
    }
}
