//! Queue state
//!
//! Holds the active play order, the pristine original order and the current
//! index. When shuffle is on, the active order *is* the shuffled order.
//!
//! ```text
//! original: A B C D      (never touched by shuffling)
//! active:   C A D B      (shuffled, C was playing when shuffle was enabled)
//! index:    0
//! ```

use crate::shuffle::shuffle_pinned;
use crate::types::Track;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Playback queue
///
/// Out-of-range indices are rejected as no-ops and every operation on an
/// empty queue is a no-op.
#[derive(Debug, Clone)]
pub struct Queue {
    /// Active play order
    tracks: Vec<Track>,

    /// Order the queue was created with
    original: Vec<Track>,

    /// Current position in `tracks`, meaningless while empty
    index: usize,

    /// Whether `tracks` is a shuffled permutation of `original`
    shuffled: bool,

    /// Track focused when shuffle was enabled and its position in `original`.
    /// Breaks ties between duplicate ids when shuffle is turned off.
    anchor: Option<(String, usize)>,

    rng: StdRng,
}

impl Queue {
    /// Create an empty queue with an entropy-seeded shuffle generator
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an empty queue with a fixed shuffle seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            original: Vec::new(),
            index: 0,
            shuffled: false,
            anchor: None,
            rng,
        }
    }

    /// Replace the queue and its original order
    ///
    /// If shuffle is on, the new queue is reshuffled immediately with the
    /// start track pinned first. Returns `false` (and changes nothing) when
    /// `start_index` is out of range for a non-empty list.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> bool {
        if !tracks.is_empty() && start_index >= tracks.len() {
            return false;
        }

        self.original.clone_from(&tracks);
        self.tracks = tracks;
        self.index = if self.tracks.is_empty() { 0 } else { start_index };
        self.anchor = None;

        if self.shuffled {
            // Keep the preference but rebuild the permutation for the new list
            self.shuffled = false;
            self.enable_shuffle();
        }

        true
    }

    /// Move the current index, bounds-checked
    pub fn advance_to(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.index = index;
        true
    }

    /// Replace the active order with a fresh permutation of the original
    ///
    /// The track matching `current_track_id` is relocated to index 0 and the
    /// current index becomes 0.
    pub fn apply_shuffle(&mut self, current_track_id: &str) {
        if self.original.is_empty() {
            self.shuffled = true;
            return;
        }

        let anchor = self.anchor_for(current_track_id);

        let mut active = self.original.clone();
        shuffle_pinned(&mut active, current_track_id, &mut self.rng);

        self.tracks = active;
        self.index = 0;
        self.shuffled = true;
        self.anchor = anchor;
    }

    /// Shuffle around whatever track is current
    pub fn enable_shuffle(&mut self) {
        match self.current().map(|t| t.id.clone()) {
            Some(id) => self.apply_shuffle(&id),
            None => self.shuffled = true,
        }
    }

    /// Swap the active order back to the original and refocus the current
    /// track by identity (index 0 if it cannot be found)
    pub fn restore_original_order(&mut self) {
        if !self.shuffled {
            return;
        }

        let current_id = self.current().map(|t| t.id.clone());
        let near = match (&self.anchor, &current_id) {
            (Some((anchor_id, pos)), Some(id)) if anchor_id == id => Some(*pos),
            _ => None,
        };

        self.tracks = self.original.clone();
        self.shuffled = false;
        self.anchor = None;
        self.index = current_id
            .and_then(|id| self.position_of(&id, near))
            .unwrap_or(0);
    }

    /// Position of a track in the active order by id
    ///
    /// With duplicate ids, the occurrence closest to `near` wins (the first
    /// one when `near` is `None`).
    pub fn position_of(&self, track_id: &str, near: Option<usize>) -> Option<usize> {
        let matches = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.id == track_id)
            .map(|(pos, _)| pos);

        match near {
            Some(near) => matches.min_by_key(|pos| pos.abs_diff(near)),
            None => matches.min(),
        }
    }

    /// Where the track about to be pinned sits in the original order
    fn anchor_for(&self, track_id: &str) -> Option<(String, usize)> {
        if let Some((id, pos)) = &self.anchor {
            if id == track_id {
                return Some((id.clone(), *pos));
            }
        }

        let pos = if !self.shuffled
            && self.tracks.get(self.index).is_some_and(|t| t.id == track_id)
        {
            Some(self.index)
        } else {
            self.original.iter().position(|t| t.id == track_id)
        };

        pos.map(|pos| (track_id.to_string(), pos))
    }

    /// Bring the shuffle state to `shuffle`; does nothing if already there
    pub fn set_shuffle(&mut self, shuffle: bool) {
        if self.shuffled == shuffle {
            return;
        }
        if shuffle {
            self.enable_shuffle();
        } else {
            self.restore_original_order();
        }
    }

    /// Current track, if the queue is non-empty
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    /// Current index, if the queue is non-empty
    pub fn current_index(&self) -> Option<usize> {
        (self.index < self.tracks.len()).then_some(self.index)
    }

    /// Track at a position in the active order
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Active play order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Order the queue was created with
    pub fn original(&self) -> &[Track] {
        &self.original
    }

    /// Tracks after the current one
    pub fn up_next(&self) -> &[Track] {
        match self.current_index() {
            Some(index) => &self.tracks[index + 1..],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
