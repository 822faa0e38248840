//! Shuffle permutation rule
//!
//! Uniform random permutation (Fisher-Yates) with the focused track pinned
//! to the front.

use crate::types::Track;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle `tracks` uniformly, then move the first track with `pinned_id` to
/// position 0
///
/// Returns whether a matching track was found and pinned.
pub fn shuffle_pinned<R: Rng + ?Sized>(tracks: &mut Vec<Track>, pinned_id: &str, rng: &mut R) -> bool {
    tracks.shuffle(rng);

    match tracks.iter().position(|t| t.id == pinned_id) {
        Some(pos) => {
            let pinned = tracks.remove(pos);
            tracks.insert(0, pinned);
            true
        }
        None => false,
    }
}
