//! Tempo - Playback Control
//!
//! Queue and transport control for a streaming music player.
//!
//! This crate provides:
//! - An ordered queue with shuffle that keeps the current track first
//! - Repeat modes (Off, Track, Queue) and previous/next resolution
//! - A one-shot auto-advance guard for end-of-track handling
//! - Canonical millisecond transport state from any engine's status stream
//! - Supersession of overlapping loads (latest request wins)
//!
//! # Architecture
//!
//! `tempo-playback` does not decode or output audio. The platform engine is
//! reached through the [`AudioEngine`] trait, and the
//! [`PlaybackController`] is its only driver. [`PlayerService`] runs the
//! controller on a task so any number of screens can share one player
//! through [`PlayerHandle`] clones.
//!
//! # Example
//!
//! ```rust,no_run
//! use tempo_playback::{format_time, AudioEngine, PlayerConfig, PlayerService, Track};
//!
//! async fn start(engine: impl AudioEngine + 'static) -> tempo_playback::Result<()> {
//!     let (player, _task) = PlayerService::spawn(engine, PlayerConfig::default());
//!
//!     let intro = Track::new("intro.m4a", "Intro", "Tempo", "http://localhost:8000/intro.m4a");
//!     let outro = Track::new("outro.m4a", "Outro", "Tempo", "http://localhost:8000/outro.m4a");
//!     player
//!         .play_from_playlist(intro.clone(), vec![intro, outro], 0)
//!         .await?;
//!
//!     player.toggle_shuffle().await?;
//!
//!     let state = player.snapshot();
//!     println!("{:?} at {}", state.current_track, format_time(state.position_ms));
//!     Ok(())
//! }
//! ```

mod advance;
mod config;
mod controller;
pub mod engine;
mod error;
mod events;
mod ordering;
mod queue;
mod service;
mod shuffle;
mod transport;
pub mod types;

// Public exports
pub use advance::{AdvanceAction, AutoAdvance};
pub use config::PlayerConfig;
pub use controller::{LoadCompletion, PlaybackController};
pub use engine::{
    AudioEngine, EngineCapabilities, EngineError, EngineEvent, LoadId, LoadRequest, RawStatus,
    TimeUnit,
};
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use ordering::{NextStep, OrderingPolicy, PreviousStep, RESTART_THRESHOLD_MS};
pub use queue::Queue;
pub use service::{PlayerHandle, PlayerService};
pub use shuffle::shuffle_pinned;
pub use transport::{TransportSync, TransportUpdate};
pub use types::{format_time, Outcome, PlaybackStatus, PlayerSnapshot, RepeatMode, Track};
