//! Playback controller - core orchestration
//!
//! Coordinates queue state, ordering policy, transport sync and auto-advance
//! on top of an exclusively owned [`AudioEngine`]. Every method takes
//! `&mut self` and runs to completion, so mutations never interleave.
//!
//! Loads are two-phase: a control call issues the load and returns
//! [`Outcome::Loading`]; the engine's [`EngineEvent::Loaded`] later completes
//! it through [`PlaybackController::handle_event`]. A newer load supersedes an
//! older one, and a late completion for a superseded load is ignored.

use tracing::{debug, info, warn};

use crate::advance::{AdvanceAction, AutoAdvance};
use crate::config::PlayerConfig;
use crate::engine::{
    AudioEngine, EngineCapabilities, EngineError, EngineEvent, LoadId, LoadRequest, RawStatus,
};
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::ordering::{NextStep, OrderingPolicy, PreviousStep};
use crate::queue::Queue;
use crate::transport::TransportSync;
use crate::types::{Outcome, PlaybackStatus, PlayerSnapshot, RepeatMode, Track};

use tokio::sync::mpsc;

/// Load issued to the engine and not completed yet
#[derive(Debug)]
struct PendingLoad {
    id: LoadId,
    track: Track,

    /// Start playing once loaded
    autoplay: bool,

    /// Queue as it was before the request, restored if the load fails;
    /// shuffle toggles made while loading are applied to it too
    rollback: Queue,
}

/// Completion of a load that was still authoritative
#[derive(Debug)]
pub struct LoadCompletion {
    pub id: LoadId,
    pub result: Result<Track>,
}

/// Central playback control
///
/// Owns the engine; nothing else may drive it.
pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    capabilities: EngineCapabilities,
    config: PlayerConfig,

    queue: Queue,
    policy: OrderingPolicy,
    transport: TransportSync,
    advance: AutoAdvance,

    next_load_id: u64,
    pending: Option<PendingLoad>,

    // Event queue for UI synchronization
    pending_events: Vec<PlayerEvent>,
}

impl<E: AudioEngine> PlaybackController<E> {
    /// Create a controller around an engine
    pub fn new(engine: E, config: PlayerConfig) -> Self {
        let capabilities = engine.capabilities();
        let queue = config.shuffle_seed.map_or_else(Queue::new, Queue::with_seed);

        Self {
            engine,
            capabilities,
            queue,
            policy: OrderingPolicy::new(config.initial_repeat, config.restart_threshold_ms),
            transport: TransportSync::new(capabilities.time_unit),
            advance: AutoAdvance::new(),
            next_load_id: 0,
            pending: None,
            pending_events: Vec::new(),
            config,
        }
    }

    // ===== Control API =====

    /// Replace the queue with `playlist` and start playing `track`
    ///
    /// `start_index` should point at `track` in `playlist`; if it does not,
    /// the occurrence of `track` closest to it is used. An empty playlist
    /// plays `track` alone. With shuffle on, the new queue is shuffled with
    /// `track` first.
    pub async fn play_from_playlist(
        &mut self,
        track: Track,
        playlist: Vec<Track>,
        start_index: usize,
    ) -> Result<Outcome> {
        let tracks = if playlist.is_empty() {
            vec![track.clone()]
        } else {
            playlist
        };

        let start = match tracks.get(start_index) {
            Some(t) if t.id == track.id => start_index,
            _ => {
                let nearest = tracks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.id == track.id)
                    .map(|(pos, _)| pos)
                    .min_by_key(|pos| pos.abs_diff(start_index));
                match nearest {
                    Some(pos) => pos,
                    None => {
                        warn!(track_id = %track.id, "requested track is not in the playlist");
                        return Ok(Outcome::NoOp);
                    }
                }
            }
        };

        let rollback = self.queue.clone();
        self.queue.set_queue(tracks, start);
        self.emit_queue_changed();

        // Release whatever the engine holds before binding the new track
        self.release_engine().await;

        self.load_current(rollback, true).await
    }

    /// Pause if playing, play if paused
    pub async fn toggle_play_pause(&mut self) -> Result<Outcome> {
        if self.queue.current().is_none() {
            return Ok(Outcome::NoOp);
        }

        if let Some(pending) = self.pending.as_mut() {
            // Still loading: decide whether it starts once loaded
            pending.autoplay = !pending.autoplay;
            return Ok(Outcome::Applied);
        }

        if self.transport.bound().is_none() {
            // Stopped or a failed load: bind the current track again
            let rollback = self.queue.clone();
            return self.load_current(rollback, true).await;
        }

        if self.transport.is_ended() {
            self.restart_current().await?;
            self.pending_events.push(PlayerEvent::StateChanged { playing: true });
            return Ok(Outcome::Applied);
        }

        let playing = !self.transport.status().playing;
        if playing {
            self.engine
                .play()
                .await
                .map_err(|e| PlaybackError::transport("play", e))?;
        } else {
            self.engine
                .pause()
                .await
                .map_err(|e| PlaybackError::transport("pause", e))?;
        }

        self.transport.set_playing(playing);
        self.pending_events.push(PlayerEvent::StateChanged { playing });
        Ok(Outcome::Applied)
    }

    /// Seek the current track; range clamping is left to the engine
    pub async fn seek(&mut self, position_ms: u64) -> Result<Outcome> {
        if self.queue.current().is_none() || self.transport.bound().is_none() {
            return Ok(Outcome::NoOp);
        }

        self.engine
            .seek(position_ms)
            .await
            .map_err(|e| PlaybackError::transport("seek", e))?;

        if self.transport.is_ended() {
            // Leaving the frozen end: the track may finish again
            self.advance.arm();
        }
        self.transport.set_position(position_ms);
        Ok(Outcome::Applied)
    }

    /// Skip to the next track per the ordering policy
    ///
    /// At the end of the queue (no repeat-queue) nothing is loaded and playback stops.
    pub async fn next(&mut self) -> Result<Outcome> {
        let Some(index) = self.queue.current_index() else {
            return Ok(Outcome::NoOp);
        };

        match self.policy.next_step(index, self.queue.len()) {
            Some(NextStep::Advance(next)) => self.jump(next).await,
            Some(NextStep::RepeatTrack | NextStep::End) => {
                self.halt().await?;
                Ok(Outcome::NoOp)
            }
            None => Ok(Outcome::NoOp),
        }
    }

    /// Go to the previous track, or restart the current one
    ///
    /// More than the restart threshold (3 s by default) into the track, or at
    /// the start of the queue without repeat-queue, the current track restarts.
    pub async fn previous(&mut self) -> Result<Outcome> {
        let Some(index) = self.queue.current_index() else {
            return Ok(Outcome::NoOp);
        };

        let position_ms = self.transport.status().position_ms;
        match self.policy.previous_step(index, self.queue.len(), position_ms) {
            Some(PreviousStep::Retreat(prev)) => self.jump(prev).await,
            Some(PreviousStep::Restart) => self.restart_from_top().await,
            None => Ok(Outcome::NoOp),
        }
    }

    /// Load and play the track at `index`, bypassing the ordering policy
    pub async fn jump_to_index(&mut self, index: usize) -> Result<Outcome> {
        self.jump(index).await
    }

    /// Flip shuffle; returns the new state
    ///
    /// Enabling pins the current track at index 0 of a fresh permutation.
    /// Disabling restores the original order and refocuses the current track.
    pub fn toggle_shuffle(&mut self) -> bool {
        let shuffle = !self.queue.is_shuffled();
        self.queue.set_shuffle(shuffle);
        if let Some(pending) = self.pending.as_mut() {
            // A failed load rolls back the track change, not the toggle
            pending.rollback.set_shuffle(shuffle);
        }

        info!(shuffle, index = ?self.queue.current_index(), "shuffle toggled");
        self.emit_queue_changed();
        shuffle
    }

    /// Advance the repeat mode (Off → Track → Queue → Off); returns the new mode
    pub async fn cycle_repeat_mode(&mut self) -> Result<RepeatMode> {
        let previous = self.policy.repeat();
        let mode = self.policy.cycle_repeat();
        info!(?mode, "repeat mode cycled");
        self.pending_events.push(PlayerEvent::RepeatChanged { mode });

        let touches_loop = mode == RepeatMode::Track || previous == RepeatMode::Track;
        if touches_loop && self.uses_native_loop() && self.pending.is_none() && self.transport.bound().is_some() {
            // A pending load picks the flag up when it completes
            self.engine
                .set_looping(mode == RepeatMode::Track)
                .await
                .map_err(|e| PlaybackError::transport("set_looping", e))?;
        }

        Ok(mode)
    }

    /// Stop playback and release the engine resource; the queue is kept
    pub async fn stop(&mut self) -> Result<Outcome> {
        self.pending = None;
        self.advance.disarm();

        let result = if self.engine.bound().is_some() {
            self.engine
                .stop()
                .await
                .map_err(|e| PlaybackError::transport("stop", e))
        } else {
            Ok(())
        };

        self.transport.clear();
        self.pending_events.push(PlayerEvent::StateChanged { playing: false });
        result.map(|()| Outcome::Applied)
    }

    /// Tear the controller down, releasing the engine
    pub async fn shutdown(mut self) -> Result<()> {
        self.pending = None;
        if self.engine.bound().is_some() {
            self.engine
                .stop()
                .await
                .map_err(|e| PlaybackError::transport("stop", e))?;
        }
        info!("playback controller shut down");
        Ok(())
    }

    // ===== Engine callbacks =====

    /// React to an engine notification
    ///
    /// Returns the completion when an authoritative load finished.
    pub async fn handle_event(&mut self, event: EngineEvent) -> Option<LoadCompletion> {
        match event {
            EngineEvent::Loaded { id, result } => self.complete_load(id, result).await,
            EngineEvent::Status(raw) => {
                self.apply_status(raw).await;
                None
            }
        }
    }

    /// Ask the engine for its status (for engines that do not push)
    pub async fn poll(&mut self) {
        if self.engine.bound().is_none() {
            return;
        }

        match self.engine.poll_status().await {
            Ok(raw) => self.apply_status(raw).await,
            Err(e) => debug!(error = %e, "status poll failed"),
        }
    }

    // ===== State Queries =====

    /// Read-only view for rendering
    pub fn snapshot(&self) -> PlayerSnapshot {
        let status = self.transport.status();
        PlayerSnapshot {
            current_track: self.queue.current().cloned(),
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
            playing: status.playing,
            buffering: status.buffering,
            position_ms: status.position_ms,
            duration_ms: status.duration_ms,
            shuffle: self.queue.is_shuffled(),
            repeat_mode: self.policy.repeat(),
        }
    }

    pub fn status(&self) -> &PlaybackStatus {
        self.transport.status()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.policy.repeat()
    }

    pub fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    /// Load still waiting for its completion, if any
    pub fn pending_load(&self) -> Option<LoadId> {
        self.pending.as_ref().map(|p| p.id)
    }

    /// Drain events produced since the last call
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Take the engine's event channel (available once)
    pub fn take_engine_events(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.engine.take_events()
    }

    // ===== Internals =====

    /// Move to `index` and load it
    async fn jump(&mut self, index: usize) -> Result<Outcome> {
        let rollback = self.queue.clone();
        if !self.queue.advance_to(index) {
            return Ok(Outcome::NoOp);
        }
        self.load_current(rollback, true).await
    }

    /// Issue a load for the current track, superseding any in-flight load
    async fn load_current(&mut self, rollback: Queue, autoplay: bool) -> Result<Outcome> {
        let Some(track) = self.queue.current().cloned() else {
            return Ok(Outcome::NoOp);
        };

        self.next_load_id += 1;
        let id = LoadId(self.next_load_id);
        debug!(%id, track_id = %track.id, uri = %track.uri, "loading track");

        let request = LoadRequest {
            id,
            uri: track.uri.clone(),
        };
        if let Err(e) = self.engine.load(request).await {
            warn!(%id, uri = %track.uri, error = %e, "engine rejected load");
            self.queue = rollback;
            return Err(PlaybackError::EngineLoad {
                uri: track.uri,
                reason: e.to_string(),
            });
        }

        if let Some(previous) = self.pending.take() {
            debug!(superseded = %previous.id, by = %id, "superseding in-flight load");
        }

        self.advance.disarm();
        self.transport.reset_for(id);
        self.pending = Some(PendingLoad {
            id,
            track,
            autoplay,
            rollback,
        });

        Ok(Outcome::Loading(id))
    }

    async fn complete_load(
        &mut self,
        id: LoadId,
        result: std::result::Result<(), EngineError>,
    ) -> Option<LoadCompletion> {
        // The engine's bound resource decides, not the order completions arrive in
        let authoritative = self.engine.bound() == Some(id) && self.pending_load() == Some(id);
        if !authoritative {
            debug!(%id, bound = ?self.engine.bound(), "ignoring completion of superseded load");
            return None;
        }
        let pending = self.pending.take()?;

        match result {
            Ok(()) => {
                let result = self.start_loaded(pending).await;
                Some(LoadCompletion { id, result })
            }
            Err(e) => {
                warn!(%id, uri = %pending.track.uri, error = %e, "load failed, rolling back");
                self.queue = pending.rollback;
                self.transport.clear();
                self.advance.disarm();

                let error = PlaybackError::EngineLoad {
                    uri: pending.track.uri,
                    reason: e.to_string(),
                };
                self.pending_events.push(PlayerEvent::Error {
                    message: error.to_string(),
                });
                self.pending_events.push(PlayerEvent::StateChanged { playing: false });
                Some(LoadCompletion {
                    id,
                    result: Err(error),
                })
            }
        }
    }

    /// Commit a freshly loaded track: arm auto-advance, set looping, play
    async fn start_loaded(&mut self, pending: PendingLoad) -> Result<Track> {
        self.transport.mark_loaded();
        self.advance.arm();
        self.sync_native_loop().await;

        let index = self.queue.current_index().unwrap_or(0);
        self.pending_events.push(PlayerEvent::TrackChanged {
            track_id: pending.track.id.clone(),
            index,
        });

        if pending.autoplay {
            if let Err(e) = self.engine.play().await {
                warn!(track_id = %pending.track.id, error = %e, "engine refused to start playback");
                self.transport.set_playing(false);
                let error = PlaybackError::transport("play", e);
                self.pending_events.push(PlayerEvent::Error {
                    message: error.to_string(),
                });
                return Err(error);
            }
            self.transport.set_playing(true);
            self.pending_events.push(PlayerEvent::StateChanged { playing: true });
        }

        info!(track_id = %pending.track.id, index, "now playing");
        Ok(pending.track)
    }

    async fn apply_status(&mut self, raw: RawStatus) {
        let was_playing = self.transport.status().playing;
        let Some(update) = self.transport.apply(raw) else {
            return;
        };

        if update.finished && self.advance.consume() {
            self.on_track_finished().await;
        } else if was_playing != self.transport.status().playing {
            self.pending_events.push(PlayerEvent::StateChanged {
                playing: self.transport.status().playing,
            });
        }
    }

    /// The single reaction to a genuine end of track
    async fn on_track_finished(&mut self) {
        let action =
            AutoAdvance::decide(&self.policy, self.queue.current_index(), self.queue.len());
        debug!(?action, "track finished");

        match action {
            AdvanceAction::Restart => {
                if let Err(e) = self.restart_current().await {
                    warn!(error = %e, "could not loop track");
                    self.transport.freeze_at_end();
                    self.pending_events.push(PlayerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
            AdvanceAction::Play(index) => {
                if let Err(e) = self.jump(index).await {
                    warn!(index, error = %e, "auto-advance load failed");
                    self.pending_events.push(PlayerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
            AdvanceAction::Stop => {
                info!("queue ended");
                self.transport.freeze_at_end();
                self.pending_events.push(PlayerEvent::QueueEnded);
                self.pending_events.push(PlayerEvent::StateChanged { playing: false });
            }
        }
    }

    /// Seek the bound track to 0 and play it again
    async fn restart_current(&mut self) -> Result<()> {
        self.engine
            .seek(0)
            .await
            .map_err(|e| PlaybackError::transport("seek", e))?;
        self.engine
            .play()
            .await
            .map_err(|e| PlaybackError::transport("play", e))?;

        self.transport.restart();
        self.transport.set_playing(true);
        self.advance.arm();
        Ok(())
    }

    /// "Previous" that stays on the current track
    async fn restart_from_top(&mut self) -> Result<Outcome> {
        if self.pending.is_some() {
            // Loading from 0 already
            return Ok(Outcome::NoOp);
        }

        if self.transport.bound().is_none() {
            let rollback = self.queue.clone();
            return self.load_current(rollback, true).await;
        }

        self.engine
            .seek(0)
            .await
            .map_err(|e| PlaybackError::transport("seek", e))?;
        self.transport.restart();
        self.advance.arm();
        Ok(Outcome::Applied)
    }

    /// Stop at the end of the queue without moving
    async fn halt(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.as_mut() {
            pending.autoplay = false;
            return Ok(());
        }

        if self.transport.status().playing {
            self.engine
                .pause()
                .await
                .map_err(|e| PlaybackError::transport("pause", e))?;
            self.transport.set_playing(false);
            self.pending_events.push(PlayerEvent::StateChanged { playing: false });
        }
        Ok(())
    }

    /// Stop and unbind the engine resource before a wholesale queue change
    async fn release_engine(&mut self) {
        self.pending = None;
        self.advance.disarm();

        if self.engine.bound().is_some() {
            if let Err(e) = self.engine.stop().await {
                warn!(error = %e, "failed to release previous track");
            }
        }
        self.transport.clear();
    }

    fn uses_native_loop(&self) -> bool {
        self.capabilities.native_loop && self.config.prefer_native_loop
    }

    /// Put the engine's loop flag in line with the repeat mode before playback
    async fn sync_native_loop(&mut self) {
        if !self.uses_native_loop() {
            return;
        }

        let looping = self.policy.repeat() == RepeatMode::Track;
        if let Err(e) = self.engine.set_looping(looping).await {
            warn!(looping, error = %e, "native loop unavailable, restarting manually");
        }
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlayerEvent::QueueChanged {
            length: self.queue.len(),
            shuffle: self.queue.is_shuffled(),
        });
    }
}
