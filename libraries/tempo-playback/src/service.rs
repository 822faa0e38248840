//! Player service
//!
//! Runs a [`PlaybackController`] on its own task. Screens talk to it through
//! a cloneable [`PlayerHandle`]: commands go in over a channel and are
//! executed one at a time, state comes back as a [`PlayerSnapshot`] watch and
//! a [`PlayerEvent`] broadcast.
//!
//! A command that starts a load is answered when that load completes, or
//! with [`Outcome::Superseded`] once a newer request took its place.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::controller::{LoadCompletion, PlaybackController};
use crate::engine::{AudioEngine, EngineEvent, LoadId};
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::types::{Outcome, PlayerSnapshot, RepeatMode, Track};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests accepted by the service task
#[derive(Debug)]
enum Command {
    PlayFromPlaylist {
        track: Track,
        playlist: Vec<Track>,
        start_index: usize,
        reply: Reply<Outcome>,
    },
    TogglePlayPause {
        reply: Reply<Outcome>,
    },
    Seek {
        position_ms: u64,
        reply: Reply<Outcome>,
    },
    Next {
        reply: Reply<Outcome>,
    },
    Previous {
        reply: Reply<Outcome>,
    },
    JumpToIndex {
        index: usize,
        reply: Reply<Outcome>,
    },
    ToggleShuffle {
        reply: Reply<bool>,
    },
    CycleRepeatMode {
        reply: Reply<RepeatMode>,
    },
    Stop {
        reply: Reply<Outcome>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Cloneable access to a running player
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    /// Replace the queue and play `track`
    ///
    /// Resolves to [`Outcome::Playing`] once the track is loaded and playing.
    pub async fn play_from_playlist(
        &self,
        track: Track,
        playlist: Vec<Track>,
        start_index: usize,
    ) -> Result<Outcome> {
        self.request(|reply| Command::PlayFromPlaylist {
            track,
            playlist,
            start_index,
            reply,
        })
        .await
    }

    pub async fn toggle_play_pause(&self) -> Result<Outcome> {
        self.request(|reply| Command::TogglePlayPause { reply }).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<Outcome> {
        self.request(|reply| Command::Seek { position_ms, reply })
            .await
    }

    pub async fn next(&self) -> Result<Outcome> {
        self.request(|reply| Command::Next { reply }).await
    }

    pub async fn previous(&self) -> Result<Outcome> {
        self.request(|reply| Command::Previous { reply }).await
    }

    pub async fn jump_to_index(&self, index: usize) -> Result<Outcome> {
        self.request(|reply| Command::JumpToIndex { index, reply })
            .await
    }

    /// Flip shuffle; resolves to the new state
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        self.request(|reply| Command::ToggleShuffle { reply }).await
    }

    /// Advance the repeat mode; resolves to the new mode
    pub async fn cycle_repeat_mode(&self) -> Result<RepeatMode> {
        self.request(|reply| Command::CycleRepeatMode { reply })
            .await
    }

    pub async fn stop(&self) -> Result<Outcome> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Stop the service and release the engine
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified whenever the published state changes
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)?
    }
}

/// Task owning the controller
pub struct PlayerService<E: AudioEngine> {
    controller: PlaybackController<E>,
    snapshot: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<PlayerEvent>,

    /// Callers waiting for their load to complete
    waiters: BTreeMap<LoadId, Reply<Outcome>>,

    poll_interval: Duration,
}

impl<E: AudioEngine + 'static> PlayerService<E> {
    /// Spawn the service on the current tokio runtime
    pub fn spawn(engine: E, config: PlayerConfig) -> (PlayerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (event_tx, _) = broadcast::channel(config.event_buffer.max(1));
        let poll_interval = config.poll_interval();

        let controller = PlaybackController::new(engine, config);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let service = Self {
            controller,
            snapshot: snapshot_tx,
            events: event_tx.clone(),
            waiters: BTreeMap::new(),
            poll_interval,
        };

        let task = tokio::spawn(service.run(command_rx));
        let handle = PlayerHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            events: event_tx,
        };

        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut engine_events = self.controller.take_engine_events();
        if engine_events.is_none() {
            warn!("engine has no event channel, loads will never complete");
        }

        let polling = !self.controller.capabilities().push_status;
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(polling, "player service started");

        let mut shutdown_reply = None;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    Some(command) => self.dispatch(command).await,
                    // Every handle dropped
                    None => break,
                },
                event = next_engine_event(&mut engine_events) => match event {
                    Some(event) => {
                        if let Some(completion) = self.controller.handle_event(event).await {
                            self.resolve(completion);
                        }
                    }
                    None => {
                        warn!("engine event channel closed");
                        engine_events = None;
                    }
                },
                _ = poll.tick(), if polling => self.controller.poll().await,
            }

            self.release_superseded();
            self.publish();
        }

        let Self {
            controller,
            waiters,
            ..
        } = self;
        // Outstanding callers see the service as closed
        drop(waiters);

        let result = controller.shutdown().await;
        if let Err(e) = &result {
            warn!(error = %e, "engine did not stop cleanly");
        }
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(result);
        }

        info!("player service stopped");
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::PlayFromPlaylist {
                track,
                playlist,
                start_index,
                reply,
            } => {
                let result = self
                    .controller
                    .play_from_playlist(track, playlist, start_index)
                    .await;
                self.settle(result, reply);
            }
            Command::TogglePlayPause { reply } => {
                let result = self.controller.toggle_play_pause().await;
                self.settle(result, reply);
            }
            Command::Seek { position_ms, reply } => {
                let result = self.controller.seek(position_ms).await;
                self.settle(result, reply);
            }
            Command::Next { reply } => {
                let result = self.controller.next().await;
                self.settle(result, reply);
            }
            Command::Previous { reply } => {
                let result = self.controller.previous().await;
                self.settle(result, reply);
            }
            Command::JumpToIndex { index, reply } => {
                let result = self.controller.jump_to_index(index).await;
                self.settle(result, reply);
            }
            Command::ToggleShuffle { reply } => {
                let _ = reply.send(Ok(self.controller.toggle_shuffle()));
            }
            Command::CycleRepeatMode { reply } => {
                let _ = reply.send(self.controller.cycle_repeat_mode().await);
            }
            Command::Stop { reply } => {
                let result = self.controller.stop().await;
                self.settle(result, reply);
            }
            Command::Shutdown { reply } => {
                // Handled by the run loop
                let _ = reply.send(Ok(()));
            }
        }
    }

    /// Answer now, or park the reply until the load completes
    fn settle(&mut self, result: Result<Outcome>, reply: Reply<Outcome>) {
        match result {
            Ok(Outcome::Loading(id)) => {
                self.waiters.insert(id, reply);
            }
            other => {
                let _ = reply.send(other);
            }
        }
    }

    fn resolve(&mut self, completion: LoadCompletion) {
        if let Some(reply) = self.waiters.remove(&completion.id) {
            let _ = reply.send(completion.result.map(Outcome::Playing));
        }
    }

    /// Answer every waiter whose load is no longer the pending one
    fn release_superseded(&mut self) {
        let pending = self.controller.pending_load();
        let stale: Vec<LoadId> = self
            .waiters
            .keys()
            .copied()
            .filter(|id| Some(*id) != pending)
            .collect();

        for id in stale {
            if let Some(reply) = self.waiters.remove(&id) {
                debug!(%id, "request superseded");
                let _ = reply.send(Ok(Outcome::Superseded));
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = self.controller.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        for event in self.controller.take_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

async fn next_engine_event(
    events: &mut Option<mpsc::UnboundedReceiver<EngineEvent>>,
) -> Option<EngineEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}
