//! Shared helpers for the playback integration tests
//!
//! `ScriptedEngine` records every call and never completes a load on its
//! own: the test decides when (and how) each load finishes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};
use tempo_playback::{
    AudioEngine, EngineCapabilities, EngineError, EngineEvent, LoadId, LoadRequest, RawStatus,
    TimeUnit, Track,
};
use tokio::sync::mpsc;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ===== Fixtures =====

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {}", id),
        "Test Artist",
        format!("http://localhost:8000/api/download/{}", id),
    )
}

pub fn playlist(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

// ===== Scripted engine =====

/// Engine call as recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Seek(u64),
    Stop,
    SetLooping(bool),
}

#[derive(Debug, Default)]
struct EngineState {
    calls: Vec<Call>,
    loads: Vec<LoadRequest>,
    bound: Option<LoadId>,
    reject_loads: bool,
    reject_play: bool,
    reject_looping: bool,
    poll: RawStatus,
}

pub struct ScriptedEngine {
    capabilities: EngineCapabilities,
    state: Arc<Mutex<EngineState>>,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

/// Test-side control over a [`ScriptedEngine`] the controller owns
#[derive(Clone)]
pub struct EngineScript {
    state: Arc<Mutex<EngineState>>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl ScriptedEngine {
    pub fn new() -> (Self, EngineScript) {
        Self::with_capabilities(EngineCapabilities::default())
    }

    pub fn with_capabilities(capabilities: EngineCapabilities) -> (Self, EngineScript) {
        let state = Arc::new(Mutex::new(EngineState::default()));
        let (tx, rx) = mpsc::unbounded_channel();

        let engine = Self {
            capabilities,
            state: Arc::clone(&state),
            events: Some(rx),
        };
        let script = EngineScript { state, events: tx };
        (engine, script)
    }

    /// Poll-only engine reporting in seconds
    pub fn polling_seconds() -> (Self, EngineScript) {
        Self::with_capabilities(EngineCapabilities {
            time_unit: TimeUnit::Seconds,
            native_loop: false,
            push_status: false,
        })
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl AudioEngine for ScriptedEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    async fn load(&mut self, request: LoadRequest) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Load(request.uri.clone()));
        if state.reject_loads {
            return Err(EngineError::new("load rejected"));
        }
        state.bound = Some(request.id);
        state.loads.push(request);
        Ok(())
    }

    async fn play(&mut self) -> Result<(), EngineError> {
        self.record(Call::Play);
        if self.state.lock().unwrap().reject_play {
            return Err(EngineError::new("play rejected"));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), EngineError> {
        self.record(Call::Pause);
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.record(Call::Seek(position_ms));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.record(Call::Stop);
        self.state.lock().unwrap().bound = None;
        Ok(())
    }

    async fn set_looping(&mut self, looping: bool) -> Result<(), EngineError> {
        self.record(Call::SetLooping(looping));
        if self.state.lock().unwrap().reject_looping {
            return Err(EngineError::new("looping unavailable"));
        }
        Ok(())
    }

    fn bound(&self) -> Option<LoadId> {
        self.state.lock().unwrap().bound
    }

    async fn poll_status(&mut self) -> Result<RawStatus, EngineError> {
        Ok(self.state.lock().unwrap().poll)
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events.take()
    }
}

impl EngineScript {
    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Most recent accepted load
    pub fn last_load(&self) -> Option<LoadRequest> {
        self.state.lock().unwrap().loads.last().cloned()
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().unwrap().loads.len()
    }

    pub fn reject_loads(&self, reject: bool) {
        self.state.lock().unwrap().reject_loads = reject;
    }

    pub fn reject_play(&self, reject: bool) {
        self.state.lock().unwrap().reject_play = reject;
    }

    pub fn reject_looping(&self, reject: bool) {
        self.state.lock().unwrap().reject_looping = reject;
    }

    /// Status returned by the next polls
    pub fn set_poll(&self, status: RawStatus) {
        self.state.lock().unwrap().poll = status;
    }

    /// Push an event through the engine's channel
    pub fn push(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Complete the most recent load successfully
    pub fn complete_last(&self) -> LoadId {
        let id = self.last_load().expect("no load issued").id;
        self.push(loaded(id));
        id
    }
}

// ===== Event builders =====

pub fn loaded(id: LoadId) -> EngineEvent {
    EngineEvent::Loaded { id, result: Ok(()) }
}

pub fn load_failed(id: LoadId) -> EngineEvent {
    EngineEvent::Loaded {
        id,
        result: Err(EngineError::new("404 Not Found")),
    }
}

pub fn playing(id: LoadId, position: f64, duration: f64) -> EngineEvent {
    EngineEvent::Status(RawStatus {
        load: Some(id),
        playing: true,
        position,
        duration: Some(duration),
        buffering: false,
        did_just_finish: false,
    })
}

pub fn finished(id: LoadId, duration: f64) -> EngineEvent {
    EngineEvent::Status(RawStatus {
        load: Some(id),
        playing: false,
        position: duration,
        duration: Some(duration),
        buffering: false,
        did_just_finish: true,
    })
}
