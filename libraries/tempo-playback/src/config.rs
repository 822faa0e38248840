//! Player configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PlaybackError, Result};
use crate::ordering::RESTART_THRESHOLD_MS;
use crate::types::RepeatMode;

/// Upper bound on the status poll interval
const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration for the playback controller and its service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Status poll interval for engines that do not push (default: 1000, max: 1000)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Position after which "previous" restarts the track (default: 3000)
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,

    /// Capacity of the command channel (default: 32)
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Capacity of the event broadcast channel (default: 64)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Repeat mode at startup (default: Off)
    #[serde(default)]
    pub initial_repeat: RepeatMode,

    /// Use the engine's native loop for repeat-track when it has one (default: true)
    #[serde(default = "default_prefer_native_loop")]
    pub prefer_native_loop: bool,

    /// Fixed shuffle seed for reproducible orders (default: none)
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl PlayerConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables are prefixed with `TEMPO_`, e.g.
    /// `TEMPO_POLL_INTERVAL_MS=500`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TEMPO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))
    }

    /// Poll interval, clamped to the 1 s granularity the status contract requires
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }
}

fn default_poll_interval_ms() -> u64 {
    MAX_POLL_INTERVAL_MS
}

fn default_restart_threshold_ms() -> u64 {
    RESTART_THRESHOLD_MS
}

fn default_command_buffer() -> usize {
    32
}

fn default_event_buffer() -> usize {
    64
}

fn default_prefer_native_loop() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            restart_threshold_ms: default_restart_threshold_ms(),
            command_buffer: default_command_buffer(),
            event_buffer: default_event_buffer(),
            initial_repeat: RepeatMode::Off,
            prefer_native_loop: default_prefer_native_loop(),
            shuffle_seed: None,
        }
    }
}
