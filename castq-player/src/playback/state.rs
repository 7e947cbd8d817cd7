//! Player state snapshot

use castq_common::Episode;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Default playback speed: one second of media per wall-clock second
pub const NORMAL_SPEED: Duration = Duration::from_secs(1);

/// Slowest accepted playback speed (0.1x)
pub const MIN_SPEED: Duration = Duration::from_millis(100);

/// Fastest accepted playback speed (16x)
pub const MAX_SPEED: Duration = Duration::from_secs(16);

/// Derived playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No current episode
    Idle,
    /// Current episode set, timer not running
    Paused,
    /// Current episode set, timer running
    Playing,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Playing => write!(f, "playing"),
        }
    }
}

/// Immutable snapshot of everything the engine exposes
///
/// Replaced as a whole on every change; observers never see fields from two
/// different transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    /// Episode presently active
    pub current_episode: Option<Episode>,

    /// Episodes pending playback after the current one, in playback order
    pub queue: Vec<Episode>,

    /// Whether elapsed time is advancing
    pub is_playing: bool,

    /// Position within `current_episode`
    #[serde(rename = "time_elapsed_ms", serialize_with = "serialize_millis")]
    pub time_elapsed: Duration,

    /// Media time advanced per wall-clock second
    #[serde(rename = "playback_speed_ms", serialize_with = "serialize_millis")]
    pub playback_speed: Duration,
}

impl PlayerState {
    /// Status derived from current episode and playing flag
    pub fn status(&self) -> PlaybackStatus {
        match (&self.current_episode, self.is_playing) {
            (None, _) => PlaybackStatus::Idle,
            (Some(_), false) => PlaybackStatus::Paused,
            (Some(_), true) => PlaybackStatus::Playing,
        }
    }

    /// Time left in the current episode (zero when idle)
    pub fn remaining(&self) -> Duration {
        self.current_episode
            .as_ref()
            .map(|e| e.playable_duration().saturating_sub(self.time_elapsed))
            .unwrap_or(Duration::ZERO)
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.current_episode.as_ref().map(|e| e.uri())
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_episode: None,
            queue: Vec::new(),
            is_playing: false,
            time_elapsed: Duration::ZERO,
            playback_speed: NORMAL_SPEED,
        }
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}
