//! Event types for castq change notifications
//!
//! Events describe transitions of the playback engine. They complement the
//! latest-value snapshot; subscribers that need the full state read the
//! snapshot, not an event history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playing flag flipped
    PlaybackStateChanged {
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// A new current episode became active
    EpisodeStarted {
        uri: String,
        timestamp: DateTime<Utc>,
    },

    /// Current episode left the player
    ///
    /// `completed` is true when the episode reached its end while playing,
    /// false when it was skipped or replaced.
    EpisodeCompleted {
        uri: String,
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    /// Queue contents changed (notification only)
    QueueChanged {
        length: usize,
        timestamp: DateTime<Utc>,
    },

    /// Episode ended naturally with nothing left to play
    QueueExhausted {
        uri: String,
        timestamp: DateTime<Utc>,
    },

    /// Position moved by seek, rewind, advance or restart
    Seeked {
        uri: String,
        position_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Playback speed changed (media milliseconds per wall-clock second)
    SpeedChanged {
        speed_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Event type name, as written in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::EpisodeStarted { .. } => "EpisodeStarted",
            PlayerEvent::EpisodeCompleted { .. } => "EpisodeCompleted",
            PlayerEvent::QueueChanged { .. } => "QueueChanged",
            PlayerEvent::QueueExhausted { .. } => "QueueExhausted",
            PlayerEvent::Seeked { .. } => "Seeked",
            PlayerEvent::SpeedChanged { .. } => "SpeedChanged",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PlayerEvent::PlaybackStateChanged { timestamp, .. }
            | PlayerEvent::EpisodeStarted { timestamp, .. }
            | PlayerEvent::EpisodeCompleted { timestamp, .. }
            | PlayerEvent::QueueChanged { timestamp, .. }
            | PlayerEvent::QueueExhausted { timestamp, .. }
            | PlayerEvent::Seeked { timestamp, .. }
            | PlayerEvent::SpeedChanged { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let event = PlayerEvent::EpisodeCompleted {
            uri: "uri1".to_string(),
            completed: true,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["completed"], true);
    }

    #[test]
    fn test_timestamp_accessor() {
        let timestamp = Utc::now();
        let event = PlayerEvent::QueueChanged { length: 3, timestamp };
        assert_eq!(event.timestamp(), timestamp);
    }
}
