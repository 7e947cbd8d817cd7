//! Playback engine and queue management

pub mod clock;
mod commands;
pub mod core;
pub mod engine;
pub mod queue;
pub mod state;

pub use engine::PlaybackEngine;
pub use queue::EpisodeQueue;
pub use state::{PlaybackStatus, PlayerState, MAX_SPEED, MIN_SPEED, NORMAL_SPEED};
