//! # castq Player Library (castq-player)
//!
//! Episode playback engine: owns what is currently playing, advances through
//! a queue when an episode finishes, and supports manual navigation and
//! seeking under real or simulated time.
//!
//! **Architecture:** one engine task is the only writer of the player state.
//! Handles dispatch commands to it over a channel; observers read the latest
//! snapshot from a watch cell and optional change events from a broadcast
//! channel.

pub mod error;
pub mod playback;
pub mod state;

pub use castq_common::Episode;
pub use error::{Error, Result};
pub use playback::{PlaybackEngine, PlaybackStatus, PlayerState};
pub use state::SharedState;
