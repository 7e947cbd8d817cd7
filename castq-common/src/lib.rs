//! # castq Common Library
//!
//! Shared code for the castq playback engine and its consumers:
//! - Episode value type
//! - Change notification events (PlayerEvent enum)
//! - Playlist file loading
//! - Configuration loading
//! - Human-readable time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod model;
pub mod playlist;

pub use error::{Error, Result};
pub use events::PlayerEvent;
pub use model::Episode;
