//! Error types for castq-player
//!
//! Engine commands are total and never fail. Errors only surface when
//! loading inputs or waiting on an engine that has already stopped.

use thiserror::Error;

/// Main error type for castq-player
#[derive(Error, Debug)]
pub enum Error {
    /// Engine task has exited
    #[error("Playback engine stopped")]
    EngineStopped,

    /// Playlist, config or episode validation error
    #[error(transparent)]
    Common(#[from] castq_common::Error),
}

/// Convenience Result type using castq-player Error
pub type Result<T> = std::result::Result<T, Error>;
