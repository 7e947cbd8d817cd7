//! Playlist file loading
//!
//! A playlist is a TOML document listing episodes in playback order:
//!
//! ```toml
//! [[episode]]
//! uri = "https://example.com/ep1.mp3"
//! title = "Pilot"
//! duration_ms = 60000
//! ```
//!
//! Every entry is validated through the same rules as `Episode::from_millis`,
//! so a loaded playlist never carries a negative duration.

use crate::model::{Episode, EpisodeRecord};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PlaylistDocument {
    #[serde(default, rename = "episode")]
    episodes: Vec<EpisodeRecord>,
}

/// Parse a playlist document
pub fn parse_playlist(content: &str) -> Result<Vec<Episode>> {
    let document: PlaylistDocument = toml::from_str(content)?;

    document
        .episodes
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            Episode::try_from(record).map_err(|e| {
                Error::InvalidInput(format!("playlist entry {}: {}", index + 1, e))
            })
        })
        .collect()
}

/// Load a playlist file
pub fn load_playlist(path: &Path) -> Result<Vec<Episode>> {
    if !path.exists() {
        return Err(Error::NotFound(format!("playlist {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    let episodes = parse_playlist(&content)?;
    debug!("Loaded {} episodes from {}", episodes.len(), path.display());
    Ok(episodes)
}
