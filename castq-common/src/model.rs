//! Episode value type
//!
//! An `Episode` is immutable once constructed. The playback engine only
//! interprets `uri` (identity) and `duration` (completion bound); every other
//! field is descriptive metadata passed through untouched.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A playable podcast episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EpisodeRecord", into = "EpisodeRecord")]
pub struct Episode {
    uri: String,
    duration: Option<Duration>,
    title: Option<String>,
    podcast_title: Option<String>,
    author: Option<String>,
    summary: Option<String>,
    published: Option<DateTime<Utc>>,
    artwork_url: Option<String>,
}

impl Episode {
    /// Create an episode with a known duration
    ///
    /// Unchecked: the uri is taken as given. Use `try_new` for input that
    /// has not been validated.
    pub fn new(uri: impl Into<String>, duration: Duration) -> Self {
        Self::bare(uri.into(), Some(duration))
    }

    /// Create an episode with a known duration, rejecting an empty uri
    pub fn try_new(uri: impl Into<String>, duration: Duration) -> Result<Self> {
        let uri = checked_uri(uri.into())?;
        Ok(Self::bare(uri, Some(duration)))
    }

    /// Create an episode whose duration is not known yet
    ///
    /// Behaves as a zero-length episode for seeking and completion.
    pub fn without_duration(uri: impl Into<String>) -> Self {
        Self::bare(uri.into(), None)
    }

    /// Create an episode from a signed millisecond duration
    ///
    /// Negative durations and empty URIs are rejected here so that playback
    /// never has to deal with them.
    pub fn from_millis(uri: impl Into<String>, duration_ms: i64) -> Result<Self> {
        let uri = checked_uri(uri.into())?;
        let millis = u64::try_from(duration_ms).map_err(|_| {
            Error::InvalidInput(format!(
                "episode {} has negative duration: {}ms",
                uri, duration_ms
            ))
        })?;
        Ok(Self::bare(uri, Some(Duration::from_millis(millis))))
    }

    fn bare(uri: String, duration: Option<Duration>) -> Self {
        Self {
            uri,
            duration,
            title: None,
            podcast_title: None,
            author: None,
            summary: None,
            published: None,
            artwork_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_podcast_title(mut self, podcast_title: impl Into<String>) -> Self {
        self.podcast_title = Some(podcast_title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_artwork_url(mut self, artwork_url: impl Into<String>) -> Self {
        self.artwork_url = Some(artwork_url.into());
        self
    }

    /// Opaque unique identifier
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Declared duration, `None` when unknown
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Duration used as the playback bound (unknown counts as zero)
    pub fn playable_duration(&self) -> Duration {
        self.duration.unwrap_or(Duration::ZERO)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn podcast_title(&self) -> Option<&str> {
        self.podcast_title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published
    }

    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork_url.as_deref()
    }

    /// Title if present, otherwise the uri
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.uri)
    }
}

fn checked_uri(uri: String) -> Result<String> {
    if uri.trim().is_empty() {
        return Err(Error::InvalidInput("episode uri must not be empty".to_string()));
    }
    Ok(uri)
}

/// Serialized form of an episode (playlist files, JSON snapshots)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podcast_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
}

impl TryFrom<EpisodeRecord> for Episode {
    type Error = Error;

    fn try_from(record: EpisodeRecord) -> Result<Self> {
        let mut episode = match record.duration_ms {
            Some(ms) => Episode::from_millis(record.uri, ms)?,
            None => Episode::without_duration(checked_uri(record.uri)?),
        };
        episode.title = record.title;
        episode.podcast_title = record.podcast_title;
        episode.author = record.author;
        episode.summary = record.summary;
        episode.published = record.published;
        episode.artwork_url = record.artwork_url;
        Ok(episode)
    }
}

impl From<Episode> for EpisodeRecord {
    fn from(episode: Episode) -> Self {
        Self {
            uri: episode.uri,
            duration_ms: episode
                .duration
                .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX)),
            title: episode.title,
            podcast_title: episode.podcast_title,
            author: episode.author,
            summary: episode.summary,
            published: episode.published,
            artwork_url: episode.artwork_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_rejects_negative_duration() {
        let err = Episode::from_millis("uri1", -1).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_from_millis_rejects_empty_uri() {
        assert!(Episode::from_millis("  ", 1000).is_err());
    }

    #[test]
    fn test_try_new_rejects_empty_uri() {
        let err = Episode::try_new("", Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(Episode::try_new(" \t", Duration::from_secs(60)).is_err());

        let episode = Episode::try_new("uri1", Duration::from_secs(60)).unwrap();
        assert_eq!(episode, Episode::new("uri1", Duration::from_secs(60)));
    }

    #[test]
    fn test_deserialize_rejects_empty_uri_without_duration() {
        assert!(serde_json::from_str::<Episode>(r#"{"uri":""}"#).is_err());
    }

    #[test]
    fn test_from_millis_zero_is_valid() {
        let episode = Episode::from_millis("uri1", 0).unwrap();
        assert_eq!(episode.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_unknown_duration_plays_as_zero() {
        let episode = Episode::without_duration("uri1");
        assert_eq!(episode.duration(), None);
        assert_eq!(episode.playable_duration(), Duration::ZERO);
    }

    #[test]
    fn test_metadata_is_passed_through() {
        let episode = Episode::new("uri1", Duration::from_secs(60))
            .with_title("Pilot")
            .with_podcast_title("Now in Android")
            .with_author("Android DevRel");

        assert_eq!(episode.title(), Some("Pilot"));
        assert_eq!(episode.podcast_title(), Some("Now in Android"));
        assert_eq!(episode.display_name(), "Pilot");
        assert_eq!(Episode::without_duration("uri2").display_name(), "uri2");
    }

    #[test]
    fn test_json_form_uses_milliseconds() {
        let episode = Episode::new("uri1", Duration::from_millis(1500)).with_title("Pilot");
        let json = serde_json::to_value(&episode).unwrap();
        assert_eq!(json["uri"], "uri1");
        assert_eq!(json["duration_ms"], 1500);
        assert!(json.get("author").is_none());

        let parsed: Episode = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, episode);
    }

    #[test]
    fn test_deserialize_rejects_negative_duration() {
        let result = serde_json::from_str::<Episode>(r#"{"uri":"uri1","duration_ms":-5}"#);
        assert!(result.is_err());
    }
}
