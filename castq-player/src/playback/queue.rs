//! Episode queue
//!
//! Pending episodes, consumed strictly from the head on advance.
//! Insertion order is playback order and duplicates are allowed.

use castq_common::Episode;
use std::collections::VecDeque;

/// Ordered list of episodes waiting to play after the current one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeQueue {
    entries: VecDeque<Episode>,
}

impl EpisodeQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to end of queue
    pub fn enqueue(&mut self, episode: Episode) {
        self.entries.push_back(episode);
    }

    /// Insert episodes ahead of everything already queued, keeping their order
    pub fn prepend<I>(&mut self, episodes: I)
    where
        I: IntoIterator<Item = Episode>,
        I::IntoIter: DoubleEndedIterator,
    {
        for episode in episodes.into_iter().rev() {
            self.entries.push_front(episode);
        }
    }

    /// Pop the head of the queue
    ///
    /// Returns None if the queue is empty
    pub fn advance(&mut self) -> Option<Episode> {
        self.entries.pop_front()
    }

    /// Peek at the head of the queue
    pub fn peek(&self) -> Option<&Episode> {
        self.entries.front()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Episode> {
        self.entries.iter()
    }

    /// Copy of the queue contents in playback order
    pub fn to_vec(&self) -> Vec<Episode> {
        self.entries.iter().cloned().collect()
    }
}
