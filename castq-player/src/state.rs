//! Shared player state
//!
//! Publication side of the engine: the latest `PlayerState` snapshot in a
//! watch cell, plus a broadcast channel of `PlayerEvent`s.
//!
//! The snapshot cell delivers "latest value plus change notification": a
//! late subscriber sees the current snapshot immediately, never a backlog.

use castq_common::PlayerEvent;
use tokio::sync::{broadcast, watch};

use crate::playback::PlayerState;

/// Shared state accessible by the engine task and every handle
pub struct SharedState {
    /// Latest snapshot; written only by the engine task
    snapshot_tx: watch::Sender<PlayerState>,

    /// Event broadcaster for change notifications
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl SharedState {
    /// Create shared state holding `initial` as the first snapshot
    pub fn new(initial: PlayerState, event_capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            snapshot_tx,
            event_tx,
        }
    }

    /// Replace the snapshot atomically
    ///
    /// Subscribers are only notified if the snapshot actually changed.
    pub fn publish(&self, state: PlayerState) -> bool {
        self.snapshot_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }

    /// Clone of the latest snapshot
    pub fn current(&self) -> PlayerState {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.snapshot_tx.subscribe()
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: PlayerEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(PlayerState::default(), 100)
    }
}
