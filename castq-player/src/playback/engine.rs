//! Playback engine - handle and engine task
//!
//! **Responsibilities:**
//! - `PlaybackEngine`: cheap-to-clone handle; every method dispatches a
//!   command and returns immediately without waiting for it to be applied
//! - `EngineTask`: the single writer. Owns `PlayerCore`, applies commands in
//!   arrival order, drives the timer, publishes snapshots and events
//!
//! The task wakes for three reasons: a command, a progress tick (only while
//! playing) or the completion deadline of the current episode. The deadline
//! is recomputed from the current clock anchor on every loop iteration, so a
//! pause, seek or episode change replaces the pending wakeup before the next
//! wait. The timer still carries the clock generation and is checked
//! against it when it fires.
//!
//! Time comes from the tokio runtime clock. Under a paused runtime clock
//! (`tokio::time::pause`, `start_paused = true`) the engine is fully
//! deterministic and simulated time is driven with `tokio::time::advance`.

use castq_common::config::PlayerSettings;
use castq_common::{Episode, PlayerEvent};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use super::commands::Command;
use super::core::PlayerCore;
use super::state::PlayerState;
use crate::error::{Error, Result};
use crate::state::SharedState;

/// Handle to a running playback engine
///
/// Cloning shares the same engine. The engine task stops when `shutdown` is
/// called or the last handle is dropped.
#[derive(Clone)]
pub struct PlaybackEngine {
    commands: mpsc::UnboundedSender<Command>,
    state: Arc<SharedState>,
    speed_step: Duration,
}

impl PlaybackEngine {
    /// Start an idle engine on the current tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(settings: &PlayerSettings) -> Self {
        Self::with_episodes(settings, Vec::new())
    }

    /// Start an engine preloaded with an initial episode set
    ///
    /// The first episode becomes current (paused), the rest are queued.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn with_episodes(settings: &PlayerSettings, episodes: Vec<Episode>) -> Self {
        Self::spawn_on(&Handle::current(), settings, episodes)
    }

    /// Start an engine preloaded from a playlist file
    pub fn from_playlist(settings: &PlayerSettings, path: &Path) -> Result<Self> {
        let episodes = castq_common::playlist::load_playlist(path)?;
        Ok(Self::with_episodes(settings, episodes))
    }

    /// Start an engine task on an explicit runtime
    pub fn spawn_on(handle: &Handle, settings: &PlayerSettings, episodes: Vec<Episode>) -> Self {
        let core = PlayerCore::with_episodes(episodes);
        let state = Arc::new(SharedState::new(
            core.snapshot(Instant::now()),
            settings.event_capacity(),
        ));
        let (commands, command_rx) = mpsc::unbounded_channel();

        let task = EngineTask {
            core,
            state: Arc::clone(&state),
            commands: command_rx,
            tick_interval: settings.tick_interval(),
        };
        handle.spawn(task.run());

        info!(
            "Playback engine created (tick interval {:?})",
            settings.tick_interval()
        );

        Self {
            commands,
            state,
            speed_step: settings.speed_step(),
        }
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Replace the current episode; elapsed resets to zero and playback pauses
    pub fn set_current_episode(&self, episode: Episode) {
        self.dispatch(Command::SetCurrentEpisode(episode));
    }

    /// Start or resume; no effect without a current episode
    pub fn play(&self) {
        self.dispatch(Command::Play);
    }

    /// Make `episode` current and start playing it
    pub fn play_episode(&self, episode: Episode) {
        self.dispatch(Command::PlayEpisodes(vec![episode]));
    }

    /// Play `episodes[0]` now, queue the rest ahead of existing entries
    pub fn play_episodes(&self, episodes: Vec<Episode>) {
        self.dispatch(Command::PlayEpisodes(episodes));
    }

    pub fn pause(&self) {
        self.dispatch(Command::Pause);
    }

    /// Pause and rewind the current episode to zero
    pub fn stop(&self) {
        self.dispatch(Command::Stop);
    }

    /// Skip to the queue head; no-op on an empty queue
    pub fn next(&self) {
        self.dispatch(Command::Next);
    }

    /// Restart the current episode
    pub fn previous(&self) {
        self.dispatch(Command::Previous);
    }

    pub fn add_to_queue(&self, episode: Episode) {
        self.dispatch(Command::AddToQueue(episode));
    }

    pub fn remove_all_from_queue(&self) {
        self.dispatch(Command::RemoveAllFromQueue);
    }

    /// Seek within the current episode, clamped to `[0, duration]`
    pub fn seek_to(&self, position: Duration) {
        self.dispatch(Command::SeekTo(position));
    }

    /// Seek using a signed position; negative values clamp to zero
    pub fn seek_to_millis(&self, position_ms: i64) {
        self.dispatch(Command::SeekToMillis(position_ms));
    }

    pub fn advance_by(&self, delta: Duration) {
        self.dispatch(Command::AdvanceBy(delta));
    }

    pub fn rewind_by(&self, delta: Duration) {
        self.dispatch(Command::RewindBy(delta));
    }

    /// User started dragging the position slider
    pub fn on_seeking_started(&self) {
        self.dispatch(Command::SeekingStarted);
    }

    /// User released the position slider at `position`
    pub fn on_seeking_finished(&self, position: Duration) {
        self.dispatch(Command::SeekingFinished(position));
    }

    /// Increase speed by the configured step
    pub fn increase_speed(&self) {
        self.increase_speed_by(self.speed_step);
    }

    pub fn increase_speed_by(&self, step: Duration) {
        self.dispatch(Command::IncreaseSpeed(step));
    }

    /// Decrease speed by the configured step
    pub fn decrease_speed(&self) {
        self.decrease_speed_by(self.speed_step);
    }

    pub fn decrease_speed_by(&self, step: Duration) {
        self.dispatch(Command::DecreaseSpeed(step));
    }

    /// Set media time per wall-clock second directly; zero is ignored
    pub fn set_speed(&self, speed: Duration) {
        self.dispatch(Command::SetSpeed(speed));
    }

    /// Wait until every command sent before this call has been applied
    pub async fn sync(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Sync(reply_tx))
            .map_err(|_| Error::EngineStopped)?;
        reply_rx.await.map_err(|_| Error::EngineStopped)
    }

    /// Stop the engine task; later commands are dropped
    pub fn shutdown(&self) {
        self.dispatch(Command::Shutdown);
    }

    /// True once the engine task has exited
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }

    // ---------------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------------

    /// Latest published snapshot
    pub fn state(&self) -> PlayerState {
        self.state.current()
    }

    /// Subscribe to snapshot changes (current value available immediately)
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }

    /// Snapshot changes as a stream, starting with the current snapshot
    pub fn state_stream(&self) -> WatchStream<PlayerState> {
        WatchStream::new(self.state.subscribe())
    }

    /// Subscribe to change-notification events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.state.subscribe_events()
    }

    fn dispatch(&self, command: Command) {
        let name = command.name();
        if self.commands.send(command).is_err() {
            warn!("Playback engine stopped, dropping {} command", name);
        }
    }
}

/// Single writer of the player state
struct EngineTask {
    core: PlayerCore,
    state: Arc<SharedState>,
    commands: mpsc::UnboundedReceiver<Command>,
    tick_interval: Duration,
}

impl EngineTask {
    async fn run(mut self) {
        info!("Playback engine task started");

        loop {
            let now = Instant::now();
            self.core.catch_up(now);
            self.publish(now);

            let completion = self.core.completion_timer();
            let completion_at = completion.as_ref().map(|t| t.deadline).unwrap_or(now);
            let playing = self.core.is_playing();

            tokio::select! {
                biased;

                _ = sleep_until(completion_at), if completion.is_some() => {
                    if let Some(timer) = &completion {
                        debug!("Completion deadline reached for {}", timer.uri);
                        self.core.on_completion_due(timer, Instant::now());
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) => {
                            info!("Shutdown command received");
                            break;
                        }
                        Some(command) => self.apply(command, Instant::now()),
                        None => {
                            debug!("All engine handles dropped");
                            break;
                        }
                    }
                }

                _ = sleep_until(now + self.tick_interval), if playing => {
                    // Loop head refreshes the elapsed time
                }
            }
        }

        let now = Instant::now();
        self.core.pause(now);
        self.publish(now);
        info!("Playback engine task stopped");
    }

    fn apply(&mut self, command: Command, now: Instant) {
        debug!("Applying {} command", command.name());
        match command {
            Command::SetCurrentEpisode(episode) => self.core.set_current_episode(episode, now),
            Command::Play => self.core.play(now),
            Command::PlayEpisodes(episodes) => self.core.play_episodes(episodes, now),
            Command::Pause => self.core.pause(now),
            Command::Stop => self.core.stop(now),
            Command::Next => self.core.next(now),
            Command::Previous => self.core.previous(now),
            Command::AddToQueue(episode) => self.core.add_to_queue(episode, now),
            Command::RemoveAllFromQueue => self.core.remove_all_from_queue(now),
            Command::SeekTo(position) => self.core.seek_to(position, now),
            Command::SeekToMillis(position_ms) => self.core.seek_to_millis(position_ms, now),
            Command::AdvanceBy(delta) => self.core.advance_by(delta, now),
            Command::RewindBy(delta) => self.core.rewind_by(delta, now),
            Command::SeekingStarted => self.core.on_seeking_started(now),
            Command::SeekingFinished(position) => self.core.on_seeking_finished(position, now),
            Command::IncreaseSpeed(step) => self.core.increase_speed(step, now),
            Command::DecreaseSpeed(step) => self.core.decrease_speed(step, now),
            Command::SetSpeed(speed) => self.core.set_speed(speed, now),
            Command::Sync(reply) => {
                self.core.catch_up(now);
                self.publish(now);
                let _ = reply.send(());
            }
            // Handled by the run loop
            Command::Shutdown => {}
        }
    }

    /// Snapshot first, then events, so an event listener reading the
    /// snapshot never sees a state older than the event
    fn publish(&mut self, now: Instant) {
        self.state.publish(self.core.snapshot(now));
        for event in self.core.drain_events() {
            self.state.broadcast_event(event);
        }
    }
}
