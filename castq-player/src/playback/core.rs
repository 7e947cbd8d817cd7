//! Player state machine
//!
//! **Responsibilities:**
//! - Current episode, queue, playing flag and elapsed time
//! - Every transition (play, pause, next, previous, seek, queue edits)
//! - Auto-advance when the current episode reaches its duration
//! - Change events for subscribers
//!
//! `PlayerCore` is synchronous and clock-agnostic: every operation receives
//! the instant it is applied at. The engine task is its only writer.
//!
//! Each operation first calls `catch_up(now)`, so time-driven completions
//! that fell due before a command are applied before the command itself.
//! A manual `next()` can therefore never race with an automatic advance.

use castq_common::{Episode, PlayerEvent};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::clock::{CompletionTimer, PlayClock};
use super::queue::EpisodeQueue;
use super::state::{PlayerState, MAX_SPEED, MIN_SPEED};

#[derive(Debug, Default)]
pub struct PlayerCore {
    current: Option<Episode>,
    queue: EpisodeQueue,
    clock: PlayClock,

    /// Playing state captured by `on_seeking_started`
    resume_after_seek: bool,

    /// Events produced since the last `drain_events`
    outbox: Vec<PlayerEvent>,
}

impl PlayerCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Core preloaded with an initial episode set
    ///
    /// The first episode becomes current (paused), the rest are queued.
    pub fn with_episodes(episodes: Vec<Episode>) -> Self {
        let mut core = Self::new();
        let mut episodes = episodes.into_iter();
        core.current = episodes.next();
        for episode in episodes {
            core.queue.enqueue(episode);
        }
        core
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &EpisodeQueue {
        &self.queue
    }

    /// Position within the current episode, clamped to its duration
    pub fn elapsed(&self, now: Instant) -> Duration {
        match &self.current {
            Some(episode) => self.clock.elapsed(now).min(episode.playable_duration()),
            None => Duration::ZERO,
        }
    }

    /// Snapshot of the observable state at `now`
    pub fn snapshot(&self, now: Instant) -> PlayerState {
        PlayerState {
            current_episode: self.current.clone(),
            queue: self.queue.to_vec(),
            is_playing: self.is_playing(),
            time_elapsed: self.elapsed(now),
            playback_speed: self.clock.speed(),
        }
    }

    /// Take the events produced so far
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ---------------------------------------------------------------------
    // Time-driven transitions
    // ---------------------------------------------------------------------

    /// Next end-of-episode wakeup, if playing
    pub fn completion_timer(&self) -> Option<CompletionTimer> {
        let episode = self.current.as_ref()?;
        self.clock
            .completion_timer(episode.uri(), episode.playable_duration())
    }

    /// Handle a fired completion timer
    ///
    /// Returns false if the timer was stale (scheduled against an episode or
    /// clock anchor that has since changed) and was ignored. The engine task
    /// rebuilds its timer before every wait, so only a timer held across a
    /// transition can be stale.
    pub fn on_completion_due(&mut self, timer: &CompletionTimer, now: Instant) -> bool {
        let same_episode = self.current.as_ref().map(|e| e.uri()) == Some(timer.uri.as_str());
        if !same_episode || timer.generation != self.clock.generation() {
            debug!(
                "Ignoring stale completion timer for {} (generation {} != {})",
                timer.uri,
                timer.generation,
                self.clock.generation()
            );
            return false;
        }
        self.catch_up(now);
        true
    }

    /// Apply every completion that fell due up to `now`
    ///
    /// Completions cascade: each following episode is anchored at the
    /// instant the previous one ended, so a large jump in time plays through
    /// as many queued episodes as it covers.
    pub fn catch_up(&mut self, now: Instant) {
        loop {
            let Some(episode) = self.current.as_ref() else {
                return;
            };
            let duration = episode.playable_duration();
            let Some(ends_at) = self.clock.instant_reaching(duration) else {
                return;
            };
            if ends_at > now {
                return;
            }
            self.complete_current(duration, ends_at);
        }
    }

    /// Natural end of the current episode at `at`
    fn complete_current(&mut self, duration: Duration, at: Instant) {
        let Some(finished) = self.current.take() else {
            return;
        };
        debug!("Episode {} reached its end", finished.uri());
        self.emit(|timestamp| PlayerEvent::EpisodeCompleted {
            uri: finished.uri().to_string(),
            completed: true,
            timestamp,
        });

        match self.queue.advance() {
            Some(next) => {
                info!("Auto-advancing to {}", next.uri());
                self.clock.reset_to(Duration::ZERO, at);
                self.start_episode(next);
                self.emit_queue_changed();
            }
            None => {
                info!("Queue exhausted after {}, stopping", finished.uri());
                self.clock.stop(at);
                self.clock.reset_to(duration, at);
                self.emit(|timestamp| PlayerEvent::QueueExhausted {
                    uri: finished.uri().to_string(),
                    timestamp,
                });
                self.emit_playing_changed(false);
                self.current = Some(finished);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Replace the current episode; elapsed resets and playback pauses
    pub fn set_current_episode(&mut self, episode: Episode, now: Instant) {
        self.catch_up(now);
        info!("Setting current episode: {}", episode.uri());

        if self.clock.is_running() {
            self.clock.stop(now);
            self.emit_playing_changed(false);
        }
        self.resume_after_seek = false;
        self.skip_current();
        self.clock.reset_to(Duration::ZERO, now);
        self.start_episode(episode);
    }

    pub fn play(&mut self, now: Instant) {
        self.catch_up(now);
        if self.current.is_none() {
            debug!("Play ignored: no current episode");
            return;
        }
        if self.clock.is_running() {
            return;
        }

        info!("Playback started");
        self.clock.start(now);
        self.emit_playing_changed(true);
        // An episode already at its end completes immediately
        self.catch_up(now);
    }

    /// Make `episodes[0]` current, queue the rest ahead of existing entries, play
    pub fn play_episodes(&mut self, episodes: Vec<Episode>, now: Instant) {
        let mut episodes = episodes.into_iter();
        let Some(first) = episodes.next() else {
            debug!("Play episodes ignored: empty list");
            return;
        };
        let rest: Vec<Episode> = episodes.collect();

        self.set_current_episode(first, now);
        if !rest.is_empty() {
            self.queue.prepend(rest);
            self.emit_queue_changed();
        }
        self.play(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.catch_up(now);
        self.resume_after_seek = false;
        if !self.clock.is_running() {
            return;
        }

        info!("Playback paused at {:?}", self.elapsed(now));
        self.clock.stop(now);
        self.emit_playing_changed(false);
    }

    /// Pause and rewind to the start of the current episode
    pub fn stop(&mut self, now: Instant) {
        self.pause(now);
        if self.current.is_some() {
            self.move_to(Duration::ZERO, now);
        }
    }

    pub fn add_to_queue(&mut self, episode: Episode, now: Instant) {
        self.catch_up(now);
        debug!("Queueing {}", episode.uri());
        self.queue.enqueue(episode);
        self.emit_queue_changed();
    }

    pub fn remove_all_from_queue(&mut self, now: Instant) {
        self.catch_up(now);
        if self.queue.is_empty() {
            return;
        }
        self.queue.clear();
        self.emit_queue_changed();
    }

    /// Skip to the queue head; no-op on an empty queue
    pub fn next(&mut self, now: Instant) {
        self.catch_up(now);
        let Some(next) = self.queue.advance() else {
            debug!("Next ignored: queue is empty");
            return;
        };

        info!("Skipping to {}", next.uri());
        self.skip_current();
        self.clock.reset_to(Duration::ZERO, now);
        self.start_episode(next);
        self.emit_queue_changed();
    }

    /// Restart the current episode
    pub fn previous(&mut self, now: Instant) {
        self.catch_up(now);
        if self.current.is_some() {
            self.move_to(Duration::ZERO, now);
        }
    }

    /// Seek to a signed millisecond position, clamped to `[0, duration]`
    pub fn seek_to_millis(&mut self, position_ms: i64, now: Instant) {
        let position = Duration::from_millis(u64::try_from(position_ms).unwrap_or(0));
        self.seek_to(position, now);
    }

    /// Seek to `position`, clamped to the episode duration
    pub fn seek_to(&mut self, position: Duration, now: Instant) {
        self.catch_up(now);
        let Some(duration) = self.current.as_ref().map(|e| e.playable_duration()) else {
            debug!("Seek ignored: no current episode");
            return;
        };
        self.move_to(position.min(duration), now);
        // Seeking to the very end while playing completes the episode
        self.catch_up(now);
    }

    pub fn advance_by(&mut self, delta: Duration, now: Instant) {
        self.catch_up(now);
        let target = self.elapsed(now).saturating_add(delta);
        self.seek_to(target, now);
    }

    pub fn rewind_by(&mut self, delta: Duration, now: Instant) {
        self.catch_up(now);
        let target = self.elapsed(now).saturating_sub(delta);
        self.seek_to(target, now);
    }

    /// Scrubbing started: suspend the timer, remember whether to resume
    pub fn on_seeking_started(&mut self, now: Instant) {
        self.catch_up(now);
        let was_playing = self.clock.is_running();
        self.pause(now);
        self.resume_after_seek = was_playing;
    }

    /// Scrubbing finished: seek, then resume if playback was running
    pub fn on_seeking_finished(&mut self, position: Duration, now: Instant) {
        let resume = std::mem::take(&mut self.resume_after_seek);
        self.seek_to(position, now);
        if resume {
            self.play(now);
        }
    }

    pub fn increase_speed(&mut self, step: Duration, now: Instant) {
        let speed = self.clock.speed().saturating_add(step);
        self.set_speed(speed, now);
    }

    /// Slow down by `step`; ignored if the result would not be positive
    pub fn decrease_speed(&mut self, step: Duration, now: Instant) {
        match self.clock.speed().checked_sub(step) {
            Some(speed) if !speed.is_zero() => self.set_speed(speed, now),
            _ => debug!("Decrease speed ignored: speed would drop to zero"),
        }
    }

    /// Set the playback speed, clamped to `[MIN_SPEED, MAX_SPEED]`; zero is ignored
    pub fn set_speed(&mut self, speed: Duration, now: Instant) {
        self.catch_up(now);
        if speed.is_zero() {
            debug!("Set speed ignored: zero speed");
            return;
        }
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        if speed == self.clock.speed() {
            return;
        }
        info!("Playback speed {:?} -> {:?}", self.clock.speed(), speed);
        self.clock.set_speed(speed, now);
        self.emit(|timestamp| PlayerEvent::SpeedChanged {
            speed_ms: duration_millis(speed),
            timestamp,
        });
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn move_to(&mut self, position: Duration, now: Instant) {
        self.clock.reset_to(position, now);
        if let Some(episode) = &self.current {
            let uri = episode.uri().to_string();
            self.emit(|timestamp| PlayerEvent::Seeked {
                uri,
                position_ms: duration_millis(position),
                timestamp,
            });
        }
    }

    /// Current episode leaves without completing
    fn skip_current(&mut self) {
        if let Some(previous) = self.current.take() {
            self.emit(|timestamp| PlayerEvent::EpisodeCompleted {
                uri: previous.uri().to_string(),
                completed: false,
                timestamp,
            });
        }
    }

    fn start_episode(&mut self, episode: Episode) {
        let uri = episode.uri().to_string();
        self.current = Some(episode);
        self.emit(|timestamp| PlayerEvent::EpisodeStarted { uri, timestamp });
    }

    fn emit_playing_changed(&mut self, playing: bool) {
        self.emit(|timestamp| PlayerEvent::PlaybackStateChanged { playing, timestamp });
    }

    fn emit_queue_changed(&mut self) {
        let length = self.queue.len();
        self.emit(|timestamp| PlayerEvent::QueueChanged { length, timestamp });
    }

    fn emit(&mut self, build: impl FnOnce(chrono::DateTime<Utc>) -> PlayerEvent) {
        self.outbox.push(build(Utc::now()));
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
