//! Elapsed-time accounting
//!
//! `PlayClock` never counts ticks. While running it remembers the instant it
//! was anchored and the elapsed time at that instant; the current position is
//! derived from the runtime clock on demand. Missed or late timer wakeups
//! therefore never lose or double-count time, and a paused tokio clock makes
//! the whole thing deterministic under test.
//!
//! Every change of anchor bumps `generation`. A `CompletionTimer` carries the
//! generation it was computed against; a timer whose generation no longer
//! matches is stale and must be ignored.

use std::time::Duration;
use tokio::time::Instant;

use super::state::NORMAL_SPEED;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Scheduled end-of-episode wakeup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTimer {
    /// Episode the timer was scheduled for
    pub uri: String,
    /// Clock generation at scheduling time
    pub generation: u64,
    /// Instant at which the episode reaches its duration
    pub deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct PlayClock {
    /// Elapsed media time at `anchor` (or while stopped)
    base: Duration,
    /// Set while running
    anchor: Option<Instant>,
    /// Media time per wall-clock second
    speed: Duration,
    generation: u64,
}

impl PlayClock {
    pub fn new() -> Self {
        Self {
            base: Duration::ZERO,
            anchor: None,
            speed: NORMAL_SPEED,
            generation: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn speed(&self) -> Duration {
        self.speed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Elapsed media time at `now`
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => self
                .base
                .saturating_add(self.scale(now.saturating_duration_since(anchor))),
            None => self.base,
        }
    }

    /// Start advancing from the current position
    pub fn start(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
            self.generation += 1;
        }
    }

    /// Freeze at the position reached at `now`
    pub fn stop(&mut self, now: Instant) {
        if self.anchor.is_some() {
            self.base = self.elapsed(now);
            self.anchor = None;
            self.generation += 1;
        }
    }

    /// Jump to `position`, keeping the running state
    pub fn reset_to(&mut self, position: Duration, now: Instant) {
        self.base = position;
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
        self.generation += 1;
    }

    /// Change speed without moving the current position
    pub fn set_speed(&mut self, speed: Duration, now: Instant) {
        if speed.is_zero() || speed == self.speed {
            return;
        }
        self.base = self.elapsed(now);
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
        self.speed = speed;
        self.generation += 1;
    }

    /// Instant at which elapsed time reaches `target`
    ///
    /// None while stopped, or when the target lies beyond the range of
    /// `Instant` (the target is never reached). Never earlier than the
    /// anchor, so a target that is already behind resolves to the anchor
    /// instant rather than `now`.
    pub fn instant_reaching(&self, target: Duration) -> Option<Instant> {
        let anchor = self.anchor?;
        let remaining = target.saturating_sub(self.base);
        anchor.checked_add(self.unscale(remaining))
    }

    /// Build the completion timer for an episode of `duration`
    pub fn completion_timer(&self, uri: &str, duration: Duration) -> Option<CompletionTimer> {
        self.instant_reaching(duration).map(|deadline| CompletionTimer {
            uri: uri.to_string(),
            generation: self.generation,
            deadline,
        })
    }

    /// Wall time -> media time, saturating at `Duration::MAX`
    fn scale(&self, wall: Duration) -> Duration {
        if self.speed == NORMAL_SPEED {
            return wall;
        }
        match wall.as_nanos().checked_mul(self.speed.as_nanos()) {
            Some(product) => duration_from_nanos(product / NANOS_PER_SEC),
            None => Duration::MAX,
        }
    }

    /// Media time -> wall time, rounded up so `scale(unscale(x)) >= x`
    ///
    /// Saturates at `Duration::MAX`.
    fn unscale(&self, media: Duration) -> Duration {
        if self.speed == NORMAL_SPEED {
            return media;
        }
        let speed = self.speed.as_nanos();
        media
            .as_nanos()
            .checked_mul(NANOS_PER_SEC)
            .and_then(|n| n.checked_add(speed - 1))
            .map_or(Duration::MAX, |n| duration_from_nanos(n / speed))
    }
}

impl Default for PlayClock {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    match u64::try_from(nanos / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_stopped_clock_does_not_advance() {
        let t0 = Instant::now();
        let clock = PlayClock::new();
        assert_eq!(clock.elapsed(t0 + secs(10)), Duration::ZERO);
        assert!(clock.instant_reaching(secs(5)).is_none());
    }

    #[test]
    fn test_running_clock_tracks_wall_time() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);
        assert_eq!(clock.elapsed(t0 + secs(3)), secs(3));

        clock.stop(t0 + secs(3));
        assert_eq!(clock.elapsed(t0 + secs(100)), secs(3));

        clock.start(t0 + secs(10));
        assert_eq!(clock.elapsed(t0 + secs(12)), secs(5));
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);
        let generation = clock.generation();
        clock.start(t0 + secs(1));
        assert_eq!(clock.generation(), generation);
        assert_eq!(clock.elapsed(t0 + secs(2)), secs(2));

        clock.stop(t0 + secs(2));
        let generation = clock.generation();
        clock.stop(t0 + secs(5));
        assert_eq!(clock.generation(), generation);
        assert_eq!(clock.elapsed(t0 + secs(5)), secs(2));
    }

    #[test]
    fn test_reset_reanchors_running_clock() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);
        clock.reset_to(secs(30), t0 + secs(5));
        assert_eq!(clock.elapsed(t0 + secs(7)), secs(32));
    }

    #[test]
    fn test_double_speed() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);
        clock.set_speed(secs(2), t0 + secs(1));
        assert_eq!(clock.elapsed(t0 + secs(4)), secs(7));
        assert_eq!(clock.instant_reaching(secs(11)), Some(t0 + secs(6)));
    }

    #[test]
    fn test_unscale_rounds_up() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.set_speed(Duration::from_millis(1500), t0);
        clock.start(t0);

        let target = Duration::from_millis(1000);
        let at = clock.instant_reaching(target).unwrap();
        assert!(clock.elapsed(at) >= target);
    }

    #[test]
    fn test_zero_speed_is_ignored() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.set_speed(Duration::ZERO, t0);
        assert_eq!(clock.speed(), NORMAL_SPEED);
    }

    #[test]
    fn test_unreachable_target_has_no_deadline() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);
        assert!(clock.instant_reaching(Duration::MAX).is_none());
        assert!(clock.completion_timer("long", Duration::MAX).is_none());
        assert_eq!(clock.elapsed(t0 + secs(3)), secs(3));
    }

    #[test]
    fn test_extreme_speeds_saturate_instead_of_overflowing() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.set_speed(Duration::from_nanos(1), t0);
        clock.start(t0);
        let target = Duration::from_millis(i64::MAX as u64);
        assert!(clock.instant_reaching(target).is_none());

        let mut fast = PlayClock::new();
        fast.set_speed(Duration::MAX, t0);
        fast.start(t0);
        fast.reset_to(secs(10), t0);
        assert_eq!(fast.elapsed(t0 + secs(1_000_000)), Duration::MAX);
    }

    #[test]
    fn test_completion_timer_carries_generation() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.start(t0);

        let timer = clock.completion_timer("uri1", secs(60)).unwrap();
        assert_eq!(timer.deadline, t0 + secs(60));
        assert_eq!(timer.generation, clock.generation());

        clock.reset_to(Duration::ZERO, t0 + secs(1));
        assert_ne!(timer.generation, clock.generation());
    }
}
