use std::time::{Duration, Instant};

/// Shared start time for one playback run. Every animated position is a
/// function of `now - started_at`, never of accumulated frame deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationClock {
    started_at: Option<Instant>,
}

impl AnimationClock {
    pub fn started(now: Instant) -> Self {
        Self {
            started_at: Some(now),
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// Returns whether the clock was running.
    pub fn stop(&mut self) -> bool {
        self.started_at.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time since start, zero while stopped.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }
}
