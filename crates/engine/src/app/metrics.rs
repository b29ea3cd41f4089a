use std::time::{Duration, Instant};

/// Per-interval loop health, logged as `loop_metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Frames whose tick backlog hit the per-frame cap.
    pub clamped_frames: u32,
    pub dropped_backlog_ms: u64,
}

/// What one presented frame did to the simulation.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameSample {
    pub(crate) frame_dt: Duration,
    pub(crate) ticks: u32,
    pub(crate) dropped_backlog: Duration,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
    clamped_frames: u32,
    dropped_backlog: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            window_start: now,
            interval,
            frames: 0,
            ticks: 0,
            frame_time_total: Duration::ZERO,
            worst_frame: Duration::ZERO,
            clamped_frames: 0,
            dropped_backlog: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, sample: FrameSample) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(sample.ticks);
        self.frame_time_total = self.frame_time_total.saturating_add(sample.frame_dt);
        self.worst_frame = self.worst_frame.max(sample.frame_dt);
        if !sample.dropped_backlog.is_zero() {
            self.clamped_frames = self.clamped_frames.saturating_add(1);
            self.dropped_backlog = self.dropped_backlog.saturating_add(sample.dropped_backlog);
        }
    }

    /// Closes the window once `interval` has passed and starts a new one.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let window = now.saturating_duration_since(self.window_start);
        if window < self.interval {
            return None;
        }

        let seconds = window.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
            dropped_backlog_ms: self.dropped_backlog.as_millis() as u64,
        };
        *self = Self::new(self.interval, now);
        Some(snapshot)
    }
}
