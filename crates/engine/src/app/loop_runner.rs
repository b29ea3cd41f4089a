use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::animation::{PlaybackConfig, PlaybackFrame};
use crate::editor::Editor;

use super::metrics::{FrameSample, LoopMetricsSnapshot, MetricsAccumulator};

#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// Presentation rate. Simulation ticks run at the playback tick rate.
    pub render_fps: u32,
    /// Hard stop even if playback has not finished.
    pub max_duration: Option<Duration>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            render_fps: 30,
            max_duration: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("playback could not start while a route gesture is active")]
    NotStarted,
    #[error("failed to present frame at tick {tick}: {source}")]
    Present {
        tick: u64,
        #[source]
        source: io::Error,
    },
}

/// Receives every presented frame.
pub trait FrameSink {
    fn present(&mut self, frame: &PlaybackFrame) -> io::Result<()>;
}

/// Drops frames; used when only the logs matter.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &PlaybackFrame) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per frame.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, frame: &PlaybackFrame) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub frames: u64,
    pub ticks: u64,
    pub elapsed: Duration,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub ticks_run: u32,
    pub dropped_backlog: Duration,
    pub frame: PlaybackFrame,
    pub metrics: Option<LoopMetricsSnapshot>,
}

/// Fixed-timestep driver for one playback run.
///
/// Each frame clamps the wall-clock delta, converts it into whole
/// simulation ticks on a fixed grid and drops any backlog beyond the
/// per-frame tick cap. Pursuit advances once per tick; everything else is
/// sampled at the frame instant.
#[derive(Debug)]
pub struct PlaybackDriver {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    last_frame: Instant,
    sim_time: Instant,
    metrics: MetricsAccumulator,
}

impl PlaybackDriver {
    pub fn new(config: &PlaybackConfig, now: Instant) -> Self {
        let target_tps = config.target_tps.max(1);
        let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
        let max_frame_delta =
            normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
        let metrics_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        Self {
            fixed_dt,
            max_frame_delta,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            last_frame: now,
            sim_time: now,
            metrics: MetricsAccumulator::new(metrics_interval, now),
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn advance(&mut self, editor: &mut Editor, now: Instant) -> FrameOutcome {
        let raw_frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        let clamped = clamp_frame_delta(raw_frame_dt, self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped);

        let plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        for _ in 0..plan.ticks_to_run {
            self.sim_time += self.fixed_dt;
            editor.tick(self.sim_time);
        }
        self.accumulator = plan.remaining_accumulator;
        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
            self.sim_time = now;
        }

        self.metrics.record(FrameSample {
            frame_dt: raw_frame_dt,
            ticks: plan.ticks_to_run,
            dropped_backlog: plan.dropped_backlog,
        });
        FrameOutcome {
            ticks_run: plan.ticks_to_run,
            dropped_backlog: plan.dropped_backlog,
            frame: editor.frame(now),
            metrics: self.metrics.maybe_snapshot(now),
        }
    }
}

/// Plays the editor's board in real time until playback finishes or
/// `max_duration` passes, presenting frames at `render_fps`.
pub fn run_playback(
    editor: &mut Editor,
    config: &LoopConfig,
    sink: &mut dyn FrameSink,
) -> Result<PlaybackSummary, LoopError> {
    let start = Instant::now();
    if !editor.play(start) {
        return Err(LoopError::NotStarted);
    }
    let playback_config = editor.playback().config().clone();
    let mut driver = PlaybackDriver::new(&playback_config, start);
    let frame_target = target_frame_duration(config.render_fps);
    info!(
        target_tps = playback_config.target_tps.max(1),
        render_fps = config.render_fps.max(1),
        max_frame_delta_ms = playback_config.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = playback_config.max_ticks_per_frame.max(1),
        max_duration_ms = config.max_duration.map(|limit| limit.as_millis() as u64),
        duration_ms = editor.playback().duration().as_millis() as u64,
        "loop_config"
    );

    let mut frames = 0u64;
    let mut last_present = start;
    loop {
        let sleep = compute_cap_sleep(last_present.elapsed(), frame_target);
        if sleep > Duration::ZERO {
            thread::sleep(sleep);
        }

        let now = Instant::now();
        let outcome = driver.advance(editor, now);
        last_present = Instant::now();
        sink.present(&outcome.frame)
            .map_err(|source| LoopError::Present {
                tick: outcome.frame.tick,
                source,
            })?;
        frames += 1;

        if let Some(snapshot) = outcome.metrics {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_ms = snapshot.worst_frame_ms,
                clamped_frames = snapshot.clamped_frames,
                dropped_backlog_ms = snapshot.dropped_backlog_ms,
                entity_count = editor.board().entity_count(),
                "loop_metrics"
            );
        }

        let elapsed = now.saturating_duration_since(start);
        let timed_out = config.max_duration.is_some_and(|limit| elapsed >= limit);
        if outcome.frame.finished || timed_out {
            let summary = PlaybackSummary {
                frames,
                ticks: outcome.frame.tick,
                elapsed,
                finished: outcome.frame.finished,
            };
            editor.stop();
            info!(
                frames = summary.frames,
                ticks = summary.ticks,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                finished = summary.finished,
                "playback_finished"
            );
            return Ok(summary);
        }
    }
}

struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn target_frame_duration(render_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / render_fps.max(1) as f64)
}

fn compute_cap_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
