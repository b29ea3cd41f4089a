use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use super::AnimationClock;
use crate::board::{Board, CoveragePattern, EntityId, Player};
use crate::geometry::{position_at_distance, Vec2};

pub const DEFAULT_SPEED_PX_PER_SEC: f32 = 100.0;
pub const DEFAULT_PURSUIT_STEP_RATIO: f32 = 0.10;
pub const DEFAULT_PURSUIT_STEP_CAP_PX: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub speed_px_per_sec: f32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Share of the remaining distance a pursuing defender covers per tick.
    pub pursuit_step_ratio: f32,
    /// Upper bound on one pursuit step, in pixels.
    pub pursuit_step_cap_px: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_px_per_sec: DEFAULT_SPEED_PX_PER_SEC,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            pursuit_step_ratio: DEFAULT_PURSUIT_STEP_RATIO,
            pursuit_step_cap_px: DEFAULT_PURSUIT_STEP_CAP_PX,
        }
    }
}

impl PlaybackConfig {
    /// Speed used for motion. Non-positive or non-finite values fall back to
    /// the default so durations stay finite.
    pub fn effective_speed(&self) -> f32 {
        if self.speed_px_per_sec.is_finite() && self.speed_px_per_sec > 0.0 {
            self.speed_px_per_sec
        } else {
            DEFAULT_SPEED_PX_PER_SEC
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DefenseMotion {
    Zone { rest: Vec2, target: Vec2 },
    Pursuit { position: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentPosition {
    pub id: EntityId,
    pub position: Vec2,
}

/// Everything an external renderer needs for one presented frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackFrame {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub finished: bool,
    pub offense: Vec<AgentPosition>,
    pub defense: Vec<AgentPosition>,
}

/// One playback run over a board.
///
/// Offense players and zone defenders are pure functions of elapsed time.
/// Pursuing defenders carry their own position and advance once per
/// `tick`, chasing the live animated position of their target.
#[derive(Debug, Clone)]
pub struct Playback {
    config: PlaybackConfig,
    clock: AnimationClock,
    duration: Duration,
    defense: Vec<(EntityId, DefenseMotion)>,
    ticks: u64,
}

impl Playback {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            clock: AnimationClock::default(),
            duration: Duration::ZERO,
            defense: Vec::new(),
            ticks: 0,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Starts (or restarts) playback from the board's rest positions.
    ///
    /// Defenders map to pattern slots by their index in the defense list;
    /// defenders beyond the pattern, or every defender under man coverage,
    /// pursue instead.
    pub fn start(&mut self, board: &Board, pattern: Option<&CoveragePattern>, now: Instant) {
        let speed = self.config.effective_speed();
        if speed != self.config.speed_px_per_sec {
            warn!(
                configured = self.config.speed_px_per_sec,
                fallback = speed,
                "invalid playback speed; using default"
            );
        }
        let longest = board
            .routes()
            .iter()
            .filter(|route| route.drives_playback())
            .map(|route| route.length())
            .fold(0.0f32, f32::max);
        self.duration = Duration::try_from_secs_f32(longest / speed).unwrap_or(Duration::MAX);
        self.defense = board
            .defense()
            .iter()
            .enumerate()
            .map(|(slot, defender)| {
                let target =
                    pattern.and_then(|pattern| pattern.target_for_slot(slot, board.field()));
                let motion = match target {
                    Some(target) => DefenseMotion::Zone {
                        rest: defender.position,
                        target,
                    },
                    None => DefenseMotion::Pursuit {
                        position: defender.position,
                    },
                };
                (defender.id, motion)
            })
            .collect();
        self.ticks = 0;
        self.clock.start(now);

        let zone_count = self
            .defense
            .iter()
            .filter(|(_, motion)| matches!(motion, DefenseMotion::Zone { .. }))
            .count();
        info!(
            duration_ms = self.duration.as_millis() as u64,
            speed_px_per_sec = speed,
            pattern = pattern.map_or("none", |pattern| pattern.name.as_str()),
            offense_count = board.offense().len(),
            zone_defenders = zone_count,
            pursuit_defenders = self.defense.len() - zone_count,
            "playback_started"
        );
    }

    /// Stops playback and returns everyone to rest. Safe to call after the
    /// run already finished or was never started.
    pub fn stop(&mut self) -> bool {
        let was_running = self.clock.stop();
        self.defense.clear();
        self.ticks = 0;
        if was_running {
            info!("playback_stopped");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.is_running() && self.elapsed(now) >= self.duration
    }

    /// Advances every pursuing defender by one step.
    pub fn tick(&mut self, board: &Board, now: Instant) {
        if !self.is_running() {
            return;
        }
        let elapsed = self.elapsed(now).as_secs_f32();
        let offense = board
            .offense()
            .iter()
            .map(|player| (player.id, self.offense_position(board, player, elapsed)))
            .collect::<Vec<_>>();
        let ratio = self.config.pursuit_step_ratio;
        let cap = self.config.pursuit_step_cap_px;

        for (id, motion) in &mut self.defense {
            let DefenseMotion::Pursuit { position } = motion else {
                continue;
            };
            let assigned = board
                .find_player(*id)
                .and_then(|defender| defender.assigned_to)
                .and_then(|target| offense.iter().find(|(offense_id, _)| *offense_id == target));
            let target = assigned
                .or_else(|| nearest(&offense, *position))
                .map(|(_, target)| *target);
            if let Some(target) = target {
                *position = pursuit_step(*position, target, ratio, cap);
            }
        }
        self.ticks += 1;
    }

    /// Animated position of any player on the board. Before start or after
    /// stop this is the rest position.
    pub fn position_of(&self, board: &Board, id: EntityId, now: Instant) -> Option<Vec2> {
        let player = board.find_player(id)?;
        if !self.is_running() {
            return Some(player.position);
        }
        if board.offense().iter().any(|candidate| candidate.id == id) {
            let elapsed = self.elapsed(now).as_secs_f32();
            return Some(self.offense_position(board, player, elapsed));
        }
        let motion = self
            .defense
            .iter()
            .find(|(defender, _)| *defender == id)
            .map(|(_, motion)| *motion);
        Some(match motion {
            Some(DefenseMotion::Zone { rest, target }) => {
                let travelled = self.elapsed(now).as_secs_f32() * self.config.effective_speed();
                zone_position(rest, target, travelled)
            }
            Some(DefenseMotion::Pursuit { position }) => position,
            None => player.position,
        })
    }

    pub fn frame(&self, board: &Board, now: Instant) -> PlaybackFrame {
        let collect = |players: &[Player]| {
            players
                .iter()
                .filter_map(|player| {
                    self.position_of(board, player.id, now)
                        .map(|position| AgentPosition {
                            id: player.id,
                            position,
                        })
                })
                .collect::<Vec<_>>()
        };
        PlaybackFrame {
            tick: self.ticks,
            elapsed_ms: self.elapsed(now).as_millis() as u64,
            finished: self.is_finished(now),
            offense: collect(board.offense()),
            defense: collect(board.defense()),
        }
    }

    fn offense_position(&self, board: &Board, player: &Player, elapsed_secs: f32) -> Vec2 {
        let Some(route) = board.playback_route(player.id) else {
            return player.position;
        };
        let travelled = (elapsed_secs * self.config.effective_speed()).min(route.length());
        position_at_distance(&route.points, travelled).unwrap_or(player.position)
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

fn nearest(candidates: &[(EntityId, Vec2)], from: Vec2) -> Option<&(EntityId, Vec2)> {
    let mut best: Option<(&(EntityId, Vec2), f32)> = None;
    for candidate in candidates {
        let distance = candidate.1.distance(from);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Moves `from` toward `target` by `min(ratio * distance, cap)`, never past
/// the target. Coincident points stay put.
pub fn pursuit_step(from: Vec2, target: Vec2, ratio: f32, cap: f32) -> Vec2 {
    let distance = from.distance(target);
    if distance <= f32::EPSILON {
        return from;
    }
    let step = (distance * ratio).min(cap).min(distance);
    from + (target - from) * (step / distance)
}

/// Zone defender `travelled` pixels into its straight run to `target`.
pub fn zone_position(rest: Vec2, target: Vec2, travelled: f32) -> Vec2 {
    let distance = rest.distance(target);
    if distance <= f32::EPSILON {
        return target;
    }
    rest.lerp(target, (travelled / distance).clamp(0.0, 1.0))
}
