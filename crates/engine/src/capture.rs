use std::time::{Duration, Instant};

use tracing::debug;

use crate::board::{LineBreakType, LineStyle, RouteDraft};
use crate::geometry::{
    path_length, polyline_path, smooth_path, smooth_positions, PathDescriptor, Vec2,
};

pub const DEFAULT_PIVOT_PAUSE: Duration = Duration::from_millis(500);
pub const DEFAULT_SAMPLE_SPACING_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Rigid routes pivot when the pointer rests longer than this.
    pub pivot_pause: Duration,
    /// Smooth routes only sample once the pointer moved this far.
    pub sample_spacing_px: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            pivot_pause: DEFAULT_PIVOT_PAUSE,
            sample_spacing_px: DEFAULT_SAMPLE_SPACING_PX,
        }
    }
}

/// Drawing style picked before a route gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTool {
    pub line_break: LineBreakType,
    pub style: LineStyle,
    pub color: String,
}

impl Default for RouteTool {
    fn default() -> Self {
        Self {
            line_break: LineBreakType::Rigid,
            style: LineStyle::Solid,
            color: "#000000".to_string(),
        }
    }
}

/// An in-progress route gesture.
///
/// - `None`: exactly two points, the second follows the pointer.
/// - `Rigid`: the last point follows the pointer; resting longer than the
///   pivot pause freezes it and seeds a new segment.
/// - `Smooth` / `SmoothNone`: a point is appended every time the pointer
///   has travelled the sample spacing from the previous sample.
#[derive(Debug, Clone)]
pub struct RouteCapture {
    tool: RouteTool,
    settings: CaptureSettings,
    points: Vec<Vec2>,
    last_move_at: Instant,
    pivots: usize,
}

impl RouteCapture {
    pub fn begin(tool: RouteTool, settings: CaptureSettings, start: Vec2, now: Instant) -> Self {
        let points = if tool.line_break.is_smooth() {
            vec![start]
        } else {
            vec![start, start]
        };
        Self {
            tool,
            settings,
            points,
            last_move_at: now,
            pivots: 0,
        }
    }

    pub fn line_break(&self) -> LineBreakType {
        self.tool.line_break
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn pivots(&self) -> usize {
        self.pivots
    }

    pub fn pointer_move(&mut self, position: Vec2, now: Instant) {
        if !position.is_finite() {
            return;
        }
        match self.tool.line_break {
            LineBreakType::None => {
                if let Some(end) = self.points.last_mut() {
                    *end = position;
                }
            }
            LineBreakType::Rigid => {
                let rested = now.saturating_duration_since(self.last_move_at);
                if let Some(end) = self.points.last_mut() {
                    *end = position;
                }
                if rested > self.settings.pivot_pause {
                    self.points.push(position);
                    self.pivots += 1;
                    debug!(
                        pivots = self.pivots,
                        rested_ms = rested.as_millis() as u64,
                        "route_pivot"
                    );
                }
            }
            LineBreakType::Smooth | LineBreakType::SmoothNone => {
                let far_enough = self.points.last().map_or(true, |last| {
                    last.distance(position) >= self.settings.sample_spacing_px
                });
                if far_enough {
                    self.points.push(position);
                }
            }
        }
        self.last_move_at = now;
    }

    /// Live outline while the gesture is still running.
    pub fn preview(&self) -> PathDescriptor {
        if self.tool.line_break.is_smooth() {
            smooth_path(&self.points)
        } else {
            polyline_path(&self.points)
        }
    }

    /// Ends the gesture. Smooth styles get one averaging pass; gestures that
    /// never left their start point produce nothing.
    pub fn finish(self) -> Option<RouteDraft> {
        let Self { tool, mut points, .. } = self;
        points.dedup();
        if tool.line_break.is_smooth() {
            points = smooth_positions(&points);
        }
        if points.len() < 2 || path_length(&points) <= 0.0 {
            debug!(
                line_break = ?tool.line_break,
                point_count = points.len(),
                "route_discarded"
            );
            return None;
        }
        Some(RouteDraft {
            points,
            style: tool.style,
            show_arrow: tool.line_break.default_show_arrow(),
            line_break: tool.line_break,
            color: tool.color,
        })
    }
}
