use std::fmt::{self, Write as _};

use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { control: Vec2, to: Vec2 },
}

/// Renderable outline of a route, built fresh each frame from its points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathDescriptor {
    commands: Vec<PathCommand>,
}

impl PathDescriptor {
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// SVG path data, e.g. `M 0 0 Q 10 0 15 5 L 20 10`.
    pub fn to_svg_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PathDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for command in &self.commands {
            if !out.is_empty() {
                out.push(' ');
            }
            match command {
                PathCommand::MoveTo(p) => write!(out, "M {} {}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(out, "L {} {}", p.x, p.y)?,
                PathCommand::QuadTo { control, to } => {
                    write!(out, "Q {} {} {} {}", control.x, control.y, to.x, to.y)?
                }
            }
        }
        f.write_str(&out)
    }
}

/// Straight segments through every point.
pub fn polyline_path(points: &[Vec2]) -> PathDescriptor {
    let mut commands = Vec::with_capacity(points.len());
    if points.len() >= 2 {
        commands.push(PathCommand::MoveTo(points[0]));
        commands.extend(points[1..].iter().copied().map(PathCommand::LineTo));
    }
    PathDescriptor { commands }
}

/// Rounds a polyline into quadratic segments.
///
/// Every interior point becomes a control point and the midpoint to its
/// successor becomes the through-point, so the curve stays inside the hull
/// of the samples. The last point is reached with a straight line.
pub fn smooth_path(points: &[Vec2]) -> PathDescriptor {
    let mut commands = Vec::with_capacity(points.len() + 1);
    match points {
        [] | [_] => {}
        [first, last] => {
            commands.push(PathCommand::MoveTo(*first));
            commands.push(PathCommand::LineTo(*last));
        }
        [first, .., last] => {
            commands.push(PathCommand::MoveTo(*first));
            for window in points[1..].windows(2) {
                let (control, next) = (window[0], window[1]);
                commands.push(PathCommand::QuadTo {
                    control,
                    to: control.midpoint(next),
                });
            }
            commands.push(PathCommand::LineTo(*last));
        }
    }
    PathDescriptor { commands }
}

/// One pass of a 3-point moving average over interior points.
/// Endpoints are kept, and fewer than three points are returned unchanged.
pub fn smooth_positions(points: &[Vec2]) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut smoothed = Vec::with_capacity(points.len());
    smoothed.push(points[0]);
    for window in points.windows(3) {
        let (prev, curr, next) = (window[0], window[1], window[2]);
        smoothed.push(Vec2 {
            x: (prev.x + curr.x + next.x) / 3.0,
            y: (prev.y + curr.y + next.y) / 3.0,
        });
    }
    smoothed.push(points[points.len() - 1]);
    smoothed
}

/// Pulls the final point back by `gap` pixels along the last segment so an
/// arrowhead can sit at the original endpoint. A zero-length final segment
/// is left untouched, and the gap never reaches past the segment start.
pub fn clip_for_arrow(points: &[Vec2], gap: f32) -> Vec<Vec2> {
    let mut clipped = points.to_vec();
    let n = clipped.len();
    if n < 2 {
        return clipped;
    }
    let from = clipped[n - 2];
    let to = clipped[n - 1];
    let length = from.distance(to);
    let ratio = if length > 0.0 {
        (gap.max(0.0) / length).min(1.0)
    } else {
        0.0
    };
    clipped[n - 1] = to.lerp(from, ratio);
    clipped
}

pub fn path_length(points: &[Vec2]) -> f32 {
    points
        .windows(2)
        .map(|window| window[0].distance(window[1]))
        .sum()
}

/// Point reached after travelling `distance` pixels along the polyline.
/// Clamps to the first point for non-positive distances and to the last
/// point once `distance` covers the whole path.
pub fn position_at_distance(points: &[Vec2], distance: f32) -> Option<Vec2> {
    let first = *points.first()?;
    if distance <= 0.0 {
        return Some(first);
    }

    let mut remaining = distance;
    for window in points.windows(2) {
        let (from, to) = (window[0], window[1]);
        let segment = from.distance(to);
        if segment <= 0.0 {
            continue;
        }
        if remaining <= segment {
            return Some(from.lerp(to, remaining / segment));
        }
        remaining -= segment;
    }

    points.last().copied()
}
