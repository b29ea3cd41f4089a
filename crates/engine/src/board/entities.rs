use serde::{Deserialize, Serialize};

use crate::geometry::{
    clip_for_arrow, path_length, polyline_path, smooth_path, PathDescriptor, Shape, Vec2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// Hands out ids in increasing order; ids are never reused, even after a
/// board clear or an undo.
#[derive(Debug, Default, Clone)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Moves the cursor past `id` so imported ids cannot collide with new ones.
    pub fn reserve_through(&mut self, id: EntityId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    #[default]
    Offense,
    Defense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    /// Rest position. Playback never writes here.
    pub position: Vec2,
    pub color: String,
    #[serde(default)]
    pub side: PlayerSide,
    /// Defense only: the offense player this defender tracks in pursuit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EntityId>,
}

impl Player {
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// Capture policy and playback role of a route.
///
/// `None` and `SmoothNone` are unarrowed motion markers: they never drive
/// playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineBreakType {
    #[default]
    Rigid,
    Smooth,
    None,
    SmoothNone,
}

impl LineBreakType {
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::None | Self::SmoothNone)
    }

    pub const fn default_show_arrow(self) -> bool {
        !self.is_marker()
    }

    pub const fn is_smooth(self) -> bool {
        matches!(self, Self::Smooth | Self::SmoothNone)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: EntityId,
    pub points: Vec<Vec2>,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default)]
    pub line_break: LineBreakType,
    pub color: String,
    pub show_arrow: bool,
}

impl Route {
    /// Routes with fewer than two points, or any non-finite coordinate, are
    /// skipped by capture, playback and rendering alike.
    pub fn is_well_formed(&self) -> bool {
        self.points.len() >= 2 && self.points.iter().all(|point| point.is_finite())
    }

    pub fn drives_playback(&self) -> bool {
        !self.line_break.is_marker() && self.is_well_formed()
    }

    pub fn start(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn length(&self) -> f32 {
        path_length(&self.points)
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Outline for an external renderer. Arrowed routes stop `arrow_gap`
    /// pixels short of their endpoint.
    pub fn outline(&self, arrow_gap: f32) -> PathDescriptor {
        if !self.is_well_formed() {
            return PathDescriptor::default();
        }
        let clipped;
        let points = if self.show_arrow {
            clipped = clip_for_arrow(&self.points, arrow_gap);
            &clipped
        } else {
            &self.points
        };
        if self.line_break.is_smooth() {
            smooth_path(points)
        } else {
            polyline_path(points)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub id: EntityId,
    pub position: Vec2,
    pub text: String,
    pub font_size: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Football {
    pub id: EntityId,
    pub position: Vec2,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Route,
    TextBox,
    Circle,
    Football,
}

/// Borrowed view of any board entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Player(&'a Player),
    Route(&'a Route),
    TextBox(&'a TextBox),
    Circle(&'a Circle),
    Football(&'a Football),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Player(player) => player.id,
            Self::Route(route) => route.id,
            Self::TextBox(text) => text.id,
            Self::Circle(circle) => circle.id,
            Self::Football(football) => football.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Player(_) => EntityKind::Player,
            Self::Route(_) => EntityKind::Route,
            Self::TextBox(_) => EntityKind::TextBox,
            Self::Circle(_) => EntityKind::Circle,
            Self::Football(_) => EntityKind::Football,
        }
    }

    pub fn shape(&self) -> Shape<'a> {
        match *self {
            Self::Player(player) => Shape::Point(player.position),
            Self::Route(route) => Shape::Polyline(&route.points),
            Self::TextBox(text) => Shape::Point(text.position),
            Self::Circle(circle) => Shape::Circle {
                center: circle.center,
                radius: circle.radius,
            },
            Self::Football(football) => Shape::Icon {
                center: football.position,
                size: football.size,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(line_break: LineBreakType, points: Vec<Vec2>) -> Route {
        Route {
            id: EntityId(7),
            points,
            style: LineStyle::Solid,
            line_break,
            color: "#000".to_string(),
            show_arrow: line_break.default_show_arrow(),
        }
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let a = allocator.allocate();
        let b = allocator.allocate();
        allocator.reserve_through(EntityId(1));
        let c = allocator.allocate();
        allocator.reserve_through(EntityId(40));
        let d = allocator.allocate();
        assert_eq!((a, b, c, d), (EntityId(0), EntityId(1), EntityId(2), EntityId(41)));
    }

    #[test]
    fn marker_line_breaks_default_to_no_arrow() {
        assert!(LineBreakType::Rigid.default_show_arrow());
        assert!(LineBreakType::Smooth.default_show_arrow());
        assert!(!LineBreakType::None.default_show_arrow());
        assert!(!LineBreakType::SmoothNone.default_show_arrow());
    }

    #[test]
    fn line_break_serializes_as_kebab_case() {
        let json = serde_json::to_string(&LineBreakType::SmoothNone).expect("serialize");
        assert_eq!(json, "\"smooth-none\"");
        let parsed: LineBreakType = serde_json::from_str("\"none\"").expect("parse");
        assert_eq!(parsed, LineBreakType::None);
    }

    #[test]
    fn markers_and_degenerate_routes_do_not_drive_playback() {
        let straight = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert!(route(LineBreakType::Rigid, straight.clone()).drives_playback());
        assert!(!route(LineBreakType::None, straight.clone()).drives_playback());
        assert!(!route(LineBreakType::SmoothNone, straight).drives_playback());
        assert!(!route(LineBreakType::Rigid, vec![Vec2::new(0.0, 0.0)]).drives_playback());
        assert!(!route(
            LineBreakType::Rigid,
            vec![Vec2::new(0.0, 0.0), Vec2::new(f32::NAN, 1.0)]
        )
        .drives_playback());
    }

    #[test]
    fn outline_clips_arrowed_routes_only() {
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let arrowed = route(LineBreakType::Rigid, points.clone());
        let marker = route(LineBreakType::None, points);
        assert_eq!(arrowed.outline(10.0).to_svg_path(), "M 0 0 L 90 0");
        assert_eq!(marker.outline(10.0).to_svg_path(), "M 0 0 L 100 0");
    }

    #[test]
    fn translate_moves_every_route_point() {
        let mut r = route(
            LineBreakType::Smooth,
            vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)],
        );
        r.translate(Vec2::new(2.0, -1.0));
        assert_eq!(r.points, vec![Vec2::new(2.0, -1.0), Vec2::new(7.0, 4.0)]);
    }

    #[test]
    fn entity_ref_shape_matches_variant() {
        let circle = Circle {
            id: EntityId(3),
            center: Vec2::new(1.0, 1.0),
            radius: 4.0,
            color: "#fff".to_string(),
        };
        let entity = EntityRef::Circle(&circle);
        assert_eq!(entity.id(), EntityId(3));
        assert_eq!(entity.kind(), EntityKind::Circle);
        assert_eq!(
            entity.shape(),
            Shape::Circle {
                center: Vec2::new(1.0, 1.0),
                radius: 4.0
            }
        );
    }
}
