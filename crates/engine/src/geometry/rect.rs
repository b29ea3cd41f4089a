use super::Vec2;

/// Axis-aligned rectangle normalized so `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Builds a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self::from_corners(
            Vec2::new(center.x - half_width, center.y - half_height),
            Vec2::new(center.x + half_width, center.y + half_height),
        )
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Hit-test geometry of one board entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    Point(Vec2),
    Polyline(&'a [Vec2]),
    Circle { center: Vec2, radius: f32 },
    Icon { center: Vec2, size: f32 },
}

impl Shape<'_> {
    /// Circles and icons are tested by bounding box, which over-selects near
    /// the corners of a circle.
    pub fn intersects(&self, rect: &Rect) -> bool {
        match *self {
            Shape::Point(point) => rect.contains_point(point),
            Shape::Polyline(points) => points.iter().any(|point| rect.contains_point(*point)),
            Shape::Circle { center, radius } => {
                let radius = radius.abs();
                rect.overlaps(&Rect::from_center(center, radius, radius))
            }
            Shape::Icon { center, size } => {
                let half = size.abs() * 0.5;
                rect.overlaps(&Rect::from_center(center, half, half))
            }
        }
    }
}
