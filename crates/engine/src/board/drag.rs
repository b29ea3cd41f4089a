use super::{Board, EntityId, EntityKind};
use crate::geometry::Vec2;

#[derive(Debug, Clone, PartialEq)]
enum DragOrigin {
    Anchor(Vec2),
    Points(Vec<Vec2>),
}

/// One drag gesture. Every position the drag touches is captured when the
/// gesture starts, and each pointer update re-applies the total delta from
/// those origins instead of accumulating per-move deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    target: EntityId,
    pointer_origin: Vec2,
    origin: DragOrigin,
    carried_routes: Vec<(EntityId, Vec<Vec2>)>,
}

impl DragSession {
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Total pointer travel since the gesture started.
    pub fn delta(&self, pointer: Vec2) -> Vec2 {
        pointer - self.pointer_origin
    }
}

impl Board {
    pub fn begin_drag(&self, target: EntityId, pointer: Vec2) -> Option<DragSession> {
        let entity = self.entity(target)?;
        let origin = match entity.kind() {
            EntityKind::Route => DragOrigin::Points(self.find_route(target)?.points.clone()),
            EntityKind::Player => DragOrigin::Anchor(self.find_player(target)?.position),
            EntityKind::TextBox => {
                DragOrigin::Anchor(self.text_boxes.iter().find(|t| t.id == target)?.position)
            }
            EntityKind::Circle => {
                DragOrigin::Anchor(self.circles.iter().find(|c| c.id == target)?.center)
            }
            EntityKind::Football => {
                DragOrigin::Anchor(self.footballs.iter().find(|f| f.id == target)?.position)
            }
        };
        let carried_routes = if entity.kind() == EntityKind::Player {
            self.associations
                .routes_of(target)
                .iter()
                .filter_map(|route_id| self.find_route(*route_id))
                .map(|route| (route.id, route.points.clone()))
                .collect()
        } else {
            Vec::new()
        };
        Some(DragSession {
            target,
            pointer_origin: pointer,
            origin,
            carried_routes,
        })
    }

    /// Places the dragged entity (and any routes it carries) at its origin
    /// plus the gesture delta. Returns false once the target is gone.
    pub fn apply_drag(&mut self, session: &DragSession, pointer: Vec2) -> bool {
        let delta = session.delta(pointer);
        let target = session.target;
        let moved = match &session.origin {
            DragOrigin::Points(points) => self.place_route(target, points, delta),
            DragOrigin::Anchor(anchor) => self.place_anchor(target, *anchor + delta),
        };
        if !moved {
            return false;
        }
        for (route_id, points) in &session.carried_routes {
            self.place_route(*route_id, points, delta);
        }
        true
    }

    fn place_route(&mut self, id: EntityId, origin_points: &[Vec2], delta: Vec2) -> bool {
        match self.routes.iter_mut().find(|route| route.id == id) {
            Some(route) => {
                route.points = origin_points.iter().map(|point| *point + delta).collect();
                true
            }
            None => false,
        }
    }

    fn place_anchor(&mut self, id: EntityId, position: Vec2) -> bool {
        if let Some(player) = self.player_mut(id) {
            player.position = position;
            return true;
        }
        if let Some(text) = self.text_boxes.iter_mut().find(|text| text.id == id) {
            text.position = position;
            return true;
        }
        if let Some(circle) = self.circles.iter_mut().find(|circle| circle.id == id) {
            circle.center = position;
            return true;
        }
        if let Some(ball) = self.footballs.iter_mut().find(|ball| ball.id == id) {
            ball.position = position;
            return true;
        }
        false
    }
}
