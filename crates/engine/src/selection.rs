use std::collections::BTreeSet;

use crate::board::{Board, EntityId, EntityKind};
use crate::geometry::{Rect, Vec2};

pub const DEFAULT_DRAG_THRESHOLD_PX: f32 = 10.0;

/// Ids picked by one selection gesture, grouped per entity collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub players: BTreeSet<EntityId>,
    pub routes: BTreeSet<EntityId>,
    pub text_boxes: BTreeSet<EntityId>,
    pub circles: BTreeSet<EntityId>,
    pub footballs: BTreeSet<EntityId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.players.len()
            + self.routes.len()
            + self.text_boxes.len()
            + self.circles.len()
            + self.footballs.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids().any(|candidate| candidate == id)
    }

    pub fn insert(&mut self, kind: EntityKind, id: EntityId) {
        match kind {
            EntityKind::Player => self.players.insert(id),
            EntityKind::Route => self.routes.insert(id),
            EntityKind::TextBox => self.text_boxes.insert(id),
            EntityKind::Circle => self.circles.insert(id),
            EntityKind::Football => self.footballs.insert(id),
        };
    }

    /// Every selected id, players first so deletions cascade before the
    /// routes they own are visited.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.players
            .iter()
            .chain(self.routes.iter())
            .chain(self.text_boxes.iter())
            .chain(self.circles.iter())
            .chain(self.footballs.iter())
            .copied()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Returns the drag rectangle, or `None` when the pointer moved less than
/// `threshold_px` on both axes (a click rather than a drag).
pub fn drag_rect(start: Vec2, end: Vec2, threshold_px: f32) -> Option<Rect> {
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    if dx < threshold_px && dy < threshold_px {
        return None;
    }
    Some(Rect::from_corners(start, end))
}

/// Every entity whose hit-test shape intersects `rect`.
pub fn select_in_rect(board: &Board, rect: &Rect) -> Selection {
    let mut selection = Selection::default();
    for entity in board.entities() {
        if entity.shape().intersects(rect) {
            selection.insert(entity.kind(), entity.id());
        }
    }
    selection
}

/// Resolves a finished drag gesture. `None` means the selection must stay
/// as it was.
pub fn select_by_drag(
    board: &Board,
    start: Vec2,
    end: Vec2,
    threshold_px: f32,
) -> Option<Selection> {
    drag_rect(start, end, threshold_px).map(|rect| select_in_rect(board, &rect))
}
