mod association;
mod drag;
mod entities;
mod formations;

pub use association::AssociationTable;
pub use drag::DragSession;
pub use entities::{
    Circle, EntityId, EntityIdAllocator, EntityKind, EntityRef, Football, LineBreakType,
    LineStyle, Player, PlayerSide, Route, TextBox,
};
pub use formations::{
    coverage_patterns, defense_formations, find_coverage_pattern, find_defense_formation,
    CoveragePattern, DefenseFormation, FieldDimensions,
};

use crate::geometry::Vec2;

/// A finished route gesture waiting for an id.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDraft {
    pub points: Vec<Vec2>,
    pub style: LineStyle,
    pub line_break: LineBreakType,
    pub color: String,
    pub show_arrow: bool,
}

/// Editable state captured for undo. Defense players are regenerated from
/// templates and are not part of edit history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub offense: Vec<Player>,
    pub routes: Vec<Route>,
    pub text_boxes: Vec<TextBox>,
    pub circles: Vec<Circle>,
    pub footballs: Vec<Football>,
    pub associations: AssociationTable,
}

/// Owns every entity collection on the diagram plus the association table.
#[derive(Debug, Default)]
pub struct Board {
    allocator: EntityIdAllocator,
    field: FieldDimensions,
    offense: Vec<Player>,
    defense: Vec<Player>,
    routes: Vec<Route>,
    text_boxes: Vec<TextBox>,
    circles: Vec<Circle>,
    footballs: Vec<Football>,
    associations: AssociationTable,
}

impl Board {
    pub fn with_field(field: FieldDimensions) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }

    pub fn field(&self) -> &FieldDimensions {
        &self.field
    }

    pub fn add_offense(&mut self, position: Vec2, color: impl Into<String>) -> EntityId {
        let id = self.allocator.allocate();
        self.offense.push(Player {
            id,
            position,
            color: color.into(),
            side: PlayerSide::Offense,
            assigned_to: None,
        });
        id
    }

    pub fn add_defense(&mut self, position: Vec2, color: impl Into<String>) -> EntityId {
        let id = self.allocator.allocate();
        self.defense.push(Player {
            id,
            position,
            color: color.into(),
            side: PlayerSide::Defense,
            assigned_to: None,
        });
        id
    }

    /// Replaces the whole defense with one generated from `formation`.
    pub fn generate_defense(
        &mut self,
        formation: &DefenseFormation,
        color: &str,
    ) -> Vec<EntityId> {
        self.defense.clear();
        formation
            .placements(&self.field)
            .into_iter()
            .map(|position| self.add_defense(position, color))
            .collect()
    }

    /// Points a defender at a specific offense player for pursuit.
    pub fn assign_defender(&mut self, defender: EntityId, target: Option<EntityId>) -> bool {
        if let Some(target) = target {
            if !self.offense.iter().any(|player| player.id == target) {
                return false;
            }
        }
        match self.defense.iter_mut().find(|player| player.id == defender) {
            Some(player) => {
                player.assigned_to = target;
                true
            }
            None => false,
        }
    }

    pub fn add_text_box(
        &mut self,
        position: Vec2,
        text: impl Into<String>,
        font_size: f32,
        color: impl Into<String>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.text_boxes.push(TextBox {
            id,
            position,
            text: text.into(),
            font_size,
            color: color.into(),
        });
        id
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: impl Into<String>) -> EntityId {
        let id = self.allocator.allocate();
        self.circles.push(Circle {
            id,
            center,
            radius,
            color: color.into(),
        });
        id
    }

    pub fn add_football(&mut self, position: Vec2, size: f32) -> EntityId {
        let id = self.allocator.allocate();
        self.footballs.push(Football { id, position, size });
        id
    }

    /// Stores a finished route. Drafts with fewer than two points or
    /// non-finite coordinates are rejected.
    pub fn insert_route(&mut self, draft: RouteDraft) -> Option<EntityId> {
        if draft.points.len() < 2 || !draft.points.iter().all(|point| point.is_finite()) {
            return None;
        }
        let id = self.allocator.allocate();
        self.routes.push(Route {
            id,
            points: draft.points,
            style: draft.style,
            line_break: draft.line_break,
            color: draft.color,
            show_arrow: draft.show_arrow,
        });
        Some(id)
    }

    /// Gives `route` to the offense player closest to its first point.
    pub fn bind_route_to_nearest_offense(&mut self, route: EntityId) -> Option<EntityId> {
        let start = self.find_route(route)?.start()?;
        let owner = self.nearest_offense(start)?.id;
        self.associations.bind(owner, route);
        Some(owner)
    }

    pub fn bind_route(&mut self, player: EntityId, route: EntityId) -> bool {
        let player_exists = self.offense.iter().any(|candidate| candidate.id == player);
        if !player_exists || self.find_route(route).is_none() {
            return false;
        }
        self.associations.bind(player, route);
        true
    }

    pub fn nearest_offense(&self, point: Vec2) -> Option<&Player> {
        association::nearest_player(&self.offense, point)
    }

    /// First owned route that drives playback for `player`.
    pub fn playback_route(&self, player: EntityId) -> Option<&Route> {
        self.associations
            .routes_of(player)
            .iter()
            .filter_map(|route_id| self.find_route(*route_id))
            .find(|route| route.drives_playback())
    }

    pub fn set_route_arrow(&mut self, route: EntityId, show_arrow: bool) -> bool {
        match self.routes.iter_mut().find(|candidate| candidate.id == route) {
            Some(route) => {
                route.show_arrow = show_arrow;
                true
            }
            None => false,
        }
    }

    pub fn toggle_route_arrow(&mut self, route: EntityId) -> Option<bool> {
        let route = self.routes.iter_mut().find(|candidate| candidate.id == route)?;
        route.show_arrow = !route.show_arrow;
        Some(route.show_arrow)
    }

    pub fn set_color(&mut self, id: EntityId, color: impl Into<String>) -> bool {
        let color = color.into();
        if let Some(player) = self
            .offense
            .iter_mut()
            .chain(self.defense.iter_mut())
            .find(|player| player.id == id)
        {
            player.color = color;
            return true;
        }
        if let Some(route) = self.routes.iter_mut().find(|route| route.id == id) {
            route.color = color;
            return true;
        }
        if let Some(text) = self.text_boxes.iter_mut().find(|text| text.id == id) {
            text.color = color;
            return true;
        }
        if let Some(circle) = self.circles.iter_mut().find(|circle| circle.id == id) {
            circle.color = color;
            return true;
        }
        false
    }

    /// Moves one entity by `delta`. Offense players carry their routes.
    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> bool {
        let Some(kind) = self.entity(id).map(|entity| entity.kind()) else {
            return false;
        };
        match kind {
            EntityKind::Player => {
                if let Some(player) = self.player_mut(id) {
                    player.translate(delta);
                }
                let owned = self.associations.routes_of(id).to_vec();
                for route in self
                    .routes
                    .iter_mut()
                    .filter(|route| owned.contains(&route.id))
                {
                    route.translate(delta);
                }
            }
            EntityKind::Route => {
                if let Some(route) = self.routes.iter_mut().find(|route| route.id == id) {
                    route.translate(delta);
                }
            }
            EntityKind::TextBox => {
                if let Some(text) = self.text_boxes.iter_mut().find(|text| text.id == id) {
                    text.position += delta;
                }
            }
            EntityKind::Circle => {
                if let Some(circle) = self.circles.iter_mut().find(|circle| circle.id == id) {
                    circle.center += delta;
                }
            }
            EntityKind::Football => {
                if let Some(ball) = self.footballs.iter_mut().find(|ball| ball.id == id) {
                    ball.position += delta;
                }
            }
        }
        true
    }

    /// Deletes one entity. Deleting an offense player also deletes the routes
    /// it owns. Defenders keep their assignment so undo can bring the target
    /// back; pursuit treats a missing target as unassigned.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(kind) = self.entity(id).map(|entity| entity.kind()) else {
            return false;
        };
        match kind {
            EntityKind::Player => {
                self.offense.retain(|player| player.id != id);
                self.defense.retain(|player| player.id != id);
                let owned = self.associations.unbind(id);
                self.routes.retain(|route| !owned.contains(&route.id));
            }
            EntityKind::Route => {
                self.routes.retain(|route| route.id != id);
                self.associations.unbind_route(id);
            }
            EntityKind::TextBox => self.text_boxes.retain(|text| text.id != id),
            EntityKind::Circle => self.circles.retain(|circle| circle.id != id),
            EntityKind::Football => self.footballs.retain(|ball| ball.id != id),
        }
        true
    }

    /// Deletes every listed entity that still exists and returns how many
    /// were removed. Ids already removed by a cascade are skipped.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = EntityId>) -> usize {
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    pub fn clear(&mut self) {
        self.offense.clear();
        self.defense.clear();
        self.routes.clear();
        self.text_boxes.clear();
        self.circles.clear();
        self.footballs.clear();
        self.associations.clear();
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            offense: self.offense.clone(),
            routes: self.routes.clone(),
            text_boxes: self.text_boxes.clone(),
            circles: self.circles.clone(),
            footballs: self.footballs.clone(),
            associations: self.associations.clone(),
        }
    }

    /// Replaces every snapshotted collection at once.
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        let BoardSnapshot {
            offense,
            routes,
            text_boxes,
            circles,
            footballs,
            associations,
        } = snapshot;
        self.offense = offense;
        self.routes = routes;
        self.text_boxes = text_boxes;
        self.circles = circles;
        self.footballs = footballs;
        self.associations = associations;
        self.reserve_existing_ids();
    }

    pub(crate) fn from_parts(
        field: FieldDimensions,
        offense: Vec<Player>,
        defense: Vec<Player>,
        snapshot: BoardSnapshot,
    ) -> Self {
        let mut board = Self {
            field,
            defense,
            ..Self::default()
        };
        board.restore(BoardSnapshot {
            offense,
            ..snapshot
        });
        board
    }

    fn reserve_existing_ids(&mut self) {
        let ids = self.entities().map(|entity| entity.id()).collect::<Vec<_>>();
        for id in ids {
            self.allocator.reserve_through(id);
        }
    }

    pub fn offense(&self) -> &[Player] {
        &self.offense
    }

    pub fn defense(&self) -> &[Player] {
        &self.defense
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn text_boxes(&self) -> &[TextBox] {
        &self.text_boxes
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn footballs(&self) -> &[Football] {
        &self.footballs
    }

    pub fn associations(&self) -> &AssociationTable {
        &self.associations
    }

    pub fn entity_count(&self) -> usize {
        self.offense.len()
            + self.defense.len()
            + self.routes.len()
            + self.text_boxes.len()
            + self.circles.len()
            + self.footballs.len()
    }

    pub fn find_player(&self, id: EntityId) -> Option<&Player> {
        self.offense
            .iter()
            .chain(self.defense.iter())
            .find(|player| player.id == id)
    }

    pub fn find_route(&self, id: EntityId) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == id)
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities().find(|entity| entity.id() == id)
    }

    /// Every entity in draw order: players, routes, text, circles, footballs.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.offense
            .iter()
            .chain(self.defense.iter())
            .map(EntityRef::Player)
            .chain(self.routes.iter().map(EntityRef::Route))
            .chain(self.text_boxes.iter().map(EntityRef::TextBox))
            .chain(self.circles.iter().map(EntityRef::Circle))
            .chain(self.footballs.iter().map(EntityRef::Football))
    }

    fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.offense
            .iter_mut()
            .chain(self.defense.iter_mut())
            .find(|player| player.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(points: Vec<Vec2>) -> RouteDraft {
        RouteDraft {
            points,
            style: LineStyle::Solid,
            line_break: LineBreakType::Rigid,
            color: "#000".to_string(),
            show_arrow: true,
        }
    }

    fn straight(from: Vec2, to: Vec2) -> RouteDraft {
        draft(vec![from, to])
    }

    #[test]
    fn insert_route_rejects_short_or_non_finite_drafts() {
        let mut board = Board::default();
        assert!(board.insert_route(draft(vec![Vec2::ZERO])).is_none());
        assert!(board
            .insert_route(draft(vec![Vec2::ZERO, Vec2::new(f32::NAN, 0.0)]))
            .is_none());
        assert!(board
            .insert_route(straight(Vec2::ZERO, Vec2::new(1.0, 0.0)))
            .is_some());
        assert_eq!(board.routes().len(), 1);
    }

    #[test]
    fn new_route_binds_to_nearest_offense() {
        let mut board = Board::default();
        let near = board.add_offense(Vec2::new(100.0, 300.0), "#c00");
        let _far = board.add_offense(Vec2::new(400.0, 300.0), "#00c");
        let route = board
            .insert_route(straight(Vec2::new(105.0, 300.0), Vec2::new(105.0, 200.0)))
            .expect("route");
        assert_eq!(board.bind_route_to_nearest_offense(route), Some(near));
        assert_eq!(board.associations().routes_of(near), &[route]);
    }

    #[test]
    fn route_without_offense_stays_unowned() {
        let mut board = Board::default();
        board.add_defense(Vec2::new(0.0, 0.0), "#000");
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, 10.0)))
            .expect("route");
        assert_eq!(board.bind_route_to_nearest_offense(route), None);
        assert!(board.associations().is_empty());
    }

    #[test]
    fn playback_route_skips_markers() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::ZERO, "#c00");
        let marker = board
            .insert_route(RouteDraft {
                line_break: LineBreakType::None,
                show_arrow: false,
                ..straight(Vec2::ZERO, Vec2::new(10.0, 0.0))
            })
            .expect("marker");
        let run = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("run");
        board.bind_route(player, marker);
        board.bind_route(player, run);
        assert_eq!(board.playback_route(player).map(|route| route.id), Some(run));
    }

    #[test]
    fn removing_offense_cascades_to_owned_routes_only() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::ZERO, "#c00");
        let defender = board.add_defense(Vec2::new(0.0, -40.0), "#000");
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("route");
        board.bind_route_to_nearest_offense(route);
        assert!(board.assign_defender(defender, Some(player)));

        assert!(board.remove(player));
        assert!(board.routes().is_empty());
        assert!(board.associations().is_empty());
        assert_eq!(board.defense()[0].assigned_to, Some(player));
        assert!(!board.remove(player));
    }

    #[test]
    fn removing_route_unbinds_it() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::ZERO, "#c00");
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("route");
        board.bind_route(player, route);
        assert!(board.remove(route));
        assert!(board.associations().routes_of(player).is_empty());
        assert_eq!(board.offense().len(), 1);
    }

    #[test]
    fn remove_all_skips_cascaded_ids() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::ZERO, "#c00");
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("route");
        board.bind_route(player, route);
        let text = board.add_text_box(Vec2::new(5.0, 5.0), "X", 14.0, "#000");
        assert_eq!(board.remove_all([player, route, text]), 2);
        assert_eq!(board.entity_count(), 0);
    }

    #[test]
    fn translate_player_carries_owned_routes() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::new(10.0, 10.0), "#c00");
        let route = board
            .insert_route(straight(Vec2::new(10.0, 10.0), Vec2::new(10.0, -40.0)))
            .expect("route");
        board.bind_route(player, route);
        assert!(board.translate(player, Vec2::new(5.0, 0.0)));
        assert_eq!(board.offense()[0].position, Vec2::new(15.0, 10.0));
        assert_eq!(
            board.find_route(route).expect("route").points,
            vec![Vec2::new(15.0, 10.0), Vec2::new(15.0, -40.0)]
        );
        assert!(!board.translate(EntityId(999), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn toggle_arrow_flips_visibility() {
        let mut board = Board::default();
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("route");
        assert_eq!(board.toggle_route_arrow(route), Some(false));
        assert_eq!(board.toggle_route_arrow(route), Some(true));
        assert!(board.set_route_arrow(route, false));
        assert_eq!(board.toggle_route_arrow(EntityId(404)), None);
    }

    #[test]
    fn snapshot_restore_keeps_defense_and_never_reuses_ids() {
        let mut board = Board::default();
        let before = board.snapshot();
        board.add_defense(Vec2::ZERO, "#000");
        let player = board.add_offense(Vec2::ZERO, "#c00");
        board.restore(before);
        assert!(board.offense().is_empty());
        assert_eq!(board.defense().len(), 1);
        let next = board.add_offense(Vec2::ZERO, "#c00");
        assert!(next > player);
    }

    #[test]
    fn generate_defense_replaces_existing_defenders() {
        let mut board = Board::with_field(FieldDimensions {
            width: 400.0,
            height: 300.0,
        });
        board.add_defense(Vec2::ZERO, "#000");
        let formation = find_defense_formation("4-3").expect("formation");
        let ids = board.generate_defense(formation, "#111");
        assert_eq!(ids.len(), 11);
        assert_eq!(board.defense().len(), 11);
        assert!(board.defense().iter().all(|player| player.side == PlayerSide::Defense));
        assert!(board.defense().iter().all(|player| {
            let Vec2 { x, y } = player.position;
            (0.0..=400.0).contains(&x) && (0.0..=300.0).contains(&y)
        }));
    }

    #[test]
    fn clear_removes_everything() {
        let mut board = Board::default();
        let player = board.add_offense(Vec2::ZERO, "#c00");
        let route = board
            .insert_route(straight(Vec2::ZERO, Vec2::new(0.0, -50.0)))
            .expect("route");
        board.bind_route(player, route);
        board.add_circle(Vec2::ZERO, 10.0, "#0c0");
        board.add_football(Vec2::ZERO, 24.0);
        board.clear();
        assert_eq!(board.entity_count(), 0);
        assert!(board.associations().is_empty());
    }
}
