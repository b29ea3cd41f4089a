use std::collections::{BTreeMap, HashMap};

use super::entities::{EntityId, Player, Route};

/// Index from offense player to the routes it owns.
///
/// A route is owned by at most one player. The per-player order is the bind
/// order, and playback uses the first owned route that is not a motion
/// marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationTable {
    routes_by_player: BTreeMap<EntityId, Vec<EntityId>>,
    owner_by_route: HashMap<EntityId, EntityId>,
}

impl AssociationTable {
    /// Appends `route` to `player`'s routes, moving it away from any
    /// previous owner.
    pub fn bind(&mut self, player: EntityId, route: EntityId) {
        if self.owner_by_route.get(&route) == Some(&player) {
            return;
        }
        self.unbind_route(route);
        self.routes_by_player.entry(player).or_default().push(route);
        self.owner_by_route.insert(route, player);
    }

    /// Drops every route binding of `player` and returns the routes it owned.
    pub fn unbind(&mut self, player: EntityId) -> Vec<EntityId> {
        let routes = self.routes_by_player.remove(&player).unwrap_or_default();
        for route in &routes {
            self.owner_by_route.remove(route);
        }
        routes
    }

    /// Drops the binding of `route` and returns its former owner.
    pub fn unbind_route(&mut self, route: EntityId) -> Option<EntityId> {
        let owner = self.owner_by_route.remove(&route)?;
        if let Some(routes) = self.routes_by_player.get_mut(&owner) {
            routes.retain(|candidate| *candidate != route);
            if routes.is_empty() {
                self.routes_by_player.remove(&owner);
            }
        }
        Some(owner)
    }

    pub fn routes_of(&self, player: EntityId) -> &[EntityId] {
        self.routes_by_player
            .get(&player)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn owner_of(&self, route: EntityId) -> Option<EntityId> {
        self.owner_by_route.get(&route).copied()
    }

    pub fn len(&self) -> usize {
        self.owner_by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner_by_route.is_empty()
    }

    pub fn clear(&mut self) {
        self.routes_by_player.clear();
        self.owner_by_route.clear();
    }

    /// Keeps only bindings for which `keep(player, route)` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId, EntityId) -> bool) {
        let dropped = self
            .owner_by_route
            .iter()
            .filter(|(route, player)| !keep(**player, **route))
            .map(|(route, _)| *route)
            .collect::<Vec<_>>();
        for route in dropped {
            self.unbind_route(route);
        }
    }

    /// Rebuilds ownership by nearest start point: each route goes to the
    /// player whose rest position is closest to the route's first point.
    /// Ties keep the earlier player in `players`.
    pub fn rebuild(players: &[Player], routes: &[Route]) -> Self {
        let mut table = Self::default();
        for route in routes {
            let Some(start) = route.start() else {
                continue;
            };
            if let Some(owner) = nearest_player(players, start) {
                table.bind(owner.id, route.id);
            }
        }
        table
    }

    /// Legacy array-of-pairs form: `[(player, [route, ...]), ...]`.
    pub fn to_pairs(&self) -> Vec<(EntityId, Vec<EntityId>)> {
        self.routes_by_player
            .iter()
            .map(|(player, routes)| (*player, routes.clone()))
            .collect()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (EntityId, Vec<EntityId>)>) -> Self {
        let mut table = Self::default();
        for (player, routes) in pairs {
            for route in routes {
                table.bind(player, route);
            }
        }
        table
    }
}

pub(crate) fn nearest_player(
    players: &[Player],
    point: crate::geometry::Vec2,
) -> Option<&Player> {
    let mut best: Option<(f32, &Player)> = None;
    for player in players {
        let distance = player.position.distance(point);
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, player)),
        }
    }
    best.map(|(_, player)| player)
}
