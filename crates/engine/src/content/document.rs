use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::board::{
    AssociationTable, Board, BoardSnapshot, Circle, EntityId, FieldDimensions, Football, Player,
    PlayerSide, Route, TextBox,
};

/// Current on-disk format. Documents without a version field are legacy
/// exports and load as version 0.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse document json: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse document json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("encode document json: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Route ids owned by one player in the legacy pairs form. Older exports
/// wrote one pair per route, newer ones group the routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnedRoutes {
    One(EntityId),
    Many(Vec<EntityId>),
}

impl OwnedRoutes {
    fn into_vec(self) -> Vec<EntityId> {
        match self {
            Self::One(route) => vec![route],
            Self::Many(routes) => routes,
        }
    }
}

/// Map keys stay strings: JSON object keys are always strings and an
/// untagged enum cannot reinterpret them as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssociationsRepr {
    Pairs(Vec<(EntityId, OwnedRoutes)>),
    Map(BTreeMap<String, Vec<EntityId>>),
}

impl AssociationsRepr {
    /// Returns the table plus the number of map keys that were not ids.
    fn into_table(self) -> (AssociationTable, usize) {
        match self {
            Self::Pairs(pairs) => (
                AssociationTable::from_pairs(
                    pairs
                        .into_iter()
                        .map(|(player, routes)| (player, routes.into_vec())),
                ),
                0,
            ),
            Self::Map(map) => {
                let mut invalid_keys = 0;
                let pairs = map
                    .into_iter()
                    .filter_map(|(key, routes)| match key.trim().parse::<u64>() {
                        Ok(player) => Some((EntityId(player), routes)),
                        Err(_) => {
                            warn!(
                                key = key.as_str(),
                                "skipping association with invalid player id"
                            );
                            invalid_keys += 1;
                            None
                        }
                    })
                    .collect::<Vec<_>>();
                (AssociationTable::from_pairs(pairs), invalid_keys)
            }
        }
    }
}

/// Serialized diagram. Every collection is optional so partial documents
/// load; a missing association table is rebuilt by nearest start point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub field: FieldDimensions,
    #[serde(default)]
    pub offense: Vec<Player>,
    #[serde(default)]
    pub defense: Vec<Player>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub text_boxes: Vec<TextBox>,
    #[serde(default)]
    pub circles: Vec<Circle>,
    #[serde(default)]
    pub footballs: Vec<Football>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associations: Option<AssociationsRepr>,
}

/// What normalization had to repair while importing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub skipped_players: usize,
    pub skipped_routes: usize,
    pub duplicate_ids: usize,
    pub dropped_associations: usize,
    pub cleared_assignments: usize,
    pub rebuilt_associations: bool,
}

impl NormalizationReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_players == 0
            && self.skipped_routes == 0
            && self.duplicate_ids == 0
            && self.dropped_associations == 0
            && self.cleared_assignments == 0
    }
}

pub fn parse_document_json(raw: &str) -> Result<DiagramDocument, DocumentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let document = match serde_path_to_error::deserialize::<_, DiagramDocument>(&mut deserializer)
    {
        Ok(document) => document,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return if path.is_empty() || path == "." {
                Err(DocumentError::Parse { source })
            } else {
                Err(DocumentError::ParseAt { path, source })
            };
        }
    };
    if document.version > DOCUMENT_VERSION {
        return Err(DocumentError::UnsupportedVersion {
            found: document.version,
            supported: DOCUMENT_VERSION,
        });
    }
    Ok(document)
}

pub fn load_document_file(path: &Path) -> Result<DiagramDocument, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document_json(&raw)
}

pub fn document_to_json(document: &DiagramDocument) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(document).map_err(DocumentError::Encode)
}

/// Writes through a sibling temp file so a crash never leaves a truncated
/// document behind.
pub fn save_document_file(path: &Path, document: &DiagramDocument) -> Result<(), DocumentError> {
    let json = document_to_json(document)?;
    let write_error = |source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let staging = staging_path(path);
    fs::write(&staging, json).map_err(write_error)?;
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(&staging);
            return Err(write_error(error));
        }
    }
    fs::rename(&staging, path).map_err(|error| {
        let _ = fs::remove_file(&staging);
        write_error(error)
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("diagram.json");
    path.with_file_name(format!("{file_name}.tmp"))
}

/// Builds a board from an imported document, repairing what it can.
///
/// Players with non-finite positions and malformed routes are skipped,
/// duplicate ids keep their first occurrence, association entries that
/// point at missing players or routes are dropped, and defender
/// assignments to missing offense players are cleared. The id allocator
/// resumes above the largest id in use.
pub fn normalize_document(document: DiagramDocument) -> (Board, NormalizationReport) {
    let DiagramDocument {
        version,
        field,
        offense,
        defense,
        routes,
        text_boxes,
        circles,
        footballs,
        associations,
    } = document;
    let mut report = NormalizationReport::default();
    let mut seen = HashSet::new();

    let field = if field.is_valid() {
        field
    } else {
        warn!(
            width = field.width,
            height = field.height,
            "invalid field dimensions; using default"
        );
        FieldDimensions::default()
    };

    let mut offense = keep_players(offense, PlayerSide::Offense, &mut seen, &mut report);
    let mut defense = keep_players(defense, PlayerSide::Defense, &mut seen, &mut report);

    let routes = routes
        .into_iter()
        .filter(|route| {
            if !route.is_well_formed() {
                warn!(
                    route_id = route.id.0,
                    point_count = route.points.len(),
                    "skipping malformed route"
                );
                report.skipped_routes += 1;
                return false;
            }
            keep_unique(route.id, &mut seen, &mut report)
        })
        .collect::<Vec<_>>();
    let text_boxes = text_boxes
        .into_iter()
        .filter(|text| keep_unique(text.id, &mut seen, &mut report))
        .collect::<Vec<_>>();
    let circles = circles
        .into_iter()
        .filter(|circle| keep_unique(circle.id, &mut seen, &mut report))
        .collect::<Vec<_>>();
    let footballs = footballs
        .into_iter()
        .filter(|ball| keep_unique(ball.id, &mut seen, &mut report))
        .collect::<Vec<_>>();

    let associations = match associations {
        Some(repr) => {
            let (mut table, invalid_keys) = repr.into_table();
            let before = table.len();
            table.retain(|player, route| {
                offense.iter().any(|candidate| candidate.id == player)
                    && routes.iter().any(|candidate| candidate.id == route)
            });
            report.dropped_associations = invalid_keys + before - table.len();
            if report.dropped_associations > 0 {
                warn!(
                    dropped = report.dropped_associations,
                    "dropped dangling associations"
                );
            }
            table
        }
        None => {
            report.rebuilt_associations = true;
            AssociationTable::rebuild(&offense, &routes)
        }
    };

    for player in &mut offense {
        if player.assigned_to.take().is_some() {
            report.cleared_assignments += 1;
        }
    }
    for defender in &mut defense {
        let dangling = defender
            .assigned_to
            .is_some_and(|target| !offense.iter().any(|player| player.id == target));
        if dangling {
            warn!(
                defender_id = defender.id.0,
                "clearing assignment to missing offense player"
            );
            defender.assigned_to = None;
            report.cleared_assignments += 1;
        }
    }

    let board = Board::from_parts(
        field,
        offense,
        defense,
        BoardSnapshot {
            offense: Vec::new(),
            routes,
            text_boxes,
            circles,
            footballs,
            associations,
        },
    );
    info!(
        version,
        entity_count = board.entity_count(),
        association_count = board.associations().len(),
        rebuilt_associations = report.rebuilt_associations,
        skipped_players = report.skipped_players,
        skipped_routes = report.skipped_routes,
        duplicate_ids = report.duplicate_ids,
        dropped_associations = report.dropped_associations,
        cleared_assignments = report.cleared_assignments,
        "document_normalized"
    );
    (board, report)
}

/// Current board as a document, with the association table written
/// explicitly in the grouped pairs form.
pub fn export_document(board: &Board) -> DiagramDocument {
    DiagramDocument {
        version: DOCUMENT_VERSION,
        field: *board.field(),
        offense: board.offense().to_vec(),
        defense: board.defense().to_vec(),
        routes: board.routes().to_vec(),
        text_boxes: board.text_boxes().to_vec(),
        circles: board.circles().to_vec(),
        footballs: board.footballs().to_vec(),
        associations: Some(AssociationsRepr::Pairs(
            board
                .associations()
                .to_pairs()
                .into_iter()
                .map(|(player, routes)| (player, OwnedRoutes::Many(routes)))
                .collect(),
        )),
    }
}

fn keep_players(
    players: Vec<Player>,
    side: PlayerSide,
    seen: &mut HashSet<EntityId>,
    report: &mut NormalizationReport,
) -> Vec<Player> {
    players
        .into_iter()
        .filter_map(|mut player| {
            if !player.position.is_finite() {
                warn!(
                    player_id = player.id.0,
                    ?side,
                    "skipping player with non-finite position"
                );
                report.skipped_players += 1;
                return None;
            }
            if !keep_unique(player.id, seen, report) {
                return None;
            }
            player.side = side;
            Some(player)
        })
        .collect()
}

fn keep_unique(
    id: EntityId,
    seen: &mut HashSet<EntityId>,
    report: &mut NormalizationReport,
) -> bool {
    if seen.insert(id) {
        return true;
    }
    warn!(entity_id = id.0, "skipping entity with duplicate id");
    report.duplicate_ids += 1;
    false
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::geometry::Vec2;

    fn player(id: u64, x: f32, y: f32) -> serde_json::Value {
        json!({ "id": id, "position": { "x": x, "y": y }, "color": "#c00" })
    }

    fn route(id: u64, points: &[(f32, f32)]) -> serde_json::Value {
        let points = points
            .iter()
            .map(|(x, y)| json!({ "x": x, "y": y }))
            .collect::<Vec<_>>();
        json!({
            "id": id,
            "points": points,
            "line_break": "rigid",
            "color": "#000",
            "show_arrow": true
        })
    }

    fn parse(value: serde_json::Value) -> DiagramDocument {
        parse_document_json(&value.to_string()).expect("document")
    }

    #[test]
    fn missing_associations_are_rebuilt_by_nearest_start() {
        let document = parse(json!({
            "offense": [player(1, 100.0, 300.0), player(2, 400.0, 300.0)],
            "routes": [
                route(3, &[(398.0, 300.0), (398.0, 200.0)]),
                route(4, &[(101.0, 300.0), (101.0, 200.0)])
            ]
        }));
        assert_eq!(document.version, 0);

        let (board, report) = normalize_document(document);
        assert!(report.rebuilt_associations);
        assert!(report.is_clean());
        assert_eq!(board.associations().routes_of(EntityId(1)), &[EntityId(4)]);
        assert_eq!(board.associations().routes_of(EntityId(2)), &[EntityId(3)]);
    }

    #[test]
    fn map_and_pairs_forms_load_the_same_table() {
        let base = json!({
            "version": 1,
            "offense": [player(1, 0.0, 0.0), player(2, 50.0, 0.0)],
            "routes": [
                route(3, &[(0.0, 0.0), (0.0, -50.0)]),
                route(4, &[(50.0, 0.0), (50.0, -50.0)]),
                route(5, &[(50.0, 0.0), (80.0, -50.0)])
            ]
        });
        let mut as_map = base.clone();
        as_map["associations"] = json!({ "1": [3], "2": [4, 5] });
        let mut as_grouped_pairs = base.clone();
        as_grouped_pairs["associations"] = json!([[1, [3]], [2, [4, 5]]]);
        let mut as_flat_pairs = base;
        as_flat_pairs["associations"] = json!([[1, 3], [2, 4], [2, 5]]);

        let (from_map, _) = normalize_document(parse(as_map));
        let (from_grouped, _) = normalize_document(parse(as_grouped_pairs));
        let (from_flat, report) = normalize_document(parse(as_flat_pairs));
        assert!(!report.rebuilt_associations);
        assert_eq!(from_map.associations(), from_grouped.associations());
        assert_eq!(from_map.associations(), from_flat.associations());
        assert_eq!(
            from_map.associations().routes_of(EntityId(2)),
            &[EntityId(4), EntityId(5)]
        );
    }

    #[test]
    fn malformed_routes_and_dangling_entries_are_dropped() {
        let document = parse(json!({
            "offense": [player(1, 0.0, 0.0)],
            "defense": [
                { "id": 2, "position": { "x": 0.0, "y": -30.0 }, "color": "#000",
                  "assigned_to": 99 }
            ],
            "routes": [
                route(3, &[(0.0, 0.0)]),
                route(4, &[(0.0, 0.0), (0.0, -40.0)])
            ],
            "associations": [[1, [3, 4]], [42, [4]]]
        }));

        let (board, report) = normalize_document(document);
        assert_eq!(report.skipped_routes, 1);
        assert_eq!(report.cleared_assignments, 1);
        assert!(report.dropped_associations >= 1);
        assert_eq!(board.routes().len(), 1);
        assert!(board.associations().owner_of(EntityId(4)).is_none());
        assert_eq!(board.defense()[0].side, PlayerSide::Defense);
        assert_eq!(board.defense()[0].assigned_to, None);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let document = parse(json!({
            "offense": [player(1, 0.0, 0.0)],
            "footballs": [{ "id": 1, "position": { "x": 5.0, "y": 5.0 }, "size": 24.0 }]
        }));
        let (board, report) = normalize_document(document);
        assert_eq!(report.duplicate_ids, 1);
        assert_eq!(board.entity_count(), 1);
        assert!(board.footballs().is_empty());
    }

    #[test]
    fn allocator_resumes_above_imported_ids() {
        let document = parse(json!({
            "offense": [player(40, 0.0, 0.0)],
            "routes": [route(41, &[(0.0, 0.0), (0.0, -10.0)])]
        }));
        let (mut board, _) = normalize_document(document);
        let fresh = board.add_offense(Vec2::new(1.0, 1.0), "#c00");
        assert!(fresh > EntityId(41));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = json!({
            "offense": [{ "id": 1, "position": { "x": "left", "y": 0.0 }, "color": "#c00" }]
        })
        .to_string();
        let error = parse_document_json(&raw).expect_err("type mismatch");
        let message = error.to_string();
        assert!(
            message.contains("offense[0].position.x"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn unknown_line_break_is_rejected() {
        let mut bad_route = route(2, &[(0.0, 0.0), (1.0, 1.0)]);
        bad_route["line_break"] = json!("zigzag");
        let raw = json!({ "routes": [bad_route] }).to_string();
        let error = parse_document_json(&raw).expect_err("unknown variant");
        assert!(matches!(error, DocumentError::ParseAt { .. }));
        assert!(error.to_string().contains("routes[0].line_break"));
    }

    #[test]
    fn newer_versions_are_rejected() {
        let raw = json!({ "version": DOCUMENT_VERSION + 1 }).to_string();
        let error = parse_document_json(&raw).expect_err("version");
        assert!(matches!(
            error,
            DocumentError::UnsupportedVersion { found, .. } if found == DOCUMENT_VERSION + 1
        ));
    }

    #[test]
    fn export_then_import_preserves_board() {
        let (imported, _) = normalize_document(parse(json!({
            "offense": [player(1, 10.0, 10.0)],
            "defense": [{ "id": 2, "position": { "x": 10.0, "y": -20.0 }, "color": "#000" }],
            "routes": [route(9, &[(10.0, 10.0), (10.0, -90.0)])]
        })));
        let exported = export_document(&imported);
        assert_eq!(exported.version, DOCUMENT_VERSION);
        assert!(matches!(
            exported.associations,
            Some(AssociationsRepr::Pairs(ref pairs)) if pairs.len() == 1
        ));

        let json = document_to_json(&exported).expect("encode");
        let (reimported, report) = normalize_document(parse_document_json(&json).expect("parse"));
        assert!(report.is_clean());
        assert!(!report.rebuilt_associations);
        assert_eq!(reimported.snapshot(), imported.snapshot());
    }

    #[test]
    fn save_and_load_round_trip_through_file() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("plays").join("trips.json");
        let mut board = Board::default();
        board.add_text_box(Vec2::new(5.0, 5.0), "Trips right", 14.0, "#000");
        let document = export_document(&board);

        save_document_file(&path, &document).expect("save");
        save_document_file(&path, &document).expect("overwrite");
        assert!(!staging_path(&path).exists());

        let loaded = load_document_file(&path).expect("load");
        assert_eq!(loaded, document);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let temp = TempDir::new().expect("temp");
        let error = load_document_file(&temp.path().join("absent.json")).expect_err("missing");
        assert!(matches!(error, DocumentError::Read { .. }));
    }
}
