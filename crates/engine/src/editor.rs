use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::animation::{Playback, PlaybackConfig, PlaybackFrame};
use crate::board::{
    find_coverage_pattern, find_defense_formation, Board, BoardSnapshot, CoveragePattern,
    DragSession, EntityId, LineBreakType, LineStyle,
};
use crate::capture::{
    CaptureSettings, RouteCapture, RouteTool, DEFAULT_PIVOT_PAUSE, DEFAULT_SAMPLE_SPACING_PX,
};
use crate::content::{export_document, normalize_document, DiagramDocument, NormalizationReport};
use crate::geometry::{PathDescriptor, Vec2};
use crate::history::{Debouncer, History, DEFAULT_HISTORY_CAP, DEFAULT_SNAPSHOT_DEBOUNCE};
use crate::selection::{select_by_drag, Selection, DEFAULT_DRAG_THRESHOLD_PX};

pub const DEFAULT_ARROW_GAP_PX: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub pivot_pause: Duration,
    pub sample_spacing_px: f32,
    pub snapshot_debounce: Duration,
    pub history_cap: usize,
    pub drag_threshold_px: f32,
    pub arrow_gap_px: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            pivot_pause: DEFAULT_PIVOT_PAUSE,
            sample_spacing_px: DEFAULT_SAMPLE_SPACING_PX,
            snapshot_debounce: DEFAULT_SNAPSHOT_DEBOUNCE,
            history_cap: DEFAULT_HISTORY_CAP,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            arrow_gap_px: DEFAULT_ARROW_GAP_PX,
        }
    }
}

impl EditorConfig {
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            pivot_pause: self.pivot_pause,
            sample_spacing_px: self.sample_spacing_px,
        }
    }
}

/// Active tool, picked before a gesture starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Select,
    Route {
        line_break: LineBreakType,
        style: LineStyle,
    },
}

/// Owns the board and everything that edits or replays it.
///
/// Every mutation goes through the editor so it can schedule a debounced
/// history snapshot. Route capture and drags are refused while playback
/// runs.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    board: Board,
    history: History<BoardSnapshot>,
    debouncer: Debouncer,
    tool: Tool,
    route_color: String,
    capture: Option<RouteCapture>,
    drag: Option<DragSession>,
    selection: Selection,
    playback: Playback,
    pattern: Option<CoveragePattern>,
}

impl Editor {
    pub fn new(config: EditorConfig, playback: PlaybackConfig) -> Self {
        Self::with_board(config, playback, Board::default())
    }

    pub fn with_board(config: EditorConfig, playback: PlaybackConfig, board: Board) -> Self {
        let history = History::with_initial(config.history_cap, board.snapshot());
        let debouncer = Debouncer::new(config.snapshot_debounce);
        Self {
            config,
            board,
            history,
            debouncer,
            tool: Tool::default(),
            route_color: RouteTool::default().color,
            capture: None,
            drag: None,
            selection: Selection::default(),
            playback: Playback::new(playback),
            pattern: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &History<BoardSnapshot> {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_route_color(&mut self, color: impl Into<String>) {
        self.route_color = color.into();
    }

    pub fn is_animating(&self) -> bool {
        self.playback.is_running()
    }

    pub fn has_pending_snapshot(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Runs one board mutation and schedules a history snapshot.
    pub fn edit<R>(&mut self, now: Instant, mutate: impl FnOnce(&mut Board) -> R) -> R {
        let result = mutate(&mut self.board);
        self.debouncer.schedule(now);
        result
    }

    pub fn add_offense(&mut self, position: Vec2, color: &str, now: Instant) -> EntityId {
        self.edit(now, |board| board.add_offense(position, color))
    }

    pub fn add_text_box(
        &mut self,
        position: Vec2,
        text: &str,
        font_size: f32,
        color: &str,
        now: Instant,
    ) -> EntityId {
        self.edit(now, |board| board.add_text_box(position, text, font_size, color))
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: &str, now: Instant) -> EntityId {
        self.edit(now, |board| board.add_circle(center, radius, color))
    }

    pub fn add_football(&mut self, position: Vec2, size: f32, now: Instant) -> EntityId {
        self.edit(now, |board| board.add_football(position, size))
    }

    pub fn set_color(&mut self, id: EntityId, color: &str, now: Instant) -> bool {
        let changed = self.board.set_color(id, color);
        if changed {
            self.debouncer.schedule(now);
        }
        changed
    }

    pub fn toggle_route_arrow(&mut self, route: EntityId, now: Instant) -> Option<bool> {
        let shown = self.board.toggle_route_arrow(route)?;
        self.debouncer.schedule(now);
        Some(shown)
    }

    /// Starts a route gesture with the active route tool. Refused while
    /// animating, with the select tool active, or mid-gesture.
    pub fn begin_route(&mut self, start: Vec2, now: Instant) -> bool {
        let Tool::Route { line_break, style } = self.tool else {
            return false;
        };
        if self.is_animating() || self.capture.is_some() || self.drag.is_some() {
            return false;
        }
        let tool = RouteTool {
            line_break,
            style,
            color: self.route_color.clone(),
        };
        self.capture = Some(RouteCapture::begin(
            tool,
            self.config.capture_settings(),
            start,
            now,
        ));
        true
    }

    pub fn extend_route(&mut self, position: Vec2, now: Instant) {
        if let Some(capture) = &mut self.capture {
            capture.pointer_move(position, now);
        }
    }

    pub fn route_preview(&self) -> Option<PathDescriptor> {
        self.capture.as_ref().map(RouteCapture::preview)
    }

    pub fn cancel_route(&mut self) -> bool {
        self.capture.take().is_some()
    }

    /// Stores the captured route and gives it to the nearest offense player.
    pub fn finish_route(&mut self, now: Instant) -> Option<EntityId> {
        let draft = self.capture.take()?.finish()?;
        let point_count = draft.points.len();
        let line_break = draft.line_break;
        let route = self.board.insert_route(draft)?;
        let owner = self.board.bind_route_to_nearest_offense(route);
        self.debouncer.schedule(now);
        info!(
            route_id = route.0,
            owner_id = owner.map(|owner| owner.0),
            point_count,
            ?line_break,
            "route_finalized"
        );
        Some(route)
    }

    pub fn begin_drag(&mut self, target: EntityId, pointer: Vec2) -> bool {
        if self.is_animating() || self.capture.is_some() {
            return false;
        }
        self.drag = self.board.begin_drag(target, pointer);
        self.drag.is_some()
    }

    pub fn update_drag(&mut self, pointer: Vec2, now: Instant) -> bool {
        let Some(session) = &self.drag else {
            return false;
        };
        let moved = self.board.apply_drag(session, pointer);
        if moved {
            self.debouncer.schedule(now);
        } else {
            debug!(target_id = session.target().0, "drag_target_vanished");
            self.drag = None;
        }
        moved
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Applies a rubber-band selection. Drags under the threshold leave the
    /// current selection untouched and return false.
    pub fn select_rect(&mut self, start: Vec2, end: Vec2) -> bool {
        match select_by_drag(&self.board, start, end, self.config.drag_threshold_px) {
            Some(selection) => {
                self.selection = selection;
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Deletes every selected entity still on the board.
    pub fn delete_selection(&mut self, now: Instant) -> usize {
        let ids = self.selection.ids().collect::<Vec<_>>();
        self.selection.clear();
        let removed = self.board.remove_all(ids);
        if removed > 0 {
            self.debouncer.schedule(now);
        }
        removed
    }

    pub fn remove(&mut self, id: EntityId, now: Instant) -> bool {
        let removed = self.board.remove(id);
        if removed {
            self.debouncer.schedule(now);
        }
        removed
    }

    pub fn clear_board(&mut self, now: Instant) {
        self.stop();
        self.capture = None;
        self.drag = None;
        self.selection.clear();
        self.edit(now, Board::clear);
    }

    /// Replaces the defense from a named template. Defense is not part of
    /// edit history.
    pub fn generate_defense(&mut self, formation: &str, color: &str) -> Option<Vec<EntityId>> {
        let formation = find_defense_formation(formation)?;
        let ids = self.board.generate_defense(formation, color);
        info!(
            formation = formation.name,
            defender_count = ids.len(),
            "defense_generated"
        );
        Some(ids)
    }

    pub fn assign_defender(&mut self, defender: EntityId, target: Option<EntityId>) -> bool {
        self.board.assign_defender(defender, target)
    }

    /// Picks the coverage pattern for the next playback. `None` clears it;
    /// unknown names leave the current pattern and return false.
    pub fn set_pattern(&mut self, name: Option<&str>) -> bool {
        match name {
            None => {
                self.pattern = None;
                true
            }
            Some(name) => match find_coverage_pattern(name) {
                Some(pattern) => {
                    self.pattern = Some(pattern);
                    true
                }
                None => false,
            },
        }
    }

    pub fn pattern(&self) -> Option<&CoveragePattern> {
        self.pattern.as_ref()
    }

    /// Commits the debounced snapshot once its window has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.debouncer.poll(now) {
            return false;
        }
        self.history.commit(self.board.snapshot());
        true
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending_snapshot();
        match self.history.undo() {
            Some(snapshot) => {
                let snapshot = snapshot.clone();
                self.apply_history(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending_snapshot();
        match self.history.redo() {
            Some(snapshot) => {
                let snapshot = snapshot.clone();
                self.apply_history(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.debouncer.is_pending() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.debouncer.is_pending() && self.history.can_redo()
    }

    pub fn play(&mut self, now: Instant) -> bool {
        if self.capture.is_some() {
            return false;
        }
        self.drag = None;
        self.playback.start(&self.board, self.pattern.as_ref(), now);
        true
    }

    pub fn stop(&mut self) -> bool {
        self.playback.stop()
    }

    /// One fixed simulation tick of playback.
    pub fn tick(&mut self, now: Instant) {
        self.playback.tick(&self.board, now);
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn frame(&self, now: Instant) -> PlaybackFrame {
        self.playback.frame(&self.board, now)
    }

    pub fn position_of(&self, id: EntityId, now: Instant) -> Option<Vec2> {
        self.playback.position_of(&self.board, id, now)
    }

    /// Route outline as drawn, clipped for its arrowhead when it has one.
    pub fn route_outline(&self, route: EntityId) -> Option<PathDescriptor> {
        let route = self.board.find_route(route)?;
        route
            .is_well_formed()
            .then(|| route.outline(self.config.arrow_gap_px))
    }

    /// Replaces the board with an imported document and starts a fresh
    /// history from it.
    pub fn load_document(&mut self, document: DiagramDocument) -> NormalizationReport {
        self.stop();
        self.capture = None;
        self.drag = None;
        self.selection.clear();
        self.debouncer.cancel();
        let (board, report) = normalize_document(document);
        self.board = board;
        self.history.reset(self.board.snapshot());
        report
    }

    pub fn export_document(&self) -> DiagramDocument {
        export_document(&self.board)
    }

    fn flush_pending_snapshot(&mut self) {
        if self.debouncer.take() {
            self.history.commit(self.board.snapshot());
        }
    }

    fn apply_history(&mut self, snapshot: BoardSnapshot) {
        self.capture = None;
        self.drag = None;
        self.selection.clear();
        self.board.restore(snapshot);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), PlaybackConfig::default())
    }
}
