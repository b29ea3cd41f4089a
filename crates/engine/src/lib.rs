//! Playbook diagram engine: route geometry, capture, ownership, playback,
//! selection and edit history for a 2D play diagram.

pub mod animation;
pub mod app;
pub mod board;
pub mod capture;
pub mod content;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod selection;

pub use animation::{AnimationClock, Playback, PlaybackConfig, PlaybackFrame};
pub use app::{
    run_playback, FrameSink, JsonLinesSink, LoopConfig, LoopError, LoopMetricsSnapshot, NullSink,
    PlaybackDriver, PlaybackSummary,
};
pub use board::{
    AssociationTable, Board, BoardSnapshot, CoveragePattern, DefenseFormation, EntityId,
    EntityKind, FieldDimensions, LineBreakType, LineStyle, Player, PlayerSide, Route, RouteDraft,
};
pub use capture::{CaptureSettings, RouteCapture, RouteTool};
pub use content::{
    export_document, load_document_file, normalize_document, parse_document_json,
    save_document_file, DiagramDocument, DocumentError, NormalizationReport,
};
pub use editor::{Editor, EditorConfig, Tool};
pub use geometry::{PathDescriptor, Rect, Vec2};
pub use history::{Debouncer, History};
pub use selection::Selection;
