use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use playbook_engine::content::document_to_json;
use playbook_engine::{
    load_document_file, run_playback, save_document_file, DocumentError, Editor, JsonLinesSink,
    LoopError, NullSink, PlaybackSummary, Route,
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;

const DEFENSE_COLOR: &str = "#000000";
const STDOUT_PATH: &str = "-";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("unknown defense formation `{0}`")]
    UnknownFormation(String),
    #[error("unknown coverage pattern `{0}`")]
    UnknownPattern(String),
    #[error("failed to write export to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Loop(#[from] LoopError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = execute(app, &mut out) {
        error!(error = %err, "run_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

pub(crate) fn execute(
    app: AppWiring,
    out: &mut dyn Write,
) -> Result<Option<PlaybackSummary>, AppError> {
    let document = load_document_file(&app.document)?;
    let mut editor = Editor::new(app.editor_config, app.playback_config);
    let report = editor.load_document(document);
    if !report.is_clean() {
        warn!(
            path = %app.document.display(),
            skipped_players = report.skipped_players,
            skipped_routes = report.skipped_routes,
            duplicate_ids = report.duplicate_ids,
            dropped_associations = report.dropped_associations,
            cleared_assignments = report.cleared_assignments,
            "document_repaired"
        );
    }

    if let Some(name) = app.defense.as_deref() {
        if editor.generate_defense(name, DEFENSE_COLOR).is_none() {
            return Err(AppError::UnknownFormation(name.to_string()));
        }
    }
    if let Some(name) = app.pattern.as_deref() {
        if !editor.set_pattern(Some(name)) {
            return Err(AppError::UnknownPattern(name.to_string()));
        }
    }

    if let Some(path) = app.export.as_deref() {
        export(&editor, path, out)?;
    }

    if !app.play {
        return Ok(None);
    }
    if !editor.board().routes().iter().any(Route::drives_playback) {
        info!(path = %app.document.display(), "no_routes_to_play");
        return Ok(None);
    }

    let summary = if app.emit_frames {
        let mut sink = JsonLinesSink::new(&mut *out);
        run_playback(&mut editor, &app.loop_config, &mut sink)?
    } else {
        run_playback(&mut editor, &app.loop_config, &mut NullSink)?
    };
    Ok(Some(summary))
}

fn export(editor: &Editor, path: &Path, out: &mut dyn Write) -> Result<(), AppError> {
    let document = editor.export_document();
    if path == Path::new(STDOUT_PATH) {
        let json = document_to_json(&document)?;
        return writeln!(out, "{json}").map_err(|source| AppError::Export {
            path: path.to_path_buf(),
            source,
        });
    }

    save_document_file(path, &document)?;
    info!(path = %path.display(), "document_exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use playbook_engine::{EditorConfig, LoopConfig, PlaybackConfig};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;

    fn write_document(dir: &TempDir, value: &Value) -> PathBuf {
        let path = dir.path().join("play.json");
        fs::write(&path, value.to_string()).expect("write document");
        path
    }

    fn wiring(document: PathBuf) -> AppWiring {
        AppWiring {
            document,
            pattern: None,
            defense: None,
            export: None,
            emit_frames: false,
            play: false,
            editor_config: EditorConfig::default(),
            playback_config: PlaybackConfig {
                speed_px_per_sec: 2000.0,
                ..PlaybackConfig::default()
            },
            loop_config: LoopConfig {
                render_fps: 120,
                max_duration: Some(Duration::from_secs(2)),
            },
        }
    }

    fn slant() -> Value {
        json!({
            "version": 1,
            "offense": [{"id": 1, "position": {"x": 100.0, "y": 300.0}, "color": "red"}],
            "routes": [{
                "id": 2,
                "points": [{"x": 100.0, "y": 300.0}, {"x": 160.0, "y": 220.0}],
                "style": "solid",
                "line_break": "rigid",
                "color": "red",
                "show_arrow": true
            }]
        })
    }

    #[test]
    fn export_to_stdout_writes_normalized_document() {
        let dir = TempDir::new().expect("tempdir");
        let mut app = wiring(write_document(&dir, &slant()));
        app.export = Some(PathBuf::from(STDOUT_PATH));

        let mut out = Vec::new();
        let summary = execute(app, &mut out).expect("execute");
        assert!(summary.is_none());

        let exported: Value = serde_json::from_slice(&out).expect("exported json");
        assert_eq!(exported["version"], 1);
        assert_eq!(exported["routes"][0]["id"], 2);
        assert_eq!(exported["associations"][0][0], 1);
    }

    #[test]
    fn export_to_file_uses_the_given_path() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("out").join("normalized.json");
        fs::create_dir_all(target.parent().expect("parent")).expect("mkdir");
        let mut app = wiring(write_document(&dir, &slant()));
        app.export = Some(target.clone());
        app.defense = Some("4-3".to_string());

        execute(app, &mut Vec::new()).expect("execute");
        let exported: Value =
            serde_json::from_str(&fs::read_to_string(&target).expect("read export"))
                .expect("exported json");
        assert_eq!(exported["defense"].as_array().map(Vec::len), Some(11));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_document(&dir, &slant());

        let mut app = wiring(path.clone());
        app.defense = Some("6-1".to_string());
        assert!(matches!(
            execute(app, &mut Vec::new()),
            Err(AppError::UnknownFormation(name)) if name == "6-1"
        ));

        let mut app = wiring(path);
        app.pattern = Some("cover 9".to_string());
        assert!(matches!(
            execute(app, &mut Vec::new()),
            Err(AppError::UnknownPattern(_))
        ));
    }

    #[test]
    fn missing_document_is_a_read_error() {
        let dir = TempDir::new().expect("tempdir");
        let app = wiring(dir.path().join("missing.json"));
        assert!(matches!(
            execute(app, &mut Vec::new()),
            Err(AppError::Document(DocumentError::Read { .. }))
        ));
    }

    #[test]
    fn playback_streams_frames_until_finished() {
        let dir = TempDir::new().expect("tempdir");
        let mut app = wiring(write_document(&dir, &slant()));
        app.play = true;
        app.emit_frames = true;

        let mut out = Vec::new();
        let summary = execute(app, &mut out)
            .expect("execute")
            .expect("playback ran");
        assert!(summary.finished);

        let text = String::from_utf8(out).expect("utf8");
        let last: Value = serde_json::from_str(text.lines().last().expect("at least one frame"))
            .expect("frame json");
        assert_eq!(last["finished"], true);
        let position = &last["offense"][0]["position"];
        let x = position["x"].as_f64().expect("x");
        let y = position["y"].as_f64().expect("y");
        assert!((x - 160.0).abs() < 0.01 && (y - 220.0).abs() < 0.01);
    }

    #[test]
    fn board_without_routes_skips_playback() {
        let dir = TempDir::new().expect("tempdir");
        let mut app = wiring(write_document(&dir, &json!({"version": 1})));
        app.play = true;
        assert!(execute(app, &mut Vec::new()).expect("execute").is_none());
    }

    #[test]
    fn marker_only_board_skips_playback() {
        let dir = TempDir::new().expect("tempdir");
        let mut document = slant();
        document["routes"][0]["line_break"] = json!("smooth-none");
        document["routes"][0]["show_arrow"] = json!(false);
        let mut app = wiring(write_document(&dir, &document));
        app.play = true;
        app.emit_frames = true;

        let mut out = Vec::new();
        assert!(execute(app, &mut out).expect("execute").is_none());
        assert!(out.is_empty());
    }
}
