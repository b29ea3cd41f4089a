use std::env;
use std::path::PathBuf;
use std::time::Duration;

use playbook_engine::{EditorConfig, LoopConfig, PlaybackConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::Args;

pub(crate) const SPEED_ENV_VAR: &str = "PLAYBOOK_SPEED_PX_PER_SEC";

pub(crate) struct AppWiring {
    pub(crate) document: PathBuf,
    pub(crate) pattern: Option<String>,
    pub(crate) defense: Option<String>,
    pub(crate) export: Option<PathBuf>,
    pub(crate) emit_frames: bool,
    pub(crate) play: bool,
    pub(crate) editor_config: EditorConfig,
    pub(crate) playback_config: PlaybackConfig,
    pub(crate) loop_config: LoopConfig,
}

pub(crate) fn build_app(args: Args) -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");
    wire(args, env::var(SPEED_ENV_VAR))
}

fn wire(args: Args, speed_env: Result<String, env::VarError>) -> AppWiring {
    let defaults = PlaybackConfig::default();
    let speed_px_per_sec = match args.speed {
        Some(speed) => validate_speed(speed, "cli", defaults.speed_px_per_sec),
        None => resolve_speed_from_env(speed_env, defaults.speed_px_per_sec),
    };
    let playback_config = PlaybackConfig {
        speed_px_per_sec,
        ..defaults
    };
    let loop_config = LoopConfig {
        render_fps: args.fps.max(1),
        max_duration: args.max_duration.and_then(resolve_max_duration),
    };

    AppWiring {
        document: args.document,
        pattern: args.pattern,
        defense: args.defense,
        export: args.export,
        emit_frames: args.frames,
        play: !args.no_play,
        editor_config: EditorConfig::default(),
        playback_config,
        loop_config,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_speed_from_env(value: Result<String, env::VarError>, fallback: f32) -> f32 {
    match value {
        Ok(raw) => match raw.trim().parse::<f32>() {
            Ok(speed) => validate_speed(speed, "env", fallback),
            Err(_) => {
                warn!(
                    env_var = SPEED_ENV_VAR,
                    value = raw.as_str(),
                    "invalid speed env var value; falling back to default"
                );
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(
                env_var = SPEED_ENV_VAR,
                error = %err,
                "unable to read speed env var; falling back to default"
            );
            fallback
        }
    }
}

fn validate_speed(speed: f32, source: &'static str, fallback: f32) -> f32 {
    if speed.is_finite() && speed > 0.0 {
        return speed;
    }
    warn!(speed, source, "speed must be a positive number; falling back to default");
    fallback
}

fn resolve_max_duration(seconds: f64) -> Option<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(limit) if !limit.is_zero() => Some(limit),
        _ => {
            warn!(seconds, "ignoring invalid max duration");
            None
        }
    }
}
