use std::path::PathBuf;

use clap::Parser;

/// Load a play diagram, normalize it and replay it headlessly.
#[derive(Debug, Clone, Parser)]
#[command(name = "playbook", version, long_about = None)]
pub(crate) struct Args {
    /// Diagram document (JSON)
    pub(crate) document: PathBuf,

    /// Coverage pattern for zone defenders, e.g. "cover-3" or "Man"
    #[arg(long)]
    pub(crate) pattern: Option<String>,

    /// Replace the defense with a built-in formation, e.g. "4-3"
    #[arg(long)]
    pub(crate) defense: Option<String>,

    /// Playback speed in px/s (overrides PLAYBOOK_SPEED_PX_PER_SEC)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) speed: Option<f32>,

    /// Presented frames per second
    #[arg(long, default_value_t = 30)]
    pub(crate) fps: u32,

    /// Stop after this many seconds even if playback is still running
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) max_duration: Option<f64>,

    /// Print every presented frame as a JSON line on stdout
    #[arg(long)]
    pub(crate) frames: bool,

    /// Write the normalized document to this path ("-" for stdout)
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,

    /// Skip playback (useful with --export)
    #[arg(long)]
    pub(crate) no_play: bool,
}
