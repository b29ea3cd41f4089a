mod loop_runner;
mod metrics;

pub use loop_runner::{
    run_playback, FrameOutcome, FrameSink, JsonLinesSink, LoopConfig, LoopError, NullSink,
    PlaybackDriver, PlaybackSummary,
};
pub use metrics::LoopMetricsSnapshot;
