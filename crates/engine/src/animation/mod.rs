mod clock;
mod playback;

pub use clock::AnimationClock;
pub use playback::{
    pursuit_step, zone_position, AgentPosition, Playback, PlaybackConfig, PlaybackFrame,
    DEFAULT_PURSUIT_STEP_CAP_PX, DEFAULT_PURSUIT_STEP_RATIO, DEFAULT_SPEED_PX_PER_SEC,
};
