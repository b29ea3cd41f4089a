mod path;
mod rect;
mod vec2;

pub use path::{
    clip_for_arrow, path_length, polyline_path, position_at_distance, smooth_path,
    smooth_positions, PathCommand, PathDescriptor,
};
pub use rect::{Rect, Shape};
pub use vec2::Vec2;
