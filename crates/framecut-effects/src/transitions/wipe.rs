use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;
use framecut_timeline::ParamValue;

use crate::transition::{select_by_position, Source, TransitionBlend};

/// Edge the incoming layer enters from, read from the `direction` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn from_params(params: &ParamMap) -> Self {
        match params.get("direction").and_then(ParamValue::as_str) {
            Some("right") => Self::Right,
            Some("up") => Self::Up,
            Some("down") => Self::Down,
            _ => Self::Left,
        }
    }
}

/// Hard-edged reveal of the incoming layer.
pub struct Wipe;

impl TransitionBlend for Wipe {
    fn name(&self) -> &str {
        "wipe"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, params: &ParamMap) -> FrameBuffer {
        let p = progress.clamp(0.0, 1.0);
        let direction = Direction::from_params(params);
        let (w, h) = (from.width.max(1) as f32, from.height.max(1) as f32);

        select_by_position(from, to, |x, y| {
            let threshold = match direction {
                Direction::Left => x as f32 / w,
                Direction::Right => 1.0 - (x + 1) as f32 / w,
                Direction::Up => y as f32 / h,
                Direction::Down => 1.0 - (y + 1) as f32 / h,
            };
            if threshold < p {
                Source::To(x as i64, y as i64)
            } else {
                Source::From(x as i64, y as i64)
            }
        })
    }
}
