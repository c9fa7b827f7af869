use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;

use crate::transition::{select_by_position, Source, TransitionBlend};

/// Hard switch at the midpoint of the window.
pub struct Cut;

impl TransitionBlend for Cut {
    fn name(&self) -> &str {
        "cut"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, _params: &ParamMap) -> FrameBuffer {
        if progress < 0.5 {
            return from.clone();
        }
        if to.width == from.width && to.height == from.height {
            return to.clone();
        }
        select_by_position(from, to, |x, y| Source::To(x as i64, y as i64))
    }
}
