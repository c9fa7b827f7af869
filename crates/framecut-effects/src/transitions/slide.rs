use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;

use super::Direction;
use crate::transition::{select_by_position, Source, TransitionBlend};

/// The incoming layer pushes the outgoing one off the canvas.
pub struct Slide;

impl TransitionBlend for Slide {
    fn name(&self) -> &str {
        "slide"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, params: &ParamMap) -> FrameBuffer {
        let p = progress.clamp(0.0, 1.0);
        let direction = Direction::from_params(params);
        let w = from.width as i64;
        let h = from.height as i64;
        let dx = (w as f32 * p).round() as i64;
        let dy = (h as f32 * p).round() as i64;

        select_by_position(from, to, |x, y| {
            let (x, y) = (x as i64, y as i64);
            // Incoming enters from `direction`, so content moves away from it
            let (ax, ay, bx, by) = match direction {
                Direction::Left => (x - dx, y, x - dx + w, y),
                Direction::Right => (x + dx, y, x + dx - w, y),
                Direction::Up => (x, y - dy, x, y - dy + h),
                Direction::Down => (x, y + dy, x, y + dy - h),
            };
            if (0..w).contains(&ax) && (0..h).contains(&ay) {
                Source::From(ax, ay)
            } else if (0..w).contains(&bx) && (0..h).contains(&by) {
                Source::To(bx, by)
            } else {
                Source::Empty
            }
        })
    }
}
