use framecut_core::frame::BYTES_PER_PIXEL;
use framecut_core::{Color, FrameBuffer};
use framecut_timeline::effect::ParamMap;

use crate::transition::{pixel_at, TransitionBlend};

/// Fade the outgoing layer to a solid color over the first half, then the
/// color to the incoming layer over the second half.
fn dip(from: &FrameBuffer, to: &FrameBuffer, progress: f32, color: Color) -> FrameBuffer {
    let p = progress.clamp(0.0, 1.0);
    let (source, toward) = if p < 0.5 {
        (from, p * 2.0)
    } else {
        (to, 1.0 - (p - 0.5) * 2.0)
    };
    let target = color.to_array();
    let mut out = FrameBuffer::new(from.width, from.height);
    for (i, dst) in out.data.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
        let src = pixel_at(source, i * BYTES_PER_PIXEL);
        for c in 0..3 {
            let v = src[c] as f32 + (target[c] as f32 - src[c] as f32) * toward;
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = 255;
    }
    out
}

pub struct DipToBlack;

impl TransitionBlend for DipToBlack {
    fn name(&self) -> &str {
        "dip_to_black"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, _params: &ParamMap) -> FrameBuffer {
        dip(from, to, progress, Color::BLACK)
    }
}

pub struct DipToWhite;

impl TransitionBlend for DipToWhite {
    fn name(&self) -> &str {
        "dip_to_white"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, _params: &ParamMap) -> FrameBuffer {
        dip(from, to, progress, Color::WHITE)
    }
}
