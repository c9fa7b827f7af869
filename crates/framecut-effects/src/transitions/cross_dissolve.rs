use framecut_core::frame::BYTES_PER_PIXEL;
use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;

use crate::transition::{pixel_at, TransitionBlend};

/// Linear cross-fade by elapsed fraction, mixed in premultiplied space so a
/// missing neighbour fades against transparency.
pub struct CrossDissolve;

impl TransitionBlend for CrossDissolve {
    fn name(&self) -> &str {
        "dissolve"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, _params: &ParamMap) -> FrameBuffer {
        let p = progress.clamp(0.0, 1.0);
        let ip = 1.0 - p;
        let mut out = FrameBuffer::new(from.width, from.height);

        for (i, dst) in out.data.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let a = pixel_at(from, i * BYTES_PER_PIXEL);
            let b = pixel_at(to, i * BYTES_PER_PIXEL);
            let aa = a[3] as f32 / 255.0 * ip;
            let ba = b[3] as f32 / 255.0 * p;
            let alpha = aa + ba;
            if alpha <= 0.0 {
                continue;
            }
            for c in 0..3 {
                let v = (a[c] as f32 * aa + b[c] as f32 * ba) / alpha;
                dst[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}
