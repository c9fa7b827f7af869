use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;
use framecut_timeline::ParamValue;

use crate::effect::{for_each_pixel, to_u8, VideoEffect};

/// Multiplies alpha by `amount` (0.0 to 1.0).
pub struct Opacity;

impl VideoEffect for Opacity {
    fn name(&self) -> &str {
        "opacity"
    }

    fn apply(&self, frame: &mut FrameBuffer, params: &ParamMap) {
        let amount = params
            .get("amount")
            .and_then(ParamValue::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0) as f32;
        if amount >= 1.0 {
            return;
        }
        for_each_pixel(frame, |px| px[3] = to_u8(px[3] as f32 * amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::Color;

    #[test]
    fn test_opacity_scales_alpha() {
        let mut frame = FrameBuffer::solid(2, 1, Color::rgb(9, 9, 9));
        let mut params = ParamMap::new();
        params.insert("amount".into(), ParamValue::Float(0.5));
        Opacity.apply(&mut frame, &params);
        assert_eq!(frame.pixel(0, 0), Some([9, 9, 9, 128]));
    }
}
