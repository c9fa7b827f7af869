use framecut_core::{Color, FrameBuffer};
use framecut_timeline::effect::ParamMap;
use framecut_timeline::ParamValue;

use crate::effect::{for_each_pixel, to_u8, VideoEffect};

fn float(params: &ParamMap, name: &str, default: f64) -> f32 {
    params
        .get(name)
        .and_then(ParamValue::as_f64)
        .unwrap_or(default) as f32
}

/// Adds `amount * 255` to each color channel. `amount` in -1.0 to 1.0.
pub struct Brightness;

impl VideoEffect for Brightness {
    fn name(&self) -> &str {
        "brightness"
    }

    fn apply(&self, frame: &mut FrameBuffer, params: &ParamMap) {
        let offset = float(params, "amount", 0.0).clamp(-1.0, 1.0) * 255.0;
        if offset == 0.0 {
            return;
        }
        for_each_pixel(frame, |px| {
            for c in &mut px[..3] {
                *c = to_u8(*c as f32 + offset);
            }
        });
    }
}

/// Scales color distance from mid-grey by `amount` (1.0 = unchanged).
pub struct Contrast;

impl VideoEffect for Contrast {
    fn name(&self) -> &str {
        "contrast"
    }

    fn apply(&self, frame: &mut FrameBuffer, params: &ParamMap) {
        let factor = float(params, "amount", 1.0).max(0.0);
        for_each_pixel(frame, |px| {
            for c in &mut px[..3] {
                *c = to_u8((*c as f32 - 127.5) * factor + 127.5);
            }
        });
    }
}

/// Rec. 709 luma desaturation.
pub struct Grayscale;

impl VideoEffect for Grayscale {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn apply(&self, frame: &mut FrameBuffer, _params: &ParamMap) {
        for_each_pixel(frame, |px| {
            let y = 0.2126 * px[0] as f32 + 0.7152 * px[1] as f32 + 0.0722 * px[2] as f32;
            let y = to_u8(y);
            px[0] = y;
            px[1] = y;
            px[2] = y;
        });
    }
}

/// Inverts color channels, keeps alpha.
pub struct Invert;

impl VideoEffect for Invert {
    fn name(&self) -> &str {
        "invert"
    }

    fn apply(&self, frame: &mut FrameBuffer, _params: &ParamMap) {
        for_each_pixel(frame, |px| {
            for c in &mut px[..3] {
                *c = 255 - *c;
            }
        });
    }
}

/// Mixes each pixel toward `color` by `amount`.
pub struct Tint;

impl VideoEffect for Tint {
    fn name(&self) -> &str {
        "tint"
    }

    fn apply(&self, frame: &mut FrameBuffer, params: &ParamMap) {
        let color = params
            .get("color")
            .and_then(ParamValue::as_color)
            .unwrap_or(Color::WHITE);
        let amount = float(params, "amount", 0.5).clamp(0.0, 1.0);
        let target = [color.r as f32, color.g as f32, color.b as f32];
        for_each_pixel(frame, |px| {
            for (c, t) in px[..3].iter_mut().zip(target) {
                *c = to_u8(*c as f32 + (t - *c as f32) * amount);
            }
        });
    }
}
