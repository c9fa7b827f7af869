use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;
use framecut_timeline::ParamValue;

use crate::transition::{select_by_position, Source, TransitionBlend};

/// Opening shape revealing the incoming layer from the canvas centre.
///
/// `shape` parameter: `circle` (default), `rectangle` or `diamond`.
pub struct Iris;

impl TransitionBlend for Iris {
    fn name(&self) -> &str {
        "iris"
    }

    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, params: &ParamMap) -> FrameBuffer {
        let p = progress.clamp(0.0, 1.0);
        let shape = params.get("shape").and_then(ParamValue::as_str).unwrap_or("circle");
        let cx = from.width as f32 * 0.5;
        let cy = from.height as f32 * 0.5;
        let max_radius = (cx * cx + cy * cy).sqrt().max(f32::EPSILON);

        select_by_position(from, to, |x, y| {
            let fx = x as f32 + 0.5 - cx;
            let fy = y as f32 + 0.5 - cy;
            let dist = match shape {
                "rectangle" => (fx.abs() / cx.max(0.5)).max(fy.abs() / cy.max(0.5)),
                "diamond" => (fx.abs() / cx.max(0.5) + fy.abs() / cy.max(0.5)) * 0.5,
                _ => (fx * fx + fy * fy).sqrt() / max_radius,
            };
            if dist < p {
                Source::To(x as i64, y as i64)
            } else {
                Source::From(x as i64, y as i64)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::Color;

    #[test]
    fn test_iris_opens_from_centre() {
        let a = FrameBuffer::solid(9, 9, Color::RED);
        let b = FrameBuffer::solid(9, 9, Color::BLUE);
        let out = Iris.blend(&a, &b, 0.3, &ParamMap::new());
        assert_eq!(out.pixel(4, 4), Some(Color::BLUE.to_array()));
        assert_eq!(out.pixel(0, 0), Some(Color::RED.to_array()));
    }
}
