//! Backend-neutral drawing primitives.

use framecut_core::{Color, Rect, Vec2};

/// One primitive in a draw list. Coordinates are viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect { rect: Rect, color: Color },
    Line { from: Vec2, to: Vec2, width: f32, color: Color },
    Text { pos: Vec2, text: String, size: f32, color: Color },
}

impl DrawCommand {
    pub fn color(&self) -> Color {
        match self {
            Self::Rect { color, .. } | Self::Line { color, .. } | Self::Text { color, .. } => *color,
        }
    }
}

/// Something that can rasterize a draw list (a GPU surface, a software
/// canvas, a test recorder).
pub trait RasterBackend {
    fn draw(&mut self, commands: &[DrawCommand]);
}

impl RasterBackend for Vec<DrawCommand> {
    fn draw(&mut self, commands: &[DrawCommand]) {
        self.clear();
        self.extend_from_slice(commands);
    }
}
