//! Built-in effect implementations.

mod color;
mod opacity;

pub use color::{Brightness, Contrast, Grayscale, Invert, Tint};
pub use opacity::Opacity;
