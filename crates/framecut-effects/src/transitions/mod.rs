//! Built-in transition implementations.

mod cross_dissolve;
mod cut;
mod dip;
mod iris;
mod slide;
mod wipe;

pub use cross_dissolve::CrossDissolve;
pub use cut::Cut;
pub use dip::{DipToBlack, DipToWhite};
pub use iris::Iris;
pub use slide::Slide;
pub use wipe::{Direction, Wipe};
