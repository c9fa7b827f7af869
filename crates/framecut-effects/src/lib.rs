//! FrameCut Effects - CPU effects and transitions
//!
//! Every effect is a pure frame-in/frame-out function over an RGBA8
//! [`FrameBuffer`](framecut_core::FrameBuffer); every transition blends two
//! equally sized layers by an elapsed fraction.

pub mod effect;
pub mod effects;
pub mod transition;
pub mod transitions;

pub use effect::{EffectRegistry, VideoEffect};
pub use transition::{TransitionBlend, TransitionRegistry};
