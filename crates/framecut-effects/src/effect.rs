//! Video effect trait and registry.

use framecut_core::frame::BYTES_PER_PIXEL;
use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;
use framecut_timeline::Effect;
use rayon::prelude::*;
use tracing::warn;

use crate::effects::{Brightness, Contrast, Grayscale, Invert, Opacity, Tint};

/// A per-clip video effect.
pub trait VideoEffect: Send + Sync {
    /// Registered type name, matched against `Effect::kind`.
    fn name(&self) -> &str;

    /// Transform the frame in place.
    fn apply(&self, frame: &mut FrameBuffer, params: &ParamMap);
}

/// Built-in effects registry.
pub struct EffectRegistry {
    effects: Vec<Box<dyn VideoEffect>>,
}

impl EffectRegistry {
    /// Create a new registry with built-in effects.
    pub fn new() -> Self {
        Self {
            effects: vec![
                Box::new(Brightness),
                Box::new(Contrast),
                Box::new(Grayscale),
                Box::new(Invert),
                Box::new(Tint),
                Box::new(Opacity),
            ],
        }
    }

    /// Register an additional effect. Later registrations win on name clashes.
    pub fn register(&mut self, effect: Box<dyn VideoEffect>) {
        self.effects.insert(0, effect);
    }

    /// Find an effect by name.
    pub fn find(&self, name: &str) -> Option<&dyn VideoEffect> {
        self.effects
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Get all registered effect names.
    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    /// Run a clip's effect chain in list order.
    ///
    /// Disabled entries are skipped; unknown types are logged and treated as
    /// identity.
    pub fn apply_chain(&self, frame: &mut FrameBuffer, chain: &[Effect]) {
        for effect in chain.iter().filter(|e| e.enabled) {
            match self.find(&effect.kind) {
                Some(imp) => imp.apply(frame, &effect.parameters),
                None => warn!(kind = %effect.kind, "unknown effect type, skipping"),
            }
        }
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` on every pixel, one rayon task per row.
pub(crate) fn for_each_pixel<F>(frame: &mut FrameBuffer, f: F)
where
    F: Fn(&mut [u8]) + Send + Sync,
{
    let stride = frame.stride().max(BYTES_PER_PIXEL);
    frame.data.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
            f(px);
        }
    });
}

/// Round and clamp a channel value.
#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
