//! Transition blend functions.

use framecut_core::frame::BYTES_PER_PIXEL;
use framecut_core::FrameBuffer;
use framecut_timeline::effect::ParamMap;
use framecut_timeline::TransitionKind;
use tracing::warn;

use crate::transitions::{CrossDissolve, Cut, DipToBlack, DipToWhite, Iris, Slide, Wipe};

/// Blends the outgoing layer into the incoming one.
pub trait TransitionBlend: Send + Sync {
    /// Registered name. Built-in kinds map to lowercase names; custom kinds
    /// use their own string.
    fn name(&self) -> &str;

    /// Blend two layers. `progress` goes from 0.0 (pure `from`) to 1.0
    /// (pure `to`). Output has the size of `from`; pixels missing from `to`
    /// read as transparent.
    fn blend(&self, from: &FrameBuffer, to: &FrameBuffer, progress: f32, params: &ParamMap)
        -> FrameBuffer;
}

/// Registry of available transitions.
pub struct TransitionRegistry {
    transitions: Vec<Box<dyn TransitionBlend>>,
    fallback: Cut,
}

impl TransitionRegistry {
    /// Create a new registry with all built-in transitions.
    pub fn new() -> Self {
        let mut reg = Self {
            transitions: Vec::new(),
            fallback: Cut,
        };
        reg.register(Box::new(Cut));
        reg.register(Box::new(CrossDissolve));
        reg.register(Box::new(Wipe));
        reg.register(Box::new(Slide));
        reg.register(Box::new(DipToBlack));
        reg.register(Box::new(DipToWhite));
        reg.register(Box::new(Iris));
        reg
    }

    /// Register a custom transition. Later registrations win on name clashes.
    pub fn register(&mut self, t: Box<dyn TransitionBlend>) {
        self.transitions.insert(0, t);
    }

    /// Find a transition by name.
    pub fn find(&self, name: &str) -> Option<&dyn TransitionBlend> {
        self.transitions
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Get all registered transition names.
    pub fn names(&self) -> Vec<&str> {
        self.transitions.iter().map(|t| t.name()).collect()
    }

    /// Blend function for a transition kind. Unregistered custom kinds fall
    /// back to a hard cut.
    pub fn resolve(&self, kind: &TransitionKind) -> &dyn TransitionBlend {
        let name = match kind {
            TransitionKind::Cut => "cut",
            TransitionKind::Dissolve => "dissolve",
            TransitionKind::Wipe => "wipe",
            TransitionKind::Slide => "slide",
            TransitionKind::Custom(name) => name.as_str(),
        };
        match self.find(name) {
            Some(t) => t,
            None => {
                warn!(transition = name, "unknown transition, using cut");
                &self.fallback
            }
        }
    }
}

impl Default for TransitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixel of `frame` at byte offset `idx`, transparent when out of range.
#[inline]
pub(crate) fn pixel_at(frame: &FrameBuffer, idx: usize) -> [u8; 4] {
    match frame.data.get(idx..idx + BYTES_PER_PIXEL) {
        Some(px) => [px[0], px[1], px[2], px[3]],
        None => [0; 4],
    }
}

/// Build an output the size of `from`, choosing each pixel's source by
/// position.
pub(crate) fn select_by_position<F>(from: &FrameBuffer, to: &FrameBuffer, mut pick: F) -> FrameBuffer
where
    F: FnMut(u32, u32) -> Source,
{
    let mut out = FrameBuffer::new(from.width, from.height);
    for y in 0..from.height {
        for x in 0..from.width {
            let px = match pick(x, y) {
                Source::From(sx, sy) => sample(from, sx, sy),
                Source::To(sx, sy) => sample(to, sx, sy),
                Source::Empty => [0; 4],
            };
            out.set_pixel(x, y, px);
        }
    }
    out
}

fn sample(frame: &FrameBuffer, x: i64, y: i64) -> [u8; 4] {
    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) => frame.pixel(x, y).unwrap_or([0; 4]),
        _ => [0; 4],
    }
}

/// Where an output pixel comes from in [`select_by_position`].
pub(crate) enum Source {
    From(i64, i64),
    To(i64, i64),
    Empty,
}
