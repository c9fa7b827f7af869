//! FrameCut Audio - Audio mixing
//!
//! Audio is handled as interleaved `f32` blocks aligned to timeline time.
//!
//! - `AudioBlock`: a window of interleaved samples tagged with its start time
//! - `FadeEnvelope`: per-clip volume with linear fade-in/fade-out
//! - `Mixer`: sums sources with volume/balance/solo/mute and a master limiter
//! - `Waveform`: precomputed peak array for track-view display

pub mod block;
pub mod envelope;
pub mod mixer;
pub mod waveform;

pub use block::AudioBlock;
pub use envelope::FadeEnvelope;
pub use mixer::{MixInput, Mixer, MixerChannel};
pub use waveform::{Waveform, WaveformSample};
