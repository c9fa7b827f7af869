//! Linear volume envelopes for clip audio.

/// Clip gain over timeline time: `volume` with linear ramps at both edges.
///
/// Outside `[start, start + duration)` the gain is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEnvelope {
    pub start: f64,
    pub duration: f64,
    pub volume: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

impl FadeEnvelope {
    /// Gain at timeline time `t`.
    pub fn gain_at(&self, t: f64) -> f32 {
        let local = t - self.start;
        if local < 0.0 || local >= self.duration {
            return 0.0;
        }
        let mut gain = self.volume;
        if self.fade_in > 0.0 && local < self.fade_in {
            gain *= local / self.fade_in;
        }
        let remaining = self.duration - local;
        if self.fade_out > 0.0 && remaining < self.fade_out {
            gain *= remaining / self.fade_out;
        }
        gain as f32
    }

    /// Scale an interleaved block whose first frame sits at `block_start`.
    pub fn apply(&self, samples: &mut [f32], channels: u16, sample_rate: u32, block_start: f64) {
        let channels = channels.max(1) as usize;
        let rate = sample_rate.max(1) as f64;
        for (i, frame) in samples.chunks_mut(channels).enumerate() {
            let gain = self.gain_at(block_start + i as f64 / rate);
            for s in frame {
                *s *= gain;
            }
        }
    }
}
