//! Audio mixer: sums per-clip sources into one interleaved output block.

use tracing::trace;

/// Per-source mixer channel configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerChannel {
    /// Volume (0.0 to 1.0).
    pub volume: f32,
    /// Balance (-1.0 = full left, 0.0 = center, 1.0 = full right).
    pub pan: f32,
    /// Whether this channel is muted.
    pub muted: bool,
    /// Whether this channel is soloed.
    pub solo: bool,
}

impl Default for MixerChannel {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
        }
    }
}

impl MixerChannel {
    /// Left/right gain. Centered balance is unity on both sides so a plain
    /// mix is an exact sum.
    pub fn stereo_gain(&self) -> (f32, f32) {
        if self.muted {
            return (0.0, 0.0);
        }
        let pan = self.pan.clamp(-1.0, 1.0);
        let left = self.volume * (1.0 - pan).min(1.0);
        let right = self.volume * (1.0 + pan).min(1.0);
        (left, right)
    }
}

/// One source handed to [`Mixer::mix`].
#[derive(Debug, Clone, Copy)]
pub struct MixInput<'a> {
    /// Interleaved samples in the mixer's channel layout
    pub samples: &'a [f32],
    pub channel: MixerChannel,
}

impl<'a> MixInput<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self {
            samples,
            channel: MixerChannel::default(),
        }
    }
}

/// Audio mixer that combines sources into interleaved output.
///
/// Mixing allocates a fresh output buffer per call, so one mixer can serve
/// concurrent compositor calls.
#[derive(Debug, Clone)]
pub struct Mixer {
    /// Output channel count.
    pub channels: u16,
    /// Master volume.
    pub master_volume: f32,
    /// Master limiter enabled.
    pub limiter_enabled: bool,
    /// Limiter threshold in linear amplitude.
    pub limiter_threshold: f32,
}

impl Mixer {
    pub fn new(channels: u16) -> Self {
        Self {
            channels: channels.max(1),
            master_volume: 1.0,
            limiter_enabled: false,
            limiter_threshold: 0.95,
        }
    }

    /// Mix `frame_count` frames from every input.
    ///
    /// Short inputs contribute silence past their end.
    pub fn mix(&self, inputs: &[MixInput<'_>], frame_count: usize) -> Vec<f32> {
        let channels = self.channels as usize;
        let mut out = vec![0.0f32; frame_count * channels];
        let has_solo = inputs.iter().any(|i| i.channel.solo);

        for input in inputs {
            // If any source is soloed, only play soloed sources
            if has_solo && !input.channel.solo {
                continue;
            }
            let (gain_l, gain_r) = input.channel.stereo_gain();
            if gain_l == 0.0 && gain_r == 0.0 {
                continue;
            }
            for (dst, src) in out
                .chunks_exact_mut(channels)
                .zip(input.samples.chunks_exact(channels))
            {
                if channels == 2 {
                    dst[0] += src[0] * gain_l;
                    dst[1] += src[1] * gain_r;
                } else {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d += s * input.channel.volume;
                    }
                }
            }
        }

        if self.master_volume != 1.0 {
            for s in out.iter_mut() {
                *s *= self.master_volume;
            }
        }

        // Simple hard clamp
        if self.limiter_enabled {
            let threshold = self.limiter_threshold;
            let mut clipped = 0usize;
            for s in out.iter_mut() {
                if s.abs() > threshold {
                    clipped += 1;
                    *s = s.clamp(-threshold, threshold);
                }
            }
            if clipped > 0 {
                trace!(clipped, "limiter engaged");
            }
        }
        out
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_gain_center_is_unity() {
        let (l, r) = MixerChannel::default().stereo_gain();
        assert_eq!((l, r), (1.0, 1.0));
    }

    #[test]
    fn test_stereo_gain_muted() {
        let ch = MixerChannel {
            muted: true,
            ..Default::default()
        };
        assert_eq!(ch.stereo_gain(), (0.0, 0.0));
    }

    #[test]
    fn test_stereo_gain_pan_left() {
        let ch = MixerChannel {
            pan: -1.0,
            ..Default::default()
        };
        let (l, r) = ch.stereo_gain();
        assert_eq!(l, 1.0);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_mixer_sums_sources() {
        let mixer = Mixer::new(2);
        let ch0 = vec![0.5f32; 8];
        let ch1 = vec![0.25f32; 8];
        let out = mixer.mix(&[MixInput::new(&ch0), MixInput::new(&ch1)], 4);
        assert_eq!(out, vec![0.75f32; 8]);
    }

    #[test]
    fn test_short_input_pads_with_silence() {
        let mixer = Mixer::new(1);
        let short = vec![1.0f32; 2];
        let out = mixer.mix(&[MixInput::new(&short)], 4);
        assert_eq!(out, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mixer_solo() {
        let mixer = Mixer::new(2);
        let ch0 = vec![1.0f32; 8];
        let ch1 = vec![0.5f32; 8];
        let mut soloed = MixInput::new(&ch1);
        soloed.channel.solo = true;

        let out = mixer.mix(&[MixInput::new(&ch0), soloed], 4);
        assert!(out.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn test_mixer_limiter() {
        let mut mixer = Mixer::new(2);
        mixer.limiter_enabled = true;
        mixer.limiter_threshold = 0.8;

        let loud = vec![2.0f32; 8];
        let out = mixer.mix(&[MixInput::new(&loud)], 4);
        assert!(out.iter().all(|s| s.abs() <= 0.8));
    }
}
