//! Waveform peak arrays for track-view display.
//!
//! Peaks are computed once per asset (by the media source) as min/max pairs
//! over fixed-size sample buckets. The track view only looks them up.

use serde::{Deserialize, Serialize};

/// A min/max pair representing the amplitude range of one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveformSample {
    pub min: f32,
    pub max: f32,
}

impl WaveformSample {
    /// Peak magnitude of the bucket.
    #[inline]
    pub fn magnitude(self) -> f32 {
        self.max.abs().max(self.min.abs())
    }
}

/// Precomputed peak array for one asset (mono mixdown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Source samples per bucket (the reduction ratio).
    pub samples_per_bucket: usize,
    /// Min/max pairs, one per bucket.
    pub data: Vec<WaveformSample>,
    /// Source sample rate.
    pub sample_rate: u32,
}

impl Waveform {
    /// Compute a waveform from raw mono samples.
    pub fn compute(samples: &[f32], samples_per_bucket: usize, sample_rate: u32) -> Self {
        if samples_per_bucket == 0 || samples.is_empty() {
            return Self {
                samples_per_bucket: samples_per_bucket.max(1),
                data: Vec::new(),
                sample_rate,
            };
        }

        let data = samples
            .chunks(samples_per_bucket)
            .map(|chunk| {
                let (min, max) = chunk
                    .iter()
                    .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
                WaveformSample { min, max }
            })
            .collect();

        Self {
            samples_per_bucket,
            data,
            sample_rate,
        }
    }

    /// Seconds covered by one bucket.
    pub fn bucket_duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples_per_bucket as f64 / self.sample_rate as f64
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.data.len() as f64 * self.bucket_duration()
    }

    /// Largest magnitude over source time `[start, end)`.
    ///
    /// Always inspects at least the bucket containing `start`, so zoomed-in
    /// pixel columns narrower than a bucket still get a value.
    pub fn peak_between(&self, start: f64, end: f64) -> f32 {
        let bucket = self.bucket_duration();
        if bucket <= 0.0 || self.data.is_empty() || end < 0.0 {
            return 0.0;
        }
        let first = (start.max(0.0) / bucket).floor() as usize;
        let last = ((end / bucket).ceil() as usize).max(first + 1);
        let first = first.min(self.data.len());
        let last = last.min(self.data.len());
        self.data[first..last]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.magnitude()))
    }

    /// Get the RMS energy for a range of buckets.
    pub fn rms_range(&self, start_bucket: usize, end_bucket: usize) -> f32 {
        let start = start_bucket.min(self.data.len());
        let end = end_bucket.min(self.data.len());
        if start >= end {
            return 0.0;
        }

        let sum: f64 = self.data[start..end]
            .iter()
            .map(|s| {
                let peak = s.magnitude() as f64;
                peak * peak
            })
            .sum();
        (sum / (end - start) as f64).sqrt() as f32
    }
}
