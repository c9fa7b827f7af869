//! Interleaved audio sample blocks.

use serde::{Deserialize, Serialize};

/// A window of interleaved `f32` samples starting at a timeline time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBlock {
    pub sample_rate: u32,
    pub channels: u16,
    /// Timeline time of the first sample frame
    pub start_time: f64,
    /// Interleaved samples, `frame_count * channels` long
    pub samples: Vec<f32>,
}

impl AudioBlock {
    /// A block of silence.
    pub fn silent(start_time: f64, frame_count: usize, sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            start_time,
            samples: vec![0.0; frame_count * channels as usize],
        }
    }

    /// Number of sample frames (one sample per channel each).
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|s| *s == 0.0)
    }
}

/// Number of sample frames covering `duration` seconds.
pub fn frames_for(duration: f64, sample_rate: u32) -> usize {
    if duration <= 0.0 {
        return 0;
    }
    (duration * sample_rate as f64).round() as usize
}

/// Sample frames between two timeline times, measured from time zero so
/// consecutive video frames tile the audio without gaps or overlaps.
pub fn frames_between(start: f64, end: f64, sample_rate: u32) -> usize {
    let first = (start.max(0.0) * sample_rate as f64).round() as usize;
    let last = (end.max(0.0) * sample_rate as f64).round() as usize;
    last.saturating_sub(first)
}
