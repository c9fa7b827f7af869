//! Time representation for frame-accurate editing
//!
//! Timeline positions are `f64` seconds. Frame timestamps are always derived
//! from an integer frame index through a rational frame rate, so iterating a
//! timeline frame by frame never accumulates floating-point error.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing timeline positions.
pub const TIME_EPSILON: f64 = 1e-9;

/// Compare two times within [`TIME_EPSILON`].
#[inline]
pub fn time_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration(self) -> f64 {
        self.denominator as f64 / self.numerator as f64
    }

    /// Exact presentation time of frame `index`.
    pub fn frame_time(self, index: u64) -> f64 {
        let t = Rational64::new(
            index as i64 * self.denominator as i64,
            self.numerator as i64,
        );
        *t.numer() as f64 / *t.denom() as f64
    }

    /// Index of the frame displayed at `seconds` (floor).
    pub fn frame_at(self, seconds: f64) -> i64 {
        (seconds * self.to_fps_f64() + TIME_EPSILON).floor() as i64
    }

    /// Number of frames needed to cover `duration` seconds.
    pub fn frame_count(self, duration: f64) -> u64 {
        if duration <= 0.0 {
            return 0;
        }
        (duration * self.to_fps_f64() - TIME_EPSILON).ceil().max(0.0) as u64
    }

    /// Snap `seconds` down to the start of the frame containing it.
    pub fn snap(self, seconds: f64) -> f64 {
        let frame = self.frame_at(seconds).max(0);
        self.frame_time(frame as u64)
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// Format seconds as `HH:MM:SS:FF` at the given frame rate.
pub fn format_timecode(seconds: f64, rate: FrameRate) -> String {
    let fps = rate.to_fps_f64().round().max(1.0) as i64;
    let frames = rate.frame_at(seconds.max(0.0));
    let ff = frames % fps;
    let total_secs = frames / fps;
    let ss = total_secs % 60;
    let mm = (total_secs / 60) % 60;
    let hh = total_secs / 3600;
    format!("{hh:02}:{mm:02}:{ss:02}:{ff:02}")
}

/// A time range with inclusive start and exclusive end, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: f64,
    /// Duration of the range
    pub duration: f64,
}

impl TimeRange {
    /// Create a new time range from start and duration.
    #[inline]
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// Create a time range from start and end times.
    #[inline]
    pub fn from_start_end(start: f64, end: f64) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start - TIME_EPSILON && time < self.end() - TIME_EPSILON
    }

    /// Check if two ranges overlap. Ranges that merely touch do not.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() - TIME_EPSILON && other.start < self.end() - TIME_EPSILON
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }
}
