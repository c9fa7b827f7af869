//! Ruler tick selection.

use framecut_core::TimeRange;

/// Candidate major intervals in seconds, smallest first.
pub const NICE_INTERVALS: &[f64] = &[
    1.0 / 30.0,
    2.0 / 30.0,
    5.0 / 30.0,
    10.0 / 30.0,
    0.5,
    1.0,
    2.0,
    5.0,
    10.0,
    15.0,
    30.0,
    60.0,
    120.0,
    300.0,
    600.0,
    900.0,
    1800.0,
    3600.0,
];

/// Minor ticks per major interval.
pub const MINOR_PER_MAJOR: u32 = 5;

/// Smallest nice interval whose on-screen width is at least `min_spacing`.
///
/// Past the end of the ladder, whole multiples of an hour are used.
pub fn major_interval(zoom: f64, min_spacing: f64) -> f64 {
    if zoom <= 0.0 {
        return f64::INFINITY;
    }
    if let Some(&interval) = NICE_INTERVALS.iter().find(|&&i| i * zoom >= min_spacing) {
        return interval;
    }
    let hour = NICE_INTERVALS[NICE_INTERVALS.len() - 1];
    hour * (min_spacing / (hour * zoom)).ceil()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub time: f64,
    pub major: bool,
}

/// Ticks covering `range`, derived from integer indices.
pub fn ticks(range: TimeRange, zoom: f64, min_spacing: f64) -> Vec<Tick> {
    let major = major_interval(zoom, min_spacing);
    if !major.is_finite() {
        return Vec::new();
    }
    let minor = major / MINOR_PER_MAJOR as f64;
    let first = (range.start.max(0.0) / minor).floor() as i64;
    let last = (range.end() / minor).ceil() as i64;
    (first..=last)
        .map(|i| Tick {
            time: i as f64 * minor,
            major: i % MINOR_PER_MAJOR as i64 == 0,
        })
        .filter(|t| t.time >= range.start && t.time <= range.end())
        .collect()
}
