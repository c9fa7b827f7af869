//! The timeline document: tracks, markers and view state.

use std::collections::HashSet;

use framecut_core::{ClipId, InvariantError, TimeRange, TrackId, TIME_EPSILON};
use smallvec::SmallVec;

use crate::clip::Clip;
use crate::edit::Operation;
use crate::marker::Marker;
use crate::track::Track;

/// Default horizontal zoom, in pixels per second.
pub const DEFAULT_ZOOM: f64 = 100.0;

/// The canonical in-memory editing document.
///
/// A `Timeline` is a value: every edit produces a new, fully validated
/// timeline via [`Timeline::apply`], leaving the original untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Tracks bottom (index 0) to top
    pub tracks: Vec<Track>,
    /// End of the last clip on any track
    pub duration: f64,
    /// Current position, `0 ≤ playhead ≤ duration`
    pub playhead: f64,
    /// Pixels per second
    pub zoom: f64,
    pub selection: Option<TimeRange>,
    /// Markers sorted by time
    pub markers: Vec<Marker>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            duration: 0.0,
            playhead: 0.0,
            zoom: DEFAULT_ZOOM,
            selection: None,
            markers: Vec::new(),
        }
    }

    /// Create a timeline from existing tracks, validating the result.
    pub fn with_tracks(tracks: Vec<Track>) -> Result<Self, InvariantError> {
        let mut timeline = Self {
            tracks,
            ..Self::new()
        };
        timeline.duration = timeline.computed_duration();
        timeline.validate()?;
        Ok(timeline)
    }

    /// Apply an operation, returning the new timeline.
    ///
    /// On error `self` is unchanged and no partial edit is visible.
    pub fn apply(&self, op: &Operation) -> Result<Timeline, InvariantError> {
        self.apply_with_inverse(op).map(|(next, _)| next)
    }

    /// Apply an operation and derive the operation that undoes it.
    pub fn apply_with_inverse(
        &self,
        op: &Operation,
    ) -> Result<(Timeline, Operation), InvariantError> {
        let mut next = self.clone();
        let mut inverse = op.apply_to(&mut next)?;
        next.duration = next.computed_duration();
        if next.playhead > next.duration {
            next.playhead = next.duration;
        }
        next.validate()?;

        if next.playhead != self.playhead && !op.is_view_change() {
            inverse = Operation::Batch {
                ops: vec![
                    inverse,
                    Operation::SetPlayhead {
                        time: self.playhead,
                    },
                ],
            };
        }
        Ok((next, inverse))
    }

    /// Clips under time `t`, one per track at most, ordered bottom to top.
    pub fn active_clips_at(&self, t: f64) -> SmallVec<[&Clip; 8]> {
        self.tracks.iter().filter_map(|track| track.clip_at(t)).collect()
    }

    /// The clip under time `t` on a given track.
    pub fn clip_at(&self, track_id: TrackId, t: f64) -> Option<&Clip> {
        self.track(track_id)?.clip_at(t)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, InvariantError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(InvariantError::TrackNotFound(id))
    }

    /// Z-index of a track.
    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Find a clip anywhere on the timeline. Returns (track index, &Clip).
    pub fn find_clip(&self, id: ClipId) -> Option<(usize, &Clip)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(i, t)| t.find_clip(id).map(|(_, c)| (i, c)))
    }

    /// Total number of clips across all tracks.
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// `max(track end times)`.
    pub fn computed_duration(&self) -> f64 {
        self.tracks.iter().map(Track::end_time).fold(0.0, f64::max)
    }

    /// Check every invariant of the document.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut track_ids = HashSet::with_capacity(self.tracks.len());
        let mut clip_ids = HashSet::with_capacity(self.clip_count());
        for track in &self.tracks {
            if !track_ids.insert(track.id) {
                return Err(InvariantError::DuplicateId(track.id.to_string()));
            }
            for clip in &track.clips {
                if !clip_ids.insert(clip.id) {
                    return Err(InvariantError::DuplicateId(clip.id.to_string()));
                }
            }
            track.validate()?;
        }

        let computed = self.computed_duration();
        if (computed - self.duration).abs() > TIME_EPSILON {
            return Err(InvariantError::InvalidTimeline(format!(
                "duration {} does not match last clip end {}",
                self.duration, computed
            )));
        }
        if !(self.playhead >= 0.0 && self.playhead <= self.duration + TIME_EPSILON) {
            return Err(InvariantError::PropertyOutOfRange {
                field: "playhead",
                value: self.playhead,
            });
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(InvariantError::PropertyOutOfRange {
                field: "zoom",
                value: self.zoom,
            });
        }
        if let Some(selection) = self.selection {
            validate_selection(selection)?;
        }

        let mut marker_ids = HashSet::with_capacity(self.markers.len());
        for marker in &self.markers {
            if !marker_ids.insert(marker.id) {
                return Err(InvariantError::DuplicateId(marker.id.to_string()));
            }
            if !(marker.time.is_finite() && marker.time >= 0.0) {
                return Err(InvariantError::PropertyOutOfRange {
                    field: "marker.time",
                    value: marker.time,
                });
            }
        }
        if self.markers.windows(2).any(|w| w[1].sorts_before(&w[0])) {
            return Err(InvariantError::InvalidTimeline(
                "markers are not sorted by time".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_selection(selection: TimeRange) -> Result<(), InvariantError> {
    if !(selection.start.is_finite() && selection.start >= 0.0) {
        return Err(InvariantError::PropertyOutOfRange {
            field: "selection.start",
            value: selection.start,
        });
    }
    if !(selection.duration.is_finite() && selection.duration >= 0.0) {
        return Err(InvariantError::PropertyOutOfRange {
            field: "selection.duration",
            value: selection.duration,
        });
    }
    Ok(())
}
