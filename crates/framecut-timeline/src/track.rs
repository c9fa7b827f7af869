//! Track types for the timeline.

use framecut_core::{ClipId, InvariantError, TimeRange, TrackId, TIME_EPSILON};
use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::effect::TransitionEdge;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    /// Adjustment layer: clip effects apply to everything beneath
    Effect,
}

impl TrackKind {
    /// Whether clips on this track draw their own image.
    pub fn has_image(self) -> bool {
        matches!(self, Self::Video | Self::Text)
    }

    /// Whether clips on this track contribute audio.
    pub fn has_audio(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/// An ordered lane of non-overlapping clips.
///
/// Clips are kept sorted by start time. Position in the timeline's track list
/// is the z-index: index 0 is the bottom layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    /// Is track locked (prevent edits)
    #[serde(default)]
    pub locked: bool,
    /// Hidden tracks contribute no image
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Muted tracks contribute no audio
    #[serde(default)]
    pub muted: bool,
    /// Clips sorted by start time
    #[serde(default)]
    pub clips: Vec<Clip>,
}

fn default_true() -> bool {
    true
}

impl Track {
    /// Create an empty, unlocked, visible track.
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            locked: false,
            visible: true,
            muted: false,
            clips: Vec::new(),
        }
    }

    /// Create a new video track.
    pub fn new_video(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Video)
    }

    /// Create a new audio track.
    pub fn new_audio(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    /// End time of the last clip, or zero for an empty track.
    pub fn end_time(&self) -> f64 {
        self.clips.last().map_or(0.0, Clip::end_time)
    }

    /// Find a clip by ID. Returns (index, &Clip).
    pub fn find_clip(&self, id: ClipId) -> Option<(usize, &Clip)> {
        self.clips.iter().enumerate().find(|(_, c)| c.id == id)
    }

    /// Find a clip mutably by ID.
    pub fn find_clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Clip under timeline time `t`, found by binary search.
    pub fn clip_at(&self, t: f64) -> Option<&Clip> {
        self.clip_index_at(t).map(|i| &self.clips[i])
    }

    /// Index of the clip under timeline time `t`.
    pub fn clip_index_at(&self, t: f64) -> Option<usize> {
        let idx = self
            .clips
            .partition_point(|c| c.start_time <= t + TIME_EPSILON)
            .checked_sub(1)?;
        self.clips[idx].contains(t).then_some(idx)
    }

    /// Clips intersecting `range`, as a contiguous slice.
    ///
    /// Relies on the sort order: with no overlaps, end times are sorted too.
    pub fn clips_in_range(&self, range: TimeRange) -> &[Clip] {
        let first = self
            .clips
            .partition_point(|c| c.end_time() <= range.start + TIME_EPSILON);
        let last = self
            .clips
            .partition_point(|c| c.start_time < range.end() - TIME_EPSILON);
        if first >= last {
            &[]
        } else {
            &self.clips[first..last]
        }
    }

    /// The clip touching clip `index` on the given side, if any.
    pub fn adjacent(&self, index: usize, edge: TransitionEdge) -> Option<&Clip> {
        let clip = self.clips.get(index)?;
        match edge {
            TransitionEdge::In => {
                let prev = self.clips.get(index.checked_sub(1)?)?;
                ((prev.end_time() - clip.start_time).abs() <= TIME_EPSILON).then_some(prev)
            }
            TransitionEdge::Out => {
                let next = self.clips.get(index + 1)?;
                ((next.start_time - clip.end_time()).abs() <= TIME_EPSILON).then_some(next)
            }
        }
    }

    /// Insert a clip keeping the start-time order.
    pub(crate) fn insert_sorted(&mut self, clip: Clip) {
        let idx = self
            .clips
            .partition_point(|c| c.start_time < clip.start_time);
        self.clips.insert(idx, clip);
    }

    /// Remove a clip by ID. Returns the removed clip.
    pub(crate) fn remove_clip(&mut self, id: ClipId) -> Option<Clip> {
        let idx = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(idx))
    }

    /// Fail with `TrackLocked` when edits are not allowed.
    pub fn ensure_unlocked(&self) -> Result<(), InvariantError> {
        if self.locked {
            Err(InvariantError::TrackLocked(self.id))
        } else {
            Ok(())
        }
    }

    /// Check every clip plus the ordering, overlap and transition rules.
    pub fn validate(&self) -> Result<(), InvariantError> {
        for clip in &self.clips {
            clip.validate()?;
            if clip.track_id != self.id {
                return Err(InvariantError::InvalidTimeline(format!(
                    "clip {} claims track {} but sits on track {}",
                    clip.id, clip.track_id, self.id
                )));
            }
        }

        for pair in self.clips.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.start_time < a.start_time {
                return Err(InvariantError::InvalidTimeline(format!(
                    "clips on track {} are not sorted by start time",
                    self.id
                )));
            }
            if a.range().overlaps(b.range()) {
                return Err(InvariantError::Overlap {
                    track_id: self.id,
                    clip_id: b.id,
                    other: a.id,
                });
            }
        }

        for (index, clip) in self.clips.iter().enumerate() {
            self.validate_transition(index, clip, TransitionEdge::In)?;
            self.validate_transition(index, clip, TransitionEdge::Out)?;
        }
        Ok(())
    }

    fn validate_transition(
        &self,
        index: usize,
        clip: &Clip,
        edge: TransitionEdge,
    ) -> Result<(), InvariantError> {
        let Some(transition) = clip.transition(edge) else {
            return Ok(());
        };
        let neighbour = self.adjacent(index, edge);
        let shortest = neighbour.map_or(clip.duration, |n| n.duration.min(clip.duration));
        let limit = shortest / 2.0;
        if transition.duration > limit + TIME_EPSILON {
            return Err(InvariantError::TransitionTooLong {
                clip_id: clip.id,
                duration: transition.duration,
                limit,
            });
        }
        // A boundary carries at most one transition; report it once, from the Out side.
        if let (TransitionEdge::Out, Some(next)) = (edge, neighbour) {
            if next.transition_in.is_some() {
                return Err(InvariantError::TransitionConflict {
                    first: clip.id,
                    second: next.id,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Transition;
    use framecut_core::AssetId;

    fn track_with(spans: &[(f64, f64)]) -> Track {
        let mut track = Track::new_video("V1");
        for (start, duration) in spans {
            let clip = Clip::new("c", AssetId::new("a"), *duration, track.id, *start);
            track.insert_sorted(clip);
        }
        track
    }

    #[test]
    fn test_clip_at_binary_search() {
        let track = track_with(&[(0.0, 5.0), (5.0, 3.0), (10.0, 2.0)]);
        assert_eq!(track.clip_at(0.0).map(|c| c.start_time), Some(0.0));
        assert_eq!(track.clip_at(4.999).map(|c| c.start_time), Some(0.0));
        assert_eq!(track.clip_at(5.0).map(|c| c.start_time), Some(5.0));
        assert!(track.clip_at(9.0).is_none());
        assert!(track.clip_at(12.0).is_none());
        assert!(track.clip_at(-1.0).is_none());
    }

    #[test]
    fn test_clips_in_range() {
        let track = track_with(&[(0.0, 5.0), (5.0, 3.0), (10.0, 2.0), (20.0, 1.0)]);
        let hits = track.clips_in_range(TimeRange::new(6.0, 5.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start_time, 5.0);
        assert_eq!(hits[1].start_time, 10.0);
        assert!(track.clips_in_range(TimeRange::new(13.0, 5.0)).is_empty());
    }

    #[test]
    fn test_overlap_detected() {
        let track = track_with(&[(0.0, 5.0), (2.0, 3.0)]);
        assert!(matches!(
            track.validate(),
            Err(InvariantError::Overlap { .. })
        ));
        assert!(track_with(&[(0.0, 5.0), (5.0, 3.0)]).validate().is_ok());
    }

    #[test]
    fn test_transition_limit_uses_shorter_neighbour() {
        let mut track = track_with(&[(0.0, 5.0), (5.0, 3.0)]);
        track.clips[0].transition_out = Some(Transition::dissolve(1.5));
        assert!(track.validate().is_ok());

        track.clips[0].transition_out = Some(Transition::dissolve(1.6));
        assert!(matches!(
            track.validate(),
            Err(InvariantError::TransitionTooLong { .. })
        ));
    }

    #[test]
    fn test_one_transition_per_boundary() {
        let mut track = track_with(&[(0.0, 5.0), (5.0, 3.0)]);
        track.clips[0].transition_out = Some(Transition::dissolve(1.0));
        track.clips[1].transition_in = Some(Transition::dissolve(1.0));
        assert!(matches!(
            track.validate(),
            Err(InvariantError::TransitionConflict { .. })
        ));
    }

    #[test]
    fn test_locked_track() {
        let mut track = Track::new_audio("A1");
        assert!(track.ensure_unlocked().is_ok());
        track.locked = true;
        assert_eq!(
            track.ensure_unlocked(),
            Err(InvariantError::TrackLocked(track.id))
        );
    }
}
