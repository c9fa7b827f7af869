//! Edit operations with undo support.
//!
//! Every mutation of a [`Timeline`] is an [`Operation`]. Applying an operation
//! to a working copy also yields its inverse, derived from the state the
//! operation saw, so undo restores the prior timeline exactly.

use framecut_core::{ClipId, EffectId, InvariantError, MarkerId, TimeRange, TrackId, TIME_EPSILON};
use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::effect::{Effect, Transition, TransitionEdge};
use crate::marker::Marker;
use crate::timeline::{validate_selection, Timeline};
use crate::track::Track;

/// An atomic, serializable timeline mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Place a clip on the track named by `clip.track_id`.
    AddClip { clip: Clip },
    RemoveClip { clip_id: ClipId },
    /// Move a clip to a new start time, possibly on another track.
    MoveClip {
        clip_id: ClipId,
        track_id: TrackId,
        start_time: f64,
    },
    /// Set new source in and/or out points. Moving the in point keeps the
    /// clip's timeline end fixed.
    TrimClip {
        clip_id: ClipId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        in_point: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_point: Option<f64>,
    },
    /// Insert an effect at `index`, or append when `None`.
    AddEffect {
        clip_id: ClipId,
        effect: Effect,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveEffect {
        clip_id: ClipId,
        effect_id: EffectId,
    },
    /// Attach a transition to one edge of a clip, replacing any existing one.
    AddTransition {
        clip_id: ClipId,
        edge: TransitionEdge,
        transition: Transition,
    },
    RemoveTransition {
        clip_id: ClipId,
        edge: TransitionEdge,
    },
    /// Cut a clip in two at timeline time `at`; the right half gets `new_clip_id`.
    SplitClip {
        clip_id: ClipId,
        at: f64,
        new_clip_id: ClipId,
    },
    /// Replace a clip's properties. The clip stays on its track.
    UpdateClip { clip: Clip },
    AddTrack {
        track: Track,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    RemoveTrack { track_id: TrackId },
    SetTrackFlags {
        track_id: TrackId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        muted: Option<bool>,
    },
    AddMarker { marker: Marker },
    RemoveMarker { marker_id: MarkerId },
    /// Move the playhead; clamped to `[0, duration]`.
    SetPlayhead { time: f64 },
    SetZoom { zoom: f64 },
    SetSelection { selection: Option<TimeRange> },
    /// Several operations applied atomically.
    Batch { ops: Vec<Operation> },
}

impl Operation {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddClip { .. } => "add_clip",
            Self::RemoveClip { .. } => "remove_clip",
            Self::MoveClip { .. } => "move_clip",
            Self::TrimClip { .. } => "trim_clip",
            Self::AddEffect { .. } => "add_effect",
            Self::RemoveEffect { .. } => "remove_effect",
            Self::AddTransition { .. } => "add_transition",
            Self::RemoveTransition { .. } => "remove_transition",
            Self::SplitClip { .. } => "split_clip",
            Self::UpdateClip { .. } => "update_clip",
            Self::AddTrack { .. } => "add_track",
            Self::RemoveTrack { .. } => "remove_track",
            Self::SetTrackFlags { .. } => "set_track_flags",
            Self::AddMarker { .. } => "add_marker",
            Self::RemoveMarker { .. } => "remove_marker",
            Self::SetPlayhead { .. } => "set_playhead",
            Self::SetZoom { .. } => "set_zoom",
            Self::SetSelection { .. } => "set_selection",
            Self::Batch { .. } => "batch",
        }
    }

    /// View-only changes go through the log but never onto the undo history.
    pub fn is_view_change(&self) -> bool {
        match self {
            Self::SetPlayhead { .. } | Self::SetZoom { .. } | Self::SetSelection { .. } => true,
            Self::Batch { ops } => !ops.is_empty() && ops.iter().all(Operation::is_view_change),
            _ => false,
        }
    }

    /// The document part of this operation, with playhead, zoom and
    /// selection changes removed from batches. `None` if nothing is left.
    pub fn without_view_changes(self) -> Option<Operation> {
        match self {
            Self::Batch { ops } => {
                let mut ops: Vec<Operation> = ops
                    .into_iter()
                    .filter_map(Operation::without_view_changes)
                    .collect();
                match ops.len() {
                    0 => None,
                    1 => ops.pop(),
                    _ => Some(Self::Batch { ops }),
                }
            }
            op if op.is_view_change() => None,
            op => Some(op),
        }
    }

    /// Mutate `timeline` in place and return the inverse operation.
    ///
    /// Only checks what the final validation pass cannot see (existence,
    /// locks, duplicate ids). `Timeline::apply_with_inverse` runs on a
    /// scratch copy and validates afterwards, so an error here never leaks a
    /// half-applied edit.
    pub(crate) fn apply_to(&self, tl: &mut Timeline) -> Result<Operation, InvariantError> {
        match self {
            Self::AddClip { clip } => {
                if tl.find_clip(clip.id).is_some() {
                    return Err(InvariantError::DuplicateId(clip.id.to_string()));
                }
                let track = tl.track_mut(clip.track_id)?;
                track.ensure_unlocked()?;
                track.insert_sorted(clip.clone());
                Ok(Self::RemoveClip { clip_id: clip.id })
            }
            Self::RemoveClip { clip_id } => {
                let track = editable_track_of(tl, *clip_id)?;
                let removed = track
                    .remove_clip(*clip_id)
                    .ok_or(InvariantError::ClipNotFound(*clip_id))?;
                Ok(Self::AddClip { clip: removed })
            }
            Self::MoveClip {
                clip_id,
                track_id,
                start_time,
            } => {
                let source = editable_track_of(tl, *clip_id)?;
                let mut clip = source
                    .remove_clip(*clip_id)
                    .ok_or(InvariantError::ClipNotFound(*clip_id))?;
                let inverse = Self::MoveClip {
                    clip_id: *clip_id,
                    track_id: clip.track_id,
                    start_time: clip.start_time,
                };
                let dest = tl.track_mut(*track_id)?;
                dest.ensure_unlocked()?;
                clip.track_id = *track_id;
                clip.start_time = *start_time;
                dest.insert_sorted(clip);
                Ok(inverse)
            }
            Self::TrimClip {
                clip_id,
                in_point,
                out_point,
            } => {
                let clip = editable_clip(tl, *clip_id)?;
                let before = clip.clone();
                if let Some(new_in) = *in_point {
                    clip.start_time += new_in - clip.in_point;
                    clip.in_point = new_in;
                }
                if let Some(new_out) = *out_point {
                    clip.out_point = new_out;
                }
                clip.duration = clip.out_point - clip.in_point;
                Ok(Self::UpdateClip { clip: before })
            }
            Self::AddEffect {
                clip_id,
                effect,
                index,
            } => {
                let clip = editable_clip(tl, *clip_id)?;
                if clip.effect_index(effect.id).is_some() {
                    return Err(InvariantError::DuplicateId(effect.id.to_string()));
                }
                let len = clip.effects.len();
                clip.effects.insert(index.unwrap_or(len).min(len), effect.clone());
                Ok(Self::RemoveEffect {
                    clip_id: *clip_id,
                    effect_id: effect.id,
                })
            }
            Self::RemoveEffect { clip_id, effect_id } => {
                let clip = editable_clip(tl, *clip_id)?;
                let index = clip
                    .effect_index(*effect_id)
                    .ok_or(InvariantError::EffectNotFound {
                        clip_id: *clip_id,
                        effect_id: *effect_id,
                    })?;
                let effect = clip.effects.remove(index);
                Ok(Self::AddEffect {
                    clip_id: *clip_id,
                    effect,
                    index: Some(index),
                })
            }
            Self::AddTransition {
                clip_id,
                edge,
                transition,
            } => {
                let track = editable_track_of(tl, *clip_id)?;
                let index = track
                    .clips
                    .iter()
                    .position(|c| c.id == *clip_id)
                    .ok_or(InvariantError::ClipNotFound(*clip_id))?;
                if track.adjacent(index, *edge).is_none() {
                    return Err(InvariantError::NoAdjacentClip(*clip_id));
                }
                let clip = &mut track.clips[index];
                let before = clip.clone();
                let replaced = clip.transition_mut(*edge).replace(transition.clone());
                Ok(match replaced {
                    None => Self::RemoveTransition {
                        clip_id: *clip_id,
                        edge: *edge,
                    },
                    Some(_) => Self::UpdateClip { clip: before },
                })
            }
            Self::RemoveTransition { clip_id, edge } => {
                let clip = editable_clip(tl, *clip_id)?;
                let before = clip.clone();
                if clip.transition_mut(*edge).take().is_none() {
                    return Err(InvariantError::TransitionNotFound(*clip_id));
                }
                // Restoring through UpdateClip also works once the neighbour is gone.
                Ok(Self::UpdateClip { clip: before })
            }
            Self::SplitClip {
                clip_id,
                at,
                new_clip_id,
            } => {
                if tl.find_clip(*new_clip_id).is_some() {
                    return Err(InvariantError::DuplicateId(new_clip_id.to_string()));
                }
                let track = editable_track_of(tl, *clip_id)?;
                let left = track
                    .find_clip_mut(*clip_id)
                    .ok_or(InvariantError::ClipNotFound(*clip_id))?;
                if !(*at > left.start_time + TIME_EPSILON && *at < left.end_time() - TIME_EPSILON) {
                    return Err(InvariantError::NothingToSplit(*at));
                }
                let before = left.clone();
                let mut right = left.clone();

                let left_duration = *at - left.start_time;
                left.out_point = left.in_point + left_duration;
                left.duration = left.out_point - left.in_point;
                left.audio_fade_in = left.audio_fade_in.min(left.duration);
                left.audio_fade_out = 0.0;
                left.transition_out = None;

                right.id = *new_clip_id;
                right.start_time = *at;
                right.in_point = left.out_point;
                right.duration = right.out_point - right.in_point;
                right.audio_fade_in = 0.0;
                right.audio_fade_out = right.audio_fade_out.min(right.duration);
                right.transition_in = None;

                track.insert_sorted(right);
                Ok(Self::Batch {
                    ops: vec![
                        Self::RemoveClip {
                            clip_id: *new_clip_id,
                        },
                        Self::UpdateClip { clip: before },
                    ],
                })
            }
            Self::UpdateClip { clip } => {
                let track = editable_track_of(tl, clip.id)?;
                if clip.track_id != track.id {
                    return Err(InvariantError::InvalidTimeline(format!(
                        "update of clip {} cannot change its track; move it instead",
                        clip.id
                    )));
                }
                let old = track
                    .remove_clip(clip.id)
                    .ok_or(InvariantError::ClipNotFound(clip.id))?;
                track.insert_sorted(clip.clone());
                Ok(Self::UpdateClip { clip: old })
            }
            Self::AddTrack { track, index } => {
                if tl.track(track.id).is_some() {
                    return Err(InvariantError::DuplicateId(track.id.to_string()));
                }
                let len = tl.tracks.len();
                tl.tracks
                    .insert(index.unwrap_or(len).min(len), track.clone());
                Ok(Self::RemoveTrack { track_id: track.id })
            }
            Self::RemoveTrack { track_id } => {
                let index = tl
                    .track_index(*track_id)
                    .ok_or(InvariantError::TrackNotFound(*track_id))?;
                tl.tracks[index].ensure_unlocked()?;
                let track = tl.tracks.remove(index);
                Ok(Self::AddTrack {
                    track,
                    index: Some(index),
                })
            }
            Self::SetTrackFlags {
                track_id,
                locked,
                visible,
                muted,
            } => {
                let track = tl.track_mut(*track_id)?;
                let inverse = Self::SetTrackFlags {
                    track_id: *track_id,
                    locked: locked.map(|_| track.locked),
                    visible: visible.map(|_| track.visible),
                    muted: muted.map(|_| track.muted),
                };
                if let Some(v) = *locked {
                    track.locked = v;
                }
                if let Some(v) = *visible {
                    track.visible = v;
                }
                if let Some(v) = *muted {
                    track.muted = v;
                }
                Ok(inverse)
            }
            Self::AddMarker { marker } => {
                if tl.markers.iter().any(|m| m.id == marker.id) {
                    return Err(InvariantError::DuplicateId(marker.id.to_string()));
                }
                let index = tl.markers.partition_point(|m| m.sorts_before(marker));
                tl.markers.insert(index, marker.clone());
                Ok(Self::RemoveMarker {
                    marker_id: marker.id,
                })
            }
            Self::RemoveMarker { marker_id } => {
                let index = tl
                    .markers
                    .iter()
                    .position(|m| m.id == *marker_id)
                    .ok_or(InvariantError::MarkerNotFound(*marker_id))?;
                let marker = tl.markers.remove(index);
                Ok(Self::AddMarker { marker })
            }
            Self::SetPlayhead { time } => {
                if !time.is_finite() {
                    return Err(InvariantError::PropertyOutOfRange {
                        field: "playhead",
                        value: *time,
                    });
                }
                let previous = tl.playhead;
                tl.playhead = time.clamp(0.0, tl.computed_duration());
                Ok(Self::SetPlayhead { time: previous })
            }
            Self::SetZoom { zoom } => {
                if !(zoom.is_finite() && *zoom > 0.0) {
                    return Err(InvariantError::PropertyOutOfRange {
                        field: "zoom",
                        value: *zoom,
                    });
                }
                let previous = tl.zoom;
                tl.zoom = *zoom;
                Ok(Self::SetZoom { zoom: previous })
            }
            Self::SetSelection { selection } => {
                if let Some(range) = selection {
                    validate_selection(*range)?;
                }
                let previous = tl.selection;
                tl.selection = *selection;
                Ok(Self::SetSelection {
                    selection: previous,
                })
            }
            Self::Batch { ops } => {
                let mut inverses = Vec::with_capacity(ops.len());
                for op in ops {
                    inverses.push(op.apply_to(tl)?);
                }
                inverses.reverse();
                Ok(Self::Batch { ops: inverses })
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// The unlocked track holding `clip_id`.
fn editable_track_of(tl: &mut Timeline, clip_id: ClipId) -> Result<&mut Track, InvariantError> {
    let track = tl
        .tracks
        .iter_mut()
        .find(|t| t.clips.iter().any(|c| c.id == clip_id))
        .ok_or(InvariantError::ClipNotFound(clip_id))?;
    track.ensure_unlocked()?;
    Ok(track)
}

/// A clip on an unlocked track.
fn editable_clip(tl: &mut Timeline, clip_id: ClipId) -> Result<&mut Clip, InvariantError> {
    editable_track_of(tl, clip_id)?
        .find_clip_mut(clip_id)
        .ok_or(InvariantError::ClipNotFound(clip_id))
}

// ── Tests ───────────────────────────────────────────────────────
