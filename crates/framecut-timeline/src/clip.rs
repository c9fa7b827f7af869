//! Clip types for the timeline.

use std::collections::HashSet;

use framecut_core::{AssetId, ClipId, InvariantError, TimeRange, TrackId, Vec2, TIME_EPSILON};
use serde::{Deserialize, Serialize};

use crate::effect::{Effect, Transition, TransitionEdge};

/// A placed, trimmed instance of a media asset on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Clip name (displayed in the track view)
    pub name: String,
    /// Reference to source media
    pub asset_id: AssetId,
    /// Length of the source asset in seconds
    pub asset_duration: f64,
    /// Track this clip lives on
    pub track_id: TrackId,
    /// Position on the timeline
    pub start_time: f64,
    /// Duration on the timeline
    pub duration: f64,
    /// Source in point
    pub in_point: f64,
    /// Source out point
    pub out_point: f64,
    /// Uniform scale factor
    pub scale: f64,
    /// Pixel offset from the canvas centre
    pub position: Vec2,
    /// Rotation in degrees, clockwise
    pub rotation: f64,
    pub opacity: f64,
    pub volume: f64,
    /// Linear fade-in length in seconds
    pub audio_fade_in: f64,
    /// Linear fade-out length in seconds
    pub audio_fade_out: f64,
    /// Effect chain, first entry applied first
    pub effects: Vec<Effect>,
    pub transition_in: Option<Transition>,
    pub transition_out: Option<Transition>,
}

impl Clip {
    /// Create a clip that uses the whole asset, placed at `start_time`.
    pub fn new(
        name: impl Into<String>,
        asset_id: AssetId,
        asset_duration: f64,
        track_id: TrackId,
        start_time: f64,
    ) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            asset_id,
            asset_duration,
            track_id,
            start_time,
            duration: asset_duration,
            in_point: 0.0,
            out_point: asset_duration,
            scale: 1.0,
            position: Vec2::ZERO,
            rotation: 0.0,
            opacity: 1.0,
            volume: 1.0,
            audio_fade_in: 0.0,
            audio_fade_out: 0.0,
            effects: Vec::new(),
            transition_in: None,
            transition_out: None,
        }
    }

    /// Restrict the clip to `[in_point, out_point)` of its source.
    pub fn with_source_range(mut self, in_point: f64, out_point: f64) -> Self {
        self.in_point = in_point;
        self.out_point = out_point;
        self.duration = out_point - in_point;
        self
    }

    /// End time on the timeline (exclusive).
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Timeline range occupied by this clip.
    #[inline]
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.duration)
    }

    /// Whether timeline time `t` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.range().contains(t)
    }

    /// Source time shown at timeline time `t`.
    #[inline]
    pub fn source_time_at(&self, t: f64) -> f64 {
        t - self.start_time + self.in_point
    }

    pub fn transition(&self, edge: TransitionEdge) -> Option<&Transition> {
        match edge {
            TransitionEdge::In => self.transition_in.as_ref(),
            TransitionEdge::Out => self.transition_out.as_ref(),
        }
    }

    pub fn transition_mut(&mut self, edge: TransitionEdge) -> &mut Option<Transition> {
        match edge {
            TransitionEdge::In => &mut self.transition_in,
            TransitionEdge::Out => &mut self.transition_out,
        }
    }

    /// Index of an effect in the chain.
    pub fn effect_index(&self, effect_id: framecut_core::EffectId) -> Option<usize> {
        self.effects.iter().position(|e| e.id == effect_id)
    }

    /// Check the clip-local invariants.
    ///
    /// Neighbour-dependent rules (overlap, transition limits) are checked by
    /// the owning track.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let id = self.id;
        if !self.duration.is_finite() || self.duration <= TIME_EPSILON {
            return Err(InvariantError::NonPositiveDuration {
                clip_id: id,
                duration: self.duration,
            });
        }
        if !self.start_time.is_finite() || self.start_time < -TIME_EPSILON {
            return Err(InvariantError::NegativeStart {
                clip_id: id,
                start: self.start_time,
            });
        }
        if !(self.in_point >= -TIME_EPSILON
            && self.in_point < self.out_point
            && self.out_point <= self.asset_duration + TIME_EPSILON)
        {
            return Err(InvariantError::SourceOutOfBounds {
                clip_id: id,
                in_point: self.in_point,
                out_point: self.out_point,
                asset_duration: self.asset_duration,
            });
        }
        let source_span = self.out_point - self.in_point;
        if (source_span - self.duration).abs() > TIME_EPSILON * 1e3 {
            return Err(InvariantError::DurationMismatch {
                clip_id: id,
                duration: self.duration,
                source_span,
            });
        }

        unit_range("opacity", self.opacity)?;
        unit_range("volume", self.volume)?;
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(InvariantError::PropertyOutOfRange {
                field: "scale",
                value: self.scale,
            });
        }
        if !self.rotation.is_finite() {
            return Err(InvariantError::PropertyOutOfRange {
                field: "rotation",
                value: self.rotation,
            });
        }
        if !self.position.is_finite() {
            return Err(InvariantError::PropertyOutOfRange {
                field: "position",
                value: f64::NAN,
            });
        }
        non_negative("audio_fade_in", self.audio_fade_in)?;
        non_negative("audio_fade_out", self.audio_fade_out)?;
        if self.audio_fade_in + self.audio_fade_out > self.duration + TIME_EPSILON {
            return Err(InvariantError::PropertyOutOfRange {
                field: "audio_fade_in + audio_fade_out",
                value: self.audio_fade_in + self.audio_fade_out,
            });
        }

        let mut seen = HashSet::with_capacity(self.effects.len());
        for effect in &self.effects {
            if !seen.insert(effect.id) {
                return Err(InvariantError::DuplicateId(effect.id.to_string()));
            }
        }

        for transition in [&self.transition_in, &self.transition_out].into_iter().flatten() {
            if !(transition.duration.is_finite() && transition.duration > TIME_EPSILON) {
                return Err(InvariantError::PropertyOutOfRange {
                    field: "transition.duration",
                    value: transition.duration,
                });
            }
        }
        Ok(())
    }
}

fn unit_range(field: &'static str, value: f64) -> Result<(), InvariantError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InvariantError::PropertyOutOfRange { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InvariantError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvariantError::PropertyOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> Clip {
        Clip::new("a", AssetId::new("a.mp4"), 10.0, TrackId::new(), 2.0).with_source_range(1.0, 6.0)
    }

    #[test]
    fn test_source_mapping() {
        let c = clip();
        assert_eq!(c.duration, 5.0);
        assert_eq!(c.end_time(), 7.0);
        assert_eq!(c.source_time_at(2.0), 1.0);
        assert_eq!(c.source_time_at(4.5), 3.5);
        assert!(c.contains(2.0));
        assert!(!c.contains(7.0));
    }

    #[test]
    fn test_validate_ok() {
        assert!(clip().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut c = clip();
        c.out_point = c.in_point;
        c.duration = 0.0;
        assert!(matches!(
            c.validate(),
            Err(InvariantError::NonPositiveDuration { .. })
        ));
    }

    #[test]
    fn test_validate_source_bounds() {
        let c = clip().with_source_range(4.0, 11.0);
        assert!(matches!(
            c.validate(),
            Err(InvariantError::SourceOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_validate_duration_mismatch() {
        let mut c = clip();
        c.duration = 4.0;
        assert!(matches!(
            c.validate(),
            Err(InvariantError::DurationMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_properties() {
        let mut c = clip();
        c.opacity = 1.5;
        assert!(matches!(
            c.validate(),
            Err(InvariantError::PropertyOutOfRange { field: "opacity", .. })
        ));

        let mut c = clip();
        c.audio_fade_in = 3.0;
        c.audio_fade_out = 3.0;
        assert!(c.validate().is_err());

        let mut c = clip();
        let effect = Effect::new("invert");
        c.effects = vec![effect.clone(), effect];
        assert!(matches!(c.validate(), Err(InvariantError::DuplicateId(_))));
    }
}
