//! Error types for FrameCut.

use thiserror::Error;

use crate::ids::{AssetId, AuthorId, ClipId, EffectId, MarkerId, TrackId};

/// An edit that would break a timeline invariant.
///
/// Returned by every mutator; the timeline it was applied to is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantError {
    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("clip {0} not found")]
    ClipNotFound(ClipId),

    #[error("effect {effect_id} not found on clip {clip_id}")]
    EffectNotFound { clip_id: ClipId, effect_id: EffectId },

    #[error("marker {0} not found")]
    MarkerNotFound(MarkerId),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("track {0} is locked")]
    TrackLocked(TrackId),

    #[error("clip {clip_id} overlaps clip {other} on track {track_id}")]
    Overlap {
        track_id: TrackId,
        clip_id: ClipId,
        other: ClipId,
    },

    #[error("clip {clip_id} would have non-positive duration {duration}")]
    NonPositiveDuration { clip_id: ClipId, duration: f64 },

    #[error("clip {clip_id} would start before zero ({start})")]
    NegativeStart { clip_id: ClipId, start: f64 },

    #[error("clip {clip_id} source range [{in_point}, {out_point}) outside asset bounds [0, {asset_duration}]")]
    SourceOutOfBounds {
        clip_id: ClipId,
        in_point: f64,
        out_point: f64,
        asset_duration: f64,
    },

    #[error("clip {clip_id} duration {duration} does not match source range {source_span}")]
    DurationMismatch {
        clip_id: ClipId,
        duration: f64,
        source_span: f64,
    },

    #[error("{field} out of range: {value}")]
    PropertyOutOfRange { field: &'static str, value: f64 },

    #[error("transition on clip {clip_id} lasts {duration}s, limit is {limit}s")]
    TransitionTooLong {
        clip_id: ClipId,
        duration: f64,
        limit: f64,
    },

    #[error("boundary between clips {first} and {second} already carries a transition")]
    TransitionConflict { first: ClipId, second: ClipId },

    #[error("clip {0} has no transition on that edge")]
    TransitionNotFound(ClipId),

    #[error("clip {0} has no adjacent clip on that side")]
    NoAdjacentClip(ClipId),

    #[error("nothing to split at {0}s")]
    NothingToSplit(f64),

    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),
}

/// Main error type for FrameCut operations.
#[derive(Error, Debug)]
pub enum FrameCutError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    #[error("Asset {asset_id} unavailable: {reason}")]
    AssetUnavailable { asset_id: AssetId, reason: String },

    #[error("Decode failure at {timestamp:.3}s: {reason}")]
    DecodeFailure { timestamp: f64, reason: String },

    #[error("Encoder error: {0}")]
    EncodeFailure(String),

    #[error("Document version {found:?} not supported (current is {supported})")]
    VersionMismatch { found: Option<u32>, supported: u32 },

    #[error("Remote operation {author}#{sequence} rejected: {reason}")]
    ReconciliationRejected {
        author: AuthorId,
        sequence: u64,
        reason: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for FrameCut operations.
pub type Result<T> = std::result::Result<T, FrameCutError>;
