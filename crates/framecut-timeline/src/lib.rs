//! FrameCut Timeline - Timeline data model
//!
//! Implements the editable document behind the editor:
//! - Tracks containing non-overlapping clips
//! - Per-clip effects, boundary transitions and markers
//! - Reversible operations with undo/redo and remote reconciliation
//! - Versioned JSON persistence with migrations

pub mod clip;
pub mod edit;
pub mod effect;
pub mod history;
pub mod marker;
pub mod serialization;
pub mod timeline;
pub mod track;

pub use clip::Clip;
pub use edit::Operation;
pub use effect::{Effect, ParamValue, Transition, TransitionEdge, TransitionKind};
pub use history::{EditLog, OperationStamp, StampedOperation};
pub use marker::{Marker, MarkerKind};
pub use serialization::{TimelineDocument, ViewState, CURRENT_VERSION};
pub use timeline::Timeline;
pub use track::{Track, TrackKind};
