//! FrameCut Core - Foundation types for the editing engine
//!
//! This crate provides the fundamental types used throughout FrameCut:
//! - Identifiers for tracks, clips, effects, markers and assets
//! - Time representation (seconds, FrameRate, TimeRange)
//! - RGBA frame buffers
//! - Geometric primitives and colors
//! - The shared error taxonomy and cancellation token

pub mod cancel;
pub mod color;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod ids;
pub mod time;

pub use cancel::CancelToken;
pub use color::Color;
pub use error::{FrameCutError, InvariantError, Result};
pub use frame::FrameBuffer;
pub use geometry::{Rect, Transform2D, Vec2};
pub use ids::{AssetId, AuthorId, ClipId, EffectId, MarkerId, TrackId};
pub use time::{format_timecode, time_eq, FrameRate, TimeRange, TIME_EPSILON};
