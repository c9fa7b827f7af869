//! FrameCut Media - the boundary to the external decode service
//!
//! The editor never decodes media itself. Frames, audio and waveform peaks
//! are requested through [`MediaSource`]; latency and decode correctness are
//! the provider's concern. [`PatternSource`] is an in-memory provider that
//! synthesises deterministic content, used by tests and the CLI.

pub mod pattern;
pub mod source;

pub use pattern::{PatternAsset, PatternKind, PatternSource};
pub use source::{AssetInfo, MediaSource};
