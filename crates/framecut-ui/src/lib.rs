//! FrameCut UI - the timeline track view and its input surface
//!
//! Nothing here touches a window system. The renderer turns a timeline
//! snapshot into a draw list for whatever [`RasterBackend`] the host
//! provides; hit-testing maps pointer positions back to model entities.
//!
//! - `renderer`: ruler, track rows, culled clips, waveforms, playhead
//! - `hit_test`: pointer position to ruler / clip / trim handle / track
//! - `commands`: keyboard shortcuts to editor actions
//! - `scheduler`: fixed-rate cooperative tick loop

pub mod commands;
pub mod draw;
pub mod hit_test;
pub mod layout;
pub mod peaks;
pub mod renderer;
pub mod ruler;
pub mod scheduler;
pub mod theme;

pub use commands::{EditorAction, Keymap, Modifiers, Shortcut};
pub use draw::{DrawCommand, RasterBackend};
pub use hit_test::{hit_test, HitTarget, TrimEdge};
pub use layout::{pixel_to_time, time_to_pixel, TimelineLayout, Viewport};
pub use peaks::PeakStore;
pub use renderer::{RenderOutput, TimelineRenderer};
pub use scheduler::{TickHandle, TickInfo, TickScheduler};
