//! FrameCut Render - preview compositing and export
//!
//! - `Compositor`: resolves the active clips at `t`, applies transforms,
//!   effects and transitions, mixes audio, and returns one `CompositeFrame`
//! - `ExportJob`: renders an immutable timeline snapshot into an `ExportSink`

pub mod compositor;
pub mod export;

pub use compositor::{CompositeFrame, Compositor, CompositorConfig, MediaErrorPolicy};
pub use export::{
    spawn_export, ExportFormat, ExportHandle, ExportJob, ExportProgress, ExportSink, ExportState,
    MemorySink, RawFileSink,
};
