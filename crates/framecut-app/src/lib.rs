//! FrameCut application layer
//!
//! Wires the model, compositor, export pipeline and track view into one
//! editing session, and owns configuration and logging setup.

pub mod config;
pub mod logging;
pub mod session;

pub use config::{EditorConfig, LoggingConfig};
pub use logging::init_logging;
pub use session::{EditorSession, RemoteRejection};
