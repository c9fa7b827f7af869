//! Timeline persistence with versioning and migration.
//!
//! Uses JSON with a schema version field. Unknown versions are rejected
//! rather than coerced, and a loaded document is fully revalidated before a
//! `Timeline` is handed out.

use std::path::Path;

use framecut_core::{FrameCutError, Result, TimeRange};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::marker::Marker;
use crate::timeline::{Timeline, DEFAULT_ZOOM};
use crate::track::Track;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Persisted view state (added in version 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub playhead: f64,
    pub zoom: f64,
    #[serde(default)]
    pub selection: Option<TimeRange>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            playhead: 0.0,
            zoom: DEFAULT_ZOOM,
            selection: None,
        }
    }
}

/// Versioned timeline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    /// Schema version for migration.
    pub version: u32,
    pub tracks: Vec<Track>,
    pub duration: f64,
    #[serde(default)]
    pub markers: Vec<Marker>,
    pub view: ViewState,
}

impl TimelineDocument {
    /// Snapshot a timeline into the current document format.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        Self {
            version: CURRENT_VERSION,
            tracks: timeline.tracks.clone(),
            duration: timeline.duration,
            markers: timeline.markers.clone(),
            view: ViewState {
                playhead: timeline.playhead,
                zoom: timeline.zoom,
                selection: timeline.selection,
            },
        }
    }

    /// Rebuild and validate the timeline. Any violation blocks the load.
    pub fn into_timeline(self) -> Result<Timeline> {
        let timeline = Timeline {
            tracks: self.tracks,
            duration: self.duration,
            playhead: self.view.playhead,
            zoom: self.view.zoom,
            selection: self.view.selection,
            markers: self.markers,
        };
        timeline.validate()?;
        Ok(timeline)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            FrameCutError::Serialization(format!("Failed to serialize timeline: {}", e))
        })
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        // First, read just the version
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| FrameCutError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw
            .get("version")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());
        let version = match version {
            Some(v) if (1..=CURRENT_VERSION).contains(&v) => v,
            found => {
                return Err(FrameCutError::VersionMismatch {
                    found,
                    supported: CURRENT_VERSION,
                })
            }
        };

        let migrated = migrate(raw, version)?;

        serde_json::from_value(migrated)
            .map_err(|e| FrameCutError::Serialization(format!("Failed to parse timeline: {}", e)))
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            1 => {
                // v1 → v2: view state moved into the document
                let object = data.as_object_mut().ok_or_else(|| {
                    FrameCutError::Serialization("Timeline document is not an object".into())
                })?;
                let view = serde_json::to_value(ViewState::default())
                    .map_err(|e| FrameCutError::Serialization(e.to_string()))?;
                object.entry("view").or_insert(view);
                object.insert("version".into(), serde_json::json!(2));
                version = 2;
            }
            _ => {
                return Err(FrameCutError::VersionMismatch {
                    found: Some(version),
                    supported: CURRENT_VERSION,
                });
            }
        }
    }

    Ok(data)
}

/// Serialize a timeline to document JSON.
pub fn to_json(timeline: &Timeline) -> Result<Vec<u8>> {
    TimelineDocument::from_timeline(timeline).to_json()
}

/// Parse, migrate and validate document JSON.
pub fn from_json(data: &[u8]) -> Result<Timeline> {
    TimelineDocument::from_json(data)?.into_timeline()
}

/// Save a timeline to a file path.
pub fn save_to_file(timeline: &Timeline, path: &Path) -> Result<()> {
    let data = to_json(timeline)?;
    std::fs::write(path, data)?;
    info!(path = %path.display(), tracks = timeline.tracks.len(), "timeline saved");
    Ok(())
}

/// Load a timeline from a file path.
pub fn load_from_file(path: &Path) -> Result<Timeline> {
    let data = std::fs::read(path)?;
    let timeline = from_json(&data)?;
    info!(
        path = %path.display(),
        tracks = timeline.tracks.len(),
        clips = timeline.clip_count(),
        duration = timeline.duration,
        "timeline loaded"
    );
    Ok(timeline)
}
