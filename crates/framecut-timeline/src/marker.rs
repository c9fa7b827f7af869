//! Timeline markers.

use framecut_core::{Color, MarkerId};
use serde::{Deserialize, Serialize};

/// What a marker is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    #[default]
    Standard,
    Chapter,
    Todo,
}

/// A labelled point on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    /// Position in seconds
    pub time: f64,
    #[serde(default)]
    pub label: Option<String>,
    pub color: Color,
    #[serde(default)]
    pub kind: MarkerKind,
}

impl Marker {
    pub fn new(time: f64) -> Self {
        Self {
            id: MarkerId::new(),
            time,
            label: None,
            color: Color::YELLOW,
            kind: MarkerKind::Standard,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: MarkerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Total order used to keep the marker list sorted: time, then id.
    pub(crate) fn sorts_before(&self, other: &Marker) -> bool {
        self.time < other.time || (self.time == other.time && self.id < other.id)
    }
}
