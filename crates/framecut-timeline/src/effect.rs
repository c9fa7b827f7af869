//! Effects and transitions attached to clips.

use std::collections::BTreeMap;

use framecut_core::{Color, EffectId};
use serde::{Deserialize, Serialize};

/// Effect and transition parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Color(Color),
    Vec2([f32; 2]),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value; ints widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Named parameters, kept in a deterministic order for structural equality.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A per-clip video effect instance.
///
/// The clip's effect list is applied in order, first entry innermost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EffectId,
    /// Registered effect type, e.g. `"brightness"`
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
    #[serde(default)]
    pub parameters: ParamMap,
}

impl Effect {
    /// Create an enabled effect with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: EffectId::new(),
            kind: kind.into(),
            enabled: true,
            parameters: ParamMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Numeric parameter with a fallback.
    pub fn float_param(&self, name: &str, default: f64) -> f64 {
        self.parameters
            .get(name)
            .and_then(ParamValue::as_f64)
            .unwrap_or(default)
    }
}

/// Blend function used across a clip boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Hard switch at the midpoint of the window
    Cut,
    /// Linear cross-fade
    Dissolve,
    /// Moving edge reveals the incoming clip
    Wipe,
    /// Incoming clip pushes the outgoing one off screen
    Slide,
    /// Named blend resolved by the transition registry
    Custom(String),
}

/// Which side of a clip a transition is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEdge {
    /// Window `[start, start + d)`, blending the previous clip into this one
    In,
    /// Window `[end - d, end)`, blending this clip into the next one
    Out,
}

/// A time-bounded blend attached to a clip boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Window length in seconds
    pub duration: f64,
    #[serde(default)]
    pub parameters: ParamMap,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration: f64) -> Self {
        Self {
            kind,
            duration,
            parameters: ParamMap::new(),
        }
    }

    pub fn dissolve(duration: f64) -> Self {
        Self::new(TransitionKind::Dissolve, duration)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}
