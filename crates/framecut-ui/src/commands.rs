//! Keyboard surface: shortcuts resolved to editor actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Shortcut representation ─────────────────────────────────────

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub command: bool, // ⌘ on macOS
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        command: false,
    };
    pub const CMD: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        command: true,
    };
    pub const CMD_SHIFT: Self = Self {
        ctrl: false,
        shift: true,
        alt: false,
        command: true,
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
        alt: false,
        command: false,
    };
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        alt: false,
        command: false,
    };
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
        alt: false,
        command: false,
    };
}

/// A keyboard shortcut (modifier + key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Shortcut {
    /// Keys are case-insensitive; `"Z"` and `"z"` are the same shortcut.
    pub fn new(modifiers: Modifiers, key: impl Into<String>) -> Self {
        Self {
            modifiers,
            key: key.into().to_lowercase(),
        }
    }

    /// Format for display: "⌘S", "⇧⌘Z", etc.
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.modifiers.ctrl {
            s.push('⌃');
        }
        if self.modifiers.alt {
            s.push('⌥');
        }
        if self.modifiers.shift {
            s.push('⇧');
        }
        if self.modifiers.command {
            s.push('⌘');
        }
        s.push_str(&self.key.to_uppercase());
        s
    }
}

// ── Actions ─────────────────────────────────────────────────────

/// Something the editor session knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    TogglePlayback,
    /// Start of the selection at the playhead
    MarkIn,
    /// End of the selection at the playhead
    MarkOut,
    /// Split every clip under the playhead on unlocked tracks
    CutAtPlayhead,
    /// Move the playhead by whole frames
    StepFrames(i32),
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
}

impl EditorAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TogglePlayback => "Play/Pause",
            Self::MarkIn => "Set In Point",
            Self::MarkOut => "Set Out Point",
            Self::CutAtPlayhead => "Cut at Playhead",
            Self::StepFrames(n) if *n < 0 => "Step Back",
            Self::StepFrames(_) => "Step Forward",
            Self::Undo => "Undo",
            Self::Redo => "Redo",
            Self::ZoomIn => "Zoom In",
            Self::ZoomOut => "Zoom Out",
        }
    }
}

// ── Keymap ──────────────────────────────────────────────────────

/// Shortcut lookup table.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<Shortcut, EditorAction>,
}

impl Keymap {
    /// A keymap with the built-in bindings.
    pub fn new() -> Self {
        let mut map = Self::empty();
        map.register_builtins();
        map
    }

    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind a shortcut, replacing any previous binding for it.
    pub fn bind(&mut self, shortcut: Shortcut, action: EditorAction) {
        self.bindings.insert(shortcut, action);
    }

    pub fn unbind(&mut self, shortcut: &Shortcut) -> Option<EditorAction> {
        self.bindings.remove(shortcut)
    }

    pub fn resolve(&self, shortcut: &Shortcut) -> Option<EditorAction> {
        self.bindings.get(shortcut).copied()
    }

    /// Resolve a raw key event.
    pub fn resolve_key(&self, key: &str, modifiers: Modifiers) -> Option<EditorAction> {
        self.resolve(&Shortcut::new(modifiers, key))
    }

    /// Every shortcut bound to `action`, in display order.
    pub fn shortcuts_for(&self, action: EditorAction) -> Vec<&Shortcut> {
        let mut shortcuts: Vec<&Shortcut> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(s, _)| s)
            .collect();
        shortcuts.sort_by_key(|s| s.display());
        shortcuts
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn register_builtins(&mut self) {
        use EditorAction::*;

        self.bind(Shortcut::new(Modifiers::NONE, "Space"), TogglePlayback);
        self.bind(Shortcut::new(Modifiers::NONE, "I"), MarkIn);
        self.bind(Shortcut::new(Modifiers::NONE, "O"), MarkOut);
        self.bind(Shortcut::new(Modifiers::NONE, "X"), CutAtPlayhead);

        self.bind(Shortcut::new(Modifiers::NONE, "Left"), StepFrames(-1));
        self.bind(Shortcut::new(Modifiers::NONE, "Right"), StepFrames(1));
        self.bind(Shortcut::new(Modifiers::SHIFT, "Left"), StepFrames(-10));
        self.bind(Shortcut::new(Modifiers::SHIFT, "Right"), StepFrames(10));

        // ⌘ on macOS, Ctrl elsewhere
        for (plain, shifted) in [
            (Modifiers::CMD, Modifiers::CMD_SHIFT),
            (Modifiers::CTRL, Modifiers::CTRL_SHIFT),
        ] {
            self.bind(Shortcut::new(plain, "Z"), Undo);
            self.bind(Shortcut::new(shifted, "Z"), Redo);
        }

        self.bind(Shortcut::new(Modifiers::NONE, "+"), ZoomIn);
        self.bind(Shortcut::new(Modifiers::NONE, "="), ZoomIn);
        // "+" is usually typed as shift+"="
        self.bind(Shortcut::new(Modifiers::SHIFT, "+"), ZoomIn);
        self.bind(Shortcut::new(Modifiers::NONE, "-"), ZoomOut);
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
