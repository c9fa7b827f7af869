//! Track view palette.

use framecut_core::Color;

pub struct Theme;

impl Theme {
    // ── Sizes ───────────────────────────────────────────────────
    pub const FONT_XS: f32 = 11.0;
    pub const FONT_SM: f32 = 13.0;
    pub const STROKE_SUBTLE: f32 = 1.0;
    pub const STROKE_PLAYHEAD: f32 = 2.0;
    pub const MAJOR_TICK: f32 = 12.0;
    pub const MINOR_TICK: f32 = 5.0;
    /// Vertical inset of a clip inside its row.
    pub const CLIP_INSET: f32 = 3.0;
    /// Narrowest clip that still gets a name label.
    pub const LABEL_MIN_WIDTH: f32 = 40.0;

    // ── Backgrounds ─────────────────────────────────────────────
    pub const BG: Color = Color::rgb(18, 18, 22);
    pub const RULER_BG: Color = Color::rgb(28, 28, 34);
    pub const ROW_EVEN: Color = Color::rgb(35, 35, 42);
    pub const ROW_ODD: Color = Color::rgb(45, 45, 55);

    // ── Clips ───────────────────────────────────────────────────
    pub const VIDEO_CLIP: Color = Color::rgb(86, 130, 255);
    pub const AUDIO_CLIP: Color = Color::rgb(67, 160, 71);
    pub const TEXT_CLIP: Color = Color::rgb(171, 71, 188);
    pub const EFFECT_CLIP: Color = Color::rgb(255, 167, 38);
    pub const WAVEFORM: Color = Color::rgba(255, 255, 255, 160);
    pub const TRANSITION: Color = Color::rgba(255, 255, 255, 64);

    // ── Overlays ────────────────────────────────────────────────
    pub const TICK: Color = Color::rgba(255, 255, 255, 26);
    pub const TICK_MINOR: Color = Color::rgba(255, 255, 255, 10);
    pub const LABEL: Color = Color::rgba(235, 235, 235, 235);
    pub const SELECTION: Color = Color::rgba(86, 130, 255, 40);
    pub const PLAYHEAD: Color = Color::rgb(255, 69, 58);
}
