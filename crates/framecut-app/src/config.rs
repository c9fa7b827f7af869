//! Editor configuration, persisted as JSON.

use std::path::{Path, PathBuf};

use framecut_core::{Color, FrameCutError, FrameRate, Result};
use framecut_render::{CompositorConfig, ExportFormat};
use framecut_timeline::history::DEFAULT_HISTORY_DEPTH;
use framecut_ui::TimelineLayout;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Preview canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            background: Color::BLACK,
        }
    }
}

/// Output audio layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Clamp preview audio at the mixer threshold
    pub limiter: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            limiter: false,
        }
    }
}

/// Playback and redraw timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Scheduler rate in Hz
    pub tick_rate: f64,
    /// Frame grid for stepping and timecode
    pub frame_rate: FrameRate,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            frame_rate: FrameRate::FPS_30,
        }
    }
}

/// Bounds for keyboard zoom, in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Multiplier per zoom step
    pub step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 10_000.0,
            step: 1.25,
        }
    }
}

impl ZoomConfig {
    /// Zoom `steps` times from `zoom`, clamped to the configured bounds.
    pub fn stepped(&self, zoom: f64, steps: i32) -> f64 {
        let factor = self.step.max(1.0 + f64::EPSILON).powi(steps);
        (zoom * factor).clamp(self.min.max(f64::MIN_POSITIVE), self.max.max(self.min))
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: true,
            with_target: true,
        }
    }
}

/// Everything the editor reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub audio: AudioConfig,
    pub layout: TimelineLayout,
    pub playback: PlaybackConfig,
    pub history_depth: usize,
    /// Local author id stamped on published operations
    pub author: String,
    pub zoom: ZoomConfig,
    pub logging: LoggingConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            audio: AudioConfig::default(),
            layout: TimelineLayout::default(),
            playback: PlaybackConfig::default(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            author: "local".into(),
            zoom: ZoomConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load from `path`, falling back to defaults if the file is missing or
    /// malformed.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                debug!(path = %path.display(), "config loaded");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "using default config");
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting why it failed.
    pub fn try_load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| FrameCutError::Serialization(format!("invalid config: {e}")))
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FrameCutError::Serialization(format!("config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("framecut")
            .join("config.json")
    }

    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            frame_rate: self.playback.frame_rate,
            background: self.canvas.background,
            limiter: self.audio.limiter,
        }
    }

    /// Export format matching the preview canvas and audio layout.
    pub fn export_format(&self) -> ExportFormat {
        ExportFormat {
            width: self.canvas.width,
            height: self.canvas.height,
            frame_rate: self.playback.frame_rate,
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
        }
    }
}
