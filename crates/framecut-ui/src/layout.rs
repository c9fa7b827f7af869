//! Time/pixel mapping and track-view geometry.

use framecut_core::{Rect, TimeRange};
use serde::{Deserialize, Serialize};

/// Timeline time to content pixels at `zoom` pixels per second.
#[inline]
pub fn time_to_pixel(t: f64, zoom: f64) -> f64 {
    t * zoom
}

/// Content pixels back to timeline time; the inverse of [`time_to_pixel`].
#[inline]
pub fn pixel_to_time(x: f64, zoom: f64) -> f64 {
    x / zoom
}

/// Fixed track-view metrics, loaded from the editor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineLayout {
    pub ruler_height: f32,
    pub row_height: f32,
    /// Major ruler ticks are never closer than this
    pub min_tick_spacing: f32,
    /// Width of the trim handle at each clip edge
    pub handle_width: f32,
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self {
            ruler_height: 24.0,
            row_height: 48.0,
            min_tick_spacing: 40.0,
            handle_width: 6.0,
        }
    }
}

impl TimelineLayout {
    /// Top of track row `index` in viewport pixels.
    pub fn row_top(&self, index: usize, viewport: &Viewport) -> f32 {
        self.ruler_height + index as f32 * self.row_height - viewport.scroll_y
    }

    /// Track row under viewport `y`, if below the ruler.
    pub fn row_at(&self, y: f32, viewport: &Viewport) -> Option<usize> {
        if y < self.ruler_height || self.row_height <= 0.0 {
            return None;
        }
        let row = ((y - self.ruler_height + viewport.scroll_y) / self.row_height).floor();
        (row >= 0.0).then_some(row as usize)
    }
}

/// The visible window onto the track view.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Content pixels scrolled off the left edge
    pub scroll_x: f64,
    pub scroll_y: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Viewport x of timeline time `t`.
    #[inline]
    pub fn x_of(&self, t: f64, zoom: f64) -> f32 {
        (time_to_pixel(t, zoom) - self.scroll_x) as f32
    }

    /// Timeline time under viewport x.
    #[inline]
    pub fn time_at(&self, x: f32, zoom: f64) -> f64 {
        pixel_to_time(x as f64 + self.scroll_x, zoom)
    }

    /// Timeline range visible at `zoom`.
    pub fn visible_range(&self, zoom: f64) -> TimeRange {
        TimeRange::from_start_end(self.time_at(0.0, zoom), self.time_at(self.width, zoom))
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_linear() {
        assert_eq!(time_to_pixel(2.5, 100.0), 250.0);
        assert_eq!(pixel_to_time(250.0, 100.0), 2.5);
    }

    #[test]
    fn test_viewport_scroll() {
        let vp = Viewport {
            scroll_x: 100.0,
            ..Viewport::new(400.0, 200.0)
        };
        assert_eq!(vp.x_of(2.0, 100.0), 100.0);
        assert_eq!(vp.time_at(0.0, 100.0), 1.0);
        let range = vp.visible_range(100.0);
        assert_eq!((range.start, range.end()), (1.0, 5.0));
    }

    #[test]
    fn test_rows() {
        let layout = TimelineLayout::default();
        let vp = Viewport::new(100.0, 300.0);
        assert_eq!(layout.row_at(10.0, &vp), None);
        assert_eq!(layout.row_at(24.0, &vp), Some(0));
        assert_eq!(layout.row_at(24.0 + 48.0 * 2.5, &vp), Some(2));
        assert_eq!(layout.row_top(1, &vp), 72.0);
    }
}
