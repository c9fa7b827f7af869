//! Timeline track view renderer.
//!
//! Produces a draw list from a read-only timeline snapshot. Work per call is
//! proportional to what is on screen: clips outside the viewport are culled
//! through each track's sorted clip list, and waveform bars are emitted per
//! visible pixel column.

use framecut_core::{format_timecode, AssetId, FrameRate, Rect, Vec2};
use framecut_timeline::{Clip, Timeline, Track, TrackKind};
use smallvec::SmallVec;
use tracing::trace;

use crate::draw::DrawCommand;
use crate::layout::{TimelineLayout, Viewport};
use crate::peaks::PeakStore;
use crate::ruler;
use crate::theme::Theme;

/// Result of one render tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub draw_list: Vec<DrawCommand>,
    /// Assets whose peaks were not available this tick
    pub missing_peaks: Vec<AssetId>,
}

impl RenderOutput {
    /// Whether another tick should redraw once missing data arrives.
    pub fn needs_redraw(&self) -> bool {
        !self.missing_peaks.is_empty()
    }
}

/// Draws the ruler, track rows, clips, markers, selection and playhead.
#[derive(Debug, Clone)]
pub struct TimelineRenderer {
    layout: TimelineLayout,
    frame_rate: FrameRate,
}

impl TimelineRenderer {
    pub fn new(layout: TimelineLayout, frame_rate: FrameRate) -> Self {
        Self { layout, frame_rate }
    }

    pub fn layout(&self) -> &TimelineLayout {
        &self.layout
    }

    pub fn render(&self, timeline: &Timeline, viewport: &Viewport, peaks: &PeakStore) -> RenderOutput {
        let mut out = RenderOutput::default();
        let zoom = timeline.zoom;
        out.draw_list.push(DrawCommand::Rect {
            rect: viewport.bounds(),
            color: Theme::BG,
        });

        for (index, track) in timeline.tracks.iter().enumerate() {
            let top = self.layout.row_top(index, viewport);
            if top + self.layout.row_height < self.layout.ruler_height || top > viewport.height {
                continue;
            }
            self.draw_track(&mut out, track, index, top, zoom, viewport, peaks);
        }

        if let Some(selection) = timeline.selection {
            let x0 = viewport.x_of(selection.start, zoom).max(0.0);
            let x1 = viewport.x_of(selection.end(), zoom).min(viewport.width);
            if x1 > x0 {
                out.draw_list.push(DrawCommand::Rect {
                    rect: Rect::new(
                        x0,
                        self.layout.ruler_height,
                        x1 - x0,
                        viewport.height - self.layout.ruler_height,
                    ),
                    color: Theme::SELECTION,
                });
            }
        }

        self.draw_ruler(&mut out, zoom, viewport);
        self.draw_markers(&mut out, timeline, zoom, viewport);

        let x = viewport.x_of(timeline.playhead, zoom);
        if (0.0..=viewport.width).contains(&x) {
            out.draw_list.push(DrawCommand::Line {
                from: Vec2::new(x, 0.0),
                to: Vec2::new(x, viewport.height),
                width: Theme::STROKE_PLAYHEAD,
                color: Theme::PLAYHEAD,
            });
        }

        trace!(
            commands = out.draw_list.len(),
            missing = out.missing_peaks.len(),
            "timeline rendered"
        );
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_track(
        &self,
        out: &mut RenderOutput,
        track: &Track,
        index: usize,
        top: f32,
        zoom: f64,
        viewport: &Viewport,
        peaks: &PeakStore,
    ) {
        out.draw_list.push(DrawCommand::Rect {
            rect: Rect::new(0.0, top, viewport.width, self.layout.row_height),
            color: if index % 2 == 0 { Theme::ROW_EVEN } else { Theme::ROW_ODD },
        });

        let clip_color = match track.kind {
            TrackKind::Video => Theme::VIDEO_CLIP,
            TrackKind::Audio => Theme::AUDIO_CLIP,
            TrackKind::Text => Theme::TEXT_CLIP,
            TrackKind::Effect => Theme::EFFECT_CLIP,
        };
        let y = top + Theme::CLIP_INSET;
        let h = (self.layout.row_height - 2.0 * Theme::CLIP_INSET).max(1.0);

        for clip in track.clips_in_range(viewport.visible_range(zoom)) {
            let x0 = viewport.x_of(clip.start_time, zoom);
            let x1 = viewport.x_of(clip.end_time(), zoom);
            let width = (x1 - x0).max(1.0);
            out.draw_list.push(DrawCommand::Rect {
                rect: Rect::new(x0, y, width, h),
                color: clip_color,
            });

            let transitions: SmallVec<[(f64, f64); 2]> = [
                clip.transition_in
                    .as_ref()
                    .map(|t| (clip.start_time, clip.start_time + t.duration)),
                clip.transition_out
                    .as_ref()
                    .map(|t| (clip.end_time() - t.duration, clip.end_time())),
            ]
            .into_iter()
            .flatten()
            .collect();
            for (start, end) in transitions {
                let tx0 = viewport.x_of(start, zoom);
                let tx1 = viewport.x_of(end, zoom);
                out.draw_list.push(DrawCommand::Rect {
                    rect: Rect::new(tx0, y, (tx1 - tx0).max(1.0), h),
                    color: Theme::TRANSITION,
                });
            }

            if track.kind.has_audio() {
                self.draw_waveform(out, clip, x0, x1, y, h, zoom, viewport, peaks);
            }

            if width >= Theme::LABEL_MIN_WIDTH {
                out.draw_list.push(DrawCommand::Text {
                    pos: Vec2::new(x0.max(0.0) + 4.0, y + 2.0),
                    text: clip.name.clone(),
                    size: Theme::FONT_SM,
                    color: Theme::LABEL,
                });
            }
        }
    }

    /// One bar per visible pixel column of the clip.
    #[allow(clippy::too_many_arguments)]
    fn draw_waveform(
        &self,
        out: &mut RenderOutput,
        clip: &Clip,
        x0: f32,
        x1: f32,
        y: f32,
        h: f32,
        zoom: f64,
        viewport: &Viewport,
        peaks: &PeakStore,
    ) {
        let Some(waveform) = peaks.try_get(&clip.asset_id) else {
            if !out.missing_peaks.contains(&clip.asset_id) {
                out.missing_peaks.push(clip.asset_id.clone());
            }
            return;
        };

        let mid = y + h * 0.5;
        let first = x0.max(0.0).floor() as i64;
        let last = x1.min(viewport.width).ceil() as i64;
        for col in first..last {
            let t0 = viewport.time_at(col as f32, zoom).max(clip.start_time);
            let t1 = viewport.time_at((col + 1) as f32, zoom).min(clip.end_time());
            if t1 <= t0 {
                continue;
            }
            let peak = waveform
                .peak_between(clip.source_time_at(t0), clip.source_time_at(t1))
                .min(1.0);
            let half = peak * h * 0.5;
            let x = col as f32 + 0.5;
            out.draw_list.push(DrawCommand::Line {
                from: Vec2::new(x, mid - half),
                to: Vec2::new(x, mid + half),
                width: 1.0,
                color: Theme::WAVEFORM,
            });
        }
    }

    fn draw_ruler(&self, out: &mut RenderOutput, zoom: f64, viewport: &Viewport) {
        let bottom = self.layout.ruler_height;
        out.draw_list.push(DrawCommand::Rect {
            rect: Rect::new(0.0, 0.0, viewport.width, bottom),
            color: Theme::RULER_BG,
        });

        let ticks = ruler::ticks(
            viewport.visible_range(zoom),
            zoom,
            self.layout.min_tick_spacing as f64,
        );
        for tick in ticks {
            let x = viewport.x_of(tick.time, zoom);
            let (len, color) = if tick.major {
                (Theme::MAJOR_TICK, Theme::TICK)
            } else {
                (Theme::MINOR_TICK, Theme::TICK_MINOR)
            };
            out.draw_list.push(DrawCommand::Line {
                from: Vec2::new(x, bottom - len),
                to: Vec2::new(x, bottom),
                width: Theme::STROKE_SUBTLE,
                color,
            });
            if tick.major {
                out.draw_list.push(DrawCommand::Text {
                    pos: Vec2::new(x + 2.0, 3.0),
                    text: format_timecode(tick.time, self.frame_rate),
                    size: Theme::FONT_XS,
                    color: Theme::LABEL,
                });
            }
        }
    }

    fn draw_markers(&self, out: &mut RenderOutput, timeline: &Timeline, zoom: f64, viewport: &Viewport) {
        let visible = viewport.visible_range(zoom);
        // Markers are sorted by time
        let first = timeline.markers.partition_point(|m| m.time < visible.start);
        for marker in timeline.markers[first..]
            .iter()
            .take_while(|m| m.time <= visible.end())
        {
            let x = viewport.x_of(marker.time, zoom);
            out.draw_list.push(DrawCommand::Line {
                from: Vec2::new(x, 0.0),
                to: Vec2::new(x, viewport.height),
                width: Theme::STROKE_SUBTLE,
                color: marker.color,
            });
            if let Some(label) = &marker.label {
                out.draw_list.push(DrawCommand::Text {
                    pos: Vec2::new(x + 3.0, self.layout.ruler_height + 2.0),
                    text: label.clone(),
                    size: Theme::FONT_XS,
                    color: marker.color,
                });
            }
        }
    }
}
