//! Pointer position to model entity.

use framecut_core::{ClipId, Rect, TrackId, Vec2};
use framecut_timeline::Timeline;

use crate::layout::{TimelineLayout, Viewport};
use crate::theme::Theme;

/// Which edge of a clip is being trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Left,
    Right,
}

/// What a pointer position resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// The ruler band; pressing here seeks.
    Ruler { time: f64 },
    Clip {
        track_id: TrackId,
        clip_id: ClipId,
        time: f64,
        /// Set when the pointer is over a trim handle
        edge: Option<TrimEdge>,
    },
    /// A track row with no clip under the pointer.
    Track { track_id: TrackId, time: f64 },
    Empty,
}

/// Resolve viewport pixel `(x, y)` against `timeline`.
pub fn hit_test(
    layout: &TimelineLayout,
    viewport: &Viewport,
    timeline: &Timeline,
    x: f32,
    y: f32,
) -> HitTarget {
    if x < 0.0 || y < 0.0 || x > viewport.width || y > viewport.height {
        return HitTarget::Empty;
    }
    let zoom = timeline.zoom;
    let time = viewport.time_at(x, zoom);
    if y < layout.ruler_height {
        return HitTarget::Ruler { time: time.max(0.0) };
    }

    let Some((row, track)) = layout
        .row_at(y, viewport)
        .and_then(|row| timeline.tracks.get(row).map(|track| (row, track)))
    else {
        return HitTarget::Empty;
    };

    let Some(index) = track.clip_index_at(time) else {
        return HitTarget::Track {
            track_id: track.id,
            time,
        };
    };
    let clip = &track.clips[index];

    let x0 = viewport.x_of(clip.start_time, zoom);
    let x1 = viewport.x_of(clip.end_time(), zoom);
    let top = layout.row_top(row, viewport) + Theme::CLIP_INSET;
    let rect = Rect::new(x0, top, x1 - x0, layout.row_height - 2.0 * Theme::CLIP_INSET);

    HitTarget::Clip {
        track_id: track.id,
        clip_id: clip.id,
        time,
        edge: trim_handle(rect, Vec2::new(x, y), layout.handle_width),
    }
}

/// Trim handle under `pos` for a clip drawn at `clip_rect`.
///
/// Handles are clamped to half the clip width so narrow clips keep both.
pub fn trim_handle(clip_rect: Rect, pos: Vec2, handle_width: f32) -> Option<TrimEdge> {
    let width = handle_width.min(clip_rect.width * 0.5);
    if pos.x < clip_rect.x || pos.x > clip_rect.right() {
        return None;
    }
    if pos.x <= clip_rect.x + width {
        Some(TrimEdge::Left)
    } else if pos.x >= clip_rect.right() - width {
        Some(TrimEdge::Right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::AssetId;
    use framecut_timeline::{Clip, Track};

    fn timeline() -> Timeline {
        let video = Track::new_video("V1");
        let clip = Clip::new("a", AssetId::new("a"), 2.0, video.id, 1.0);
        let mut video = video;
        video.clips.push(clip);
        Timeline::with_tracks(vec![video, Track::new_audio("A1")]).unwrap()
    }

    #[test]
    fn test_ruler_band_seeks() {
        let tl = timeline();
        let hit = hit_test(&TimelineLayout::default(), &Viewport::new(800.0, 300.0), &tl, 250.0, 10.0);
        assert_eq!(hit, HitTarget::Ruler { time: 2.5 });
    }

    #[test]
    fn test_clip_body_and_handles() {
        let tl = timeline();
        let layout = TimelineLayout::default();
        let vp = Viewport::new(800.0, 300.0);
        let clip_id = tl.tracks[0].clips[0].id;
        let y = layout.ruler_height + 20.0;

        match hit_test(&layout, &vp, &tl, 200.0, y) {
            HitTarget::Clip { clip_id: id, time, edge, .. } => {
                assert_eq!(id, clip_id);
                assert!((time - 2.0).abs() < 1e-9);
                assert_eq!(edge, None);
            }
            other => panic!("expected clip, got {other:?}"),
        }
        assert!(matches!(
            hit_test(&layout, &vp, &tl, 102.0, y),
            HitTarget::Clip { edge: Some(TrimEdge::Left), .. }
        ));
        assert!(matches!(
            hit_test(&layout, &vp, &tl, 298.0, y),
            HitTarget::Clip { edge: Some(TrimEdge::Right), .. }
        ));
    }

    #[test]
    fn test_empty_track_area() {
        let tl = timeline();
        let layout = TimelineLayout::default();
        let vp = Viewport::new(800.0, 300.0);
        let audio_id = tl.tracks[1].id;
        let y = layout.ruler_height + layout.row_height + 10.0;
        assert_eq!(
            hit_test(&layout, &vp, &tl, 150.0, y),
            HitTarget::Track { track_id: audio_id, time: 1.5 }
        );
        // Below the last row
        let y = layout.ruler_height + 3.0 * layout.row_height;
        assert_eq!(hit_test(&layout, &vp, &tl, 150.0, y), HitTarget::Empty);
    }

    #[test]
    fn test_hit_respects_scroll() {
        let tl = timeline();
        let layout = TimelineLayout::default();
        let vp = Viewport {
            scroll_x: 100.0,
            ..Viewport::new(800.0, 300.0)
        };
        let y = layout.ruler_height + 20.0;
        assert!(matches!(
            hit_test(&layout, &vp, &tl, 0.0, y),
            HitTarget::Clip { edge: Some(TrimEdge::Left), .. }
        ));
    }

    #[test]
    fn test_trim_handle_narrow_clip() {
        let rect = Rect::new(10.0, 0.0, 8.0, 20.0);
        assert_eq!(trim_handle(rect, Vec2::new(12.0, 5.0), 6.0), Some(TrimEdge::Left));
        assert_eq!(trim_handle(rect, Vec2::new(16.0, 5.0), 6.0), Some(TrimEdge::Right));
        assert_eq!(trim_handle(rect, Vec2::new(30.0, 5.0), 6.0), None);
    }
}
