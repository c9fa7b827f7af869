//! End-to-end editing, compositing and export scenarios.
//!
//! Exercises framecut-timeline, framecut-media and framecut-render
//! together through the edit log.

use std::sync::Arc;

use framecut_core::{AssetId, AuthorId, CancelToken, Color, FrameRate, InvariantError, TimeRange, TrackId};
use framecut_media::{PatternAsset, PatternSource};
use framecut_render::{
    Compositor, CompositorConfig, ExportFormat, ExportJob, ExportState, MemorySink,
};
use framecut_timeline::{
    Clip, EditLog, Operation, Timeline, Track, Transition, TransitionEdge,
};

// ── Helpers ────────────────────────────────────────────────────

const RED: Color = Color::rgb(200, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 200);

fn two_track_log() -> (EditLog, TrackId, TrackId) {
    let v1 = Track::new_video("V1");
    let v2 = Track::new_video("V2");
    let (a, b) = (v1.id, v2.id);
    let timeline = Timeline::with_tracks(vec![v1, v2]).unwrap();
    (EditLog::new(timeline, AuthorId::new("tester")), a, b)
}

fn clip(asset: &str, track: TrackId, start: f64, duration: f64) -> Clip {
    Clip::new(asset, AssetId::new(asset), duration, track, start)
}

fn media() -> Arc<PatternSource> {
    Arc::new(
        PatternSource::new()
            .with_asset("red", PatternAsset::solid(10.0, 4, 4, RED).with_tone(100.0, 0.5))
            .with_asset("blue", PatternAsset::solid(10.0, 4, 4, BLUE)),
    )
}

fn small_format() -> ExportFormat {
    ExportFormat {
        width: 4,
        height: 4,
        frame_rate: FrameRate::FPS_30,
        sample_rate: 3_000,
        channels: 1,
    }
}

// ── Model edits ────────────────────────────────────────────────

#[test]
fn overlapping_add_is_rejected() {
    let (mut log, track, _) = two_track_log();
    log.perform(Operation::AddClip {
        clip: clip("red", track, 0.0, 5.0),
    })
    .unwrap();
    let before = log.timeline().clone();

    let err = log
        .perform(Operation::AddClip {
            clip: clip("blue", track, 2.0, 3.0),
        })
        .unwrap_err();
    assert!(matches!(err, InvariantError::Overlap { .. }));
    assert_eq!(*log.timeline(), before);
}

#[test]
fn trim_out_point_sets_duration() {
    let (mut log, track, _) = two_track_log();
    let c = clip("red", track, 0.0, 5.0);
    let id = c.id;
    log.perform(Operation::AddClip { clip: c }).unwrap();

    log.perform(Operation::TrimClip {
        clip_id: id,
        in_point: None,
        out_point: Some(3.0),
    })
    .unwrap();
    let (_, trimmed) = log.timeline().find_clip(id).unwrap();
    assert_eq!(trimmed.duration, 3.0);
    assert_eq!(log.timeline().duration, 3.0);

    let err = log
        .perform(Operation::TrimClip {
            clip_id: id,
            in_point: None,
            out_point: Some(0.0),
        })
        .unwrap_err();
    assert!(matches!(err, InvariantError::NonPositiveDuration { .. }));
}

#[test]
fn active_clips_follow_track_order() {
    let (mut log, v1, v2) = two_track_log();
    let a = clip("red", v1, 0.0, 5.0);
    let b = clip("blue", v2, 0.0, 5.0);
    let (a_id, b_id) = (a.id, b.id);
    log.perform(Operation::AddClip { clip: b }).unwrap();
    log.perform(Operation::AddClip { clip: a }).unwrap();

    let ids: Vec<_> = log.timeline().active_clips_at(2.0).iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![a_id, b_id]);
    assert!(log.timeline().active_clips_at(5.0).is_empty());
}

#[test]
fn undo_restores_every_step() {
    let (mut log, track, _) = two_track_log();
    let c = clip("red", track, 1.0, 4.0);
    let id = c.id;
    let mut states = vec![log.timeline().clone()];
    for op in [
        Operation::AddClip { clip: c },
        Operation::MoveClip {
            clip_id: id,
            track_id: track,
            start_time: 2.0,
        },
        Operation::SplitClip {
            clip_id: id,
            at: 4.0,
            new_clip_id: framecut_core::ClipId::new(),
        },
    ] {
        log.perform(op).unwrap();
        states.push(log.timeline().clone());
    }

    while let Some(expected) = states.pop() {
        assert_eq!(*log.timeline(), expected);
        if states.is_empty() {
            break;
        }
        log.undo().unwrap();
    }
    assert!(!log.can_undo());
}

// ── Compositing ────────────────────────────────────────────────

#[test]
fn dissolve_midpoint_is_even_blend() {
    let (mut log, track, _) = two_track_log();
    let a = clip("red", track, 0.0, 5.0);
    let c = clip("blue", track, 5.0, 3.0);
    let c_id = c.id;
    log.perform(Operation::AddClip { clip: a }).unwrap();
    log.perform(Operation::AddClip { clip: c }).unwrap();
    log.perform(Operation::AddTransition {
        clip_id: c_id,
        edge: TransitionEdge::In,
        transition: Transition::dissolve(1.0),
    })
    .unwrap();

    let config = CompositorConfig {
        width: 4,
        height: 4,
        ..CompositorConfig::default()
    };
    let compositor = Compositor::new(config, media());
    let frame = compositor
        .render(log.timeline(), 5.5, &CancelToken::new())
        .unwrap();
    assert_eq!(frame.image.pixel(1, 1), Some([100, 0, 100, 255]));
    assert_eq!(frame.time, 5.5);
}

// ── Export ─────────────────────────────────────────────────────

fn ten_second_timeline() -> Arc<Timeline> {
    let (mut log, track, _) = two_track_log();
    log.perform(Operation::AddClip {
        clip: clip("red", track, 0.0, 10.0),
    })
    .unwrap();
    Arc::new(log.timeline().clone())
}

#[test]
fn export_renders_every_frame() {
    let mut job = ExportJob::new(ten_second_timeline(), media(), small_format());
    assert_eq!(job.total_frames(), 300);
    let mut sink = MemorySink::new();
    let state = job.run(&mut sink, |_| {}).unwrap().clone();
    assert_eq!(
        state,
        ExportState::Completed {
            artifact: "memory://300-frames".into(),
            frames_rendered: 300,
        }
    );
    assert_eq!(sink.frames.len(), 300);
}

#[test]
fn export_decode_failure_at_frame_150() {
    let media = media();
    // Frame 150 shows source time 5.0
    media.fail_decode(&AssetId::new("red"), TimeRange::new(5.0, 0.01));
    let mut job = ExportJob::new(ten_second_timeline(), media, small_format());
    let mut sink = MemorySink::new();
    let state = job.run(&mut sink, |_| {}).unwrap().clone();

    match state {
        ExportState::Failed {
            at_time,
            frames_rendered,
            ..
        } => {
            assert_eq!(frames_rendered, 150);
            assert!((at_time - 5.0).abs() < 1e-9);
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(sink.aborted);
    // Terminal: a second run is refused
    assert!(job.run(&mut sink, |_| {}).is_err());
}

#[test]
fn export_ignores_edits_after_snapshot() {
    let (mut log, track, _) = two_track_log();
    let c = clip("red", track, 0.0, 1.0);
    let id = c.id;
    log.perform(Operation::AddClip { clip: c }).unwrap();
    let snapshot = Arc::new(log.timeline().clone());
    log.perform(Operation::RemoveClip { clip_id: id }).unwrap();

    let mut job = ExportJob::new(snapshot, media(), small_format());
    let mut sink = MemorySink::new();
    job.run(&mut sink, |_| {}).unwrap();
    assert_eq!(job.state().frames_rendered(), 30);
    assert_eq!(sink.frames[0].image.pixel(0, 0), Some(RED.to_array()));
    assert_eq!(log.timeline().clip_count(), 0);
}
