//! Property tests over random edit sequences.

use framecut_core::{AssetId, AuthorId, ClipId, TIME_EPSILON};
use framecut_timeline::serialization::{from_json, to_json};
use framecut_timeline::{Clip, EditLog, Operation, Timeline, Track};
use framecut_ui::{pixel_to_time, time_to_pixel};
use proptest::prelude::*;

/// An edit described without ids; resolved against the current timeline.
#[derive(Debug, Clone)]
enum Edit {
    Add { track: usize, start: u32, len: u32 },
    Remove { pick: usize },
    Move { pick: usize, track: usize, start: u32 },
    TrimOut { pick: usize, len: u32 },
    Split { pick: usize, at: u32 },
}

/// Grid times keep the split and trim arithmetic exact between steps.
fn quarters(n: u32) -> f64 {
    n as f64 * 0.25
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..3usize, 0..80u32, 1..20u32).prop_map(|(track, start, len)| Edit::Add { track, start, len }),
        any::<usize>().prop_map(|pick| Edit::Remove { pick }),
        (any::<usize>(), 0..3usize, 0..80u32)
            .prop_map(|(pick, track, start)| Edit::Move { pick, track, start }),
        (any::<usize>(), 0..20u32).prop_map(|(pick, len)| Edit::TrimOut { pick, len }),
        (any::<usize>(), 1..20u32).prop_map(|(pick, at)| Edit::Split { pick, at }),
    ]
}

/// Back-to-back clips with arbitrary finite starts and lengths.
fn free_clips() -> impl Strategy<Value = Vec<(usize, f64, f64)>> {
    prop::collection::vec((0..3usize, 0.0f64..7.5, 1e-3f64..12.0), 0..40)
}

fn base() -> Timeline {
    Timeline::with_tracks(vec![
        Track::new_video("V1"),
        Track::new_video("V2"),
        Track::new_audio("A1"),
    ])
    .unwrap()
}

fn nth_clip(timeline: &Timeline, pick: usize) -> Option<&Clip> {
    let count = timeline.clip_count();
    if count == 0 {
        return None;
    }
    timeline.tracks.iter().flat_map(|t| &t.clips).nth(pick % count)
}

fn resolve(timeline: &Timeline, edit: &Edit) -> Option<Operation> {
    Some(match *edit {
        Edit::Add { track, start, len } => {
            let track_id = timeline.tracks[track].id;
            Operation::AddClip {
                clip: Clip::new("c", AssetId::new("asset"), quarters(len), track_id, quarters(start)),
            }
        }
        Edit::Remove { pick } => Operation::RemoveClip {
            clip_id: nth_clip(timeline, pick)?.id,
        },
        Edit::Move { pick, track, start } => Operation::MoveClip {
            clip_id: nth_clip(timeline, pick)?.id,
            track_id: timeline.tracks[track].id,
            start_time: quarters(start),
        },
        Edit::TrimOut { pick, len } => {
            let clip = nth_clip(timeline, pick)?;
            Operation::TrimClip {
                clip_id: clip.id,
                in_point: None,
                out_point: Some(clip.in_point + quarters(len)),
            }
        }
        Edit::Split { pick, at } => {
            let clip = nth_clip(timeline, pick)?;
            Operation::SplitClip {
                clip_id: clip.id,
                at: clip.start_time + quarters(at),
                new_clip_id: ClipId::new(),
            }
        }
    })
}

fn assert_no_overlap(timeline: &Timeline) -> Result<(), TestCaseError> {
    for track in &timeline.tracks {
        for pair in track.clips.windows(2) {
            prop_assert!(
                pair[0].end_time() <= pair[1].start_time + TIME_EPSILON,
                "clips overlap on {}: {:?} / {:?}",
                track.name,
                pair[0].range(),
                pair[1].range()
            );
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_and_redo_restore_exact_states(edits in prop::collection::vec(edit(), 1..30)) {
        let mut log = EditLog::new(base(), AuthorId::new("prop"));
        for edit in &edits {
            let Some(op) = resolve(log.timeline(), edit) else { continue };
            let before = log.timeline().clone();
            if log.perform(op).is_err() {
                prop_assert_eq!(log.timeline(), &before);
                continue;
            }
            let after = log.timeline().clone();

            prop_assert!(log.undo().unwrap().is_some());
            prop_assert_eq!(log.timeline(), &before);
            prop_assert!(log.redo().unwrap().is_some());
            prop_assert_eq!(log.timeline(), &after);
        }
    }

    #[test]
    fn clips_never_overlap(edits in prop::collection::vec(edit(), 1..40)) {
        let mut log = EditLog::new(base(), AuthorId::new("prop"));
        for edit in &edits {
            if let Some(op) = resolve(log.timeline(), edit) {
                let _ = log.perform(op);
            }
            assert_no_overlap(log.timeline())?;
        }
    }

    #[test]
    fn save_load_round_trip(
        clips in free_clips(),
        edits in prop::collection::vec(edit(), 0..15),
    ) {
        let mut log = EditLog::new(base(), AuthorId::new("prop"));
        let mut track_end = [0.0f64; 3];
        for (track, gap, len) in clips {
            let start = track_end[track] + gap;
            let track_id = log.timeline().tracks[track].id;
            let clip = Clip::new("c", AssetId::new("asset"), len, track_id, start);
            if log.perform(Operation::AddClip { clip }).is_ok() {
                track_end[track] = start + len;
            }
        }
        for edit in &edits {
            if let Some(op) = resolve(log.timeline(), edit) {
                let _ = log.perform(op);
            }
        }
        let json = to_json(log.timeline()).unwrap();
        let loaded = from_json(&json).unwrap();
        prop_assert_eq!(&loaded, log.timeline());
    }

    #[test]
    fn pixel_time_mapping_is_inverse(t in 0.0f64..36_000.0, zoom in 0.01f64..10_000.0) {
        let back = pixel_to_time(time_to_pixel(t, zoom), zoom);
        prop_assert!((back - t).abs() <= 1e-12 * t.max(1.0));
    }
}
