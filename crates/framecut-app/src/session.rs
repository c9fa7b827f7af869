//! The live editing session.
//!
//! One [`EditorSession`] owns the edit log. Every mutation, whether from the
//! keyboard, pointer or remote feed, goes through the log's mutex, and each
//! successful change publishes a fresh immutable snapshot. Readers (the
//! renderer, preview, export) only ever see snapshots.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use framecut_core::{
    AssetId, AuthorId, CancelToken, ClipId, FrameCutError, Result, TimeRange, TIME_EPSILON,
};
use framecut_media::MediaSource;
use framecut_render::{
    spawn_export, CompositeFrame, Compositor, ExportFormat, ExportHandle, ExportJob, ExportSink,
};
use framecut_timeline::serialization::{load_from_file, save_to_file};
use framecut_timeline::{EditLog, Operation, OperationStamp, StampedOperation, Timeline};
use framecut_ui::{EditorAction, PeakStore, RenderOutput, TickHandle, TickScheduler, TimelineRenderer, Viewport};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;

/// Notice sent back to a remote author whose operation was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRejection {
    pub stamp: OperationStamp,
    pub reason: String,
}

pub struct EditorSession {
    config: EditorConfig,
    log: Mutex<EditLog>,
    snapshots: watch::Sender<Arc<Timeline>>,
    outbound: (Sender<StampedOperation>, Receiver<StampedOperation>),
    rejections: (Sender<RemoteRejection>, Receiver<RemoteRejection>),
    media: Arc<dyn MediaSource>,
    compositor: Compositor,
    peaks: PeakStore,
    playing: AtomicBool,
    preview_cancel: Mutex<Option<CancelToken>>,
}

impl EditorSession {
    pub fn new(config: EditorConfig, media: Arc<dyn MediaSource>) -> Self {
        Self::with_timeline(config, media, Timeline::new())
    }

    pub fn with_timeline(config: EditorConfig, media: Arc<dyn MediaSource>, timeline: Timeline) -> Self {
        let log = EditLog::with_max_depth(
            timeline.clone(),
            AuthorId::new(config.author.clone()),
            config.history_depth,
        );
        let (snapshots, _) = watch::channel(Arc::new(timeline));
        let compositor = Compositor::new(config.compositor_config(), Arc::clone(&media));
        Self {
            config,
            log: Mutex::new(log),
            snapshots,
            outbound: crossbeam_channel::unbounded(),
            rejections: crossbeam_channel::unbounded(),
            media,
            compositor,
            peaks: PeakStore::new(),
            playing: AtomicBool::new(false),
            preview_cancel: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The latest published timeline.
    pub fn snapshot(&self) -> Arc<Timeline> {
        self.snapshots.borrow().clone()
    }

    /// Watch for new snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Timeline>> {
        self.snapshots.subscribe()
    }

    /// Stamped local operations for the collaboration feed.
    pub fn outbound(&self) -> Receiver<StampedOperation> {
        self.outbound.1.clone()
    }

    /// Notices for remote authors whose operations were dropped.
    pub fn rejections(&self) -> Receiver<RemoteRejection> {
        self.rejections.1.clone()
    }

    pub fn peaks(&self) -> &PeakStore {
        &self.peaks
    }

    pub fn can_undo(&self) -> bool {
        self.log.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.lock().can_redo()
    }

    // ── Edits ───────────────────────────────────────────────────

    /// Apply a local edit.
    pub fn perform(&self, op: Operation) -> Result<()> {
        self.perform_locked(&mut self.log.lock(), op)
    }

    /// Undo the last local edit; `false` if there was nothing to undo.
    pub fn undo(&self) -> Result<bool> {
        let mut log = self.log.lock();
        let Some(stamped) = log.undo()? else {
            return Ok(false);
        };
        self.publish(&log, Some(stamped));
        Ok(true)
    }

    /// Redo the last undone edit; `false` if there was nothing to redo.
    pub fn redo(&self) -> Result<bool> {
        let mut log = self.log.lock();
        let Some(stamped) = log.redo()? else {
            return Ok(false);
        };
        self.publish(&log, Some(stamped));
        Ok(true)
    }

    fn perform_locked(&self, log: &mut EditLog, op: Operation) -> Result<()> {
        let stamped = log.perform(op)?;
        self.publish(log, Some(stamped));
        Ok(())
    }

    /// Replay an operation from another editor.
    ///
    /// Rejections are also queued on [`rejections`](Self::rejections) so the
    /// feed can ask the author to resubmit.
    pub fn apply_remote(&self, remote: &StampedOperation) -> Result<()> {
        let mut log = self.log.lock();
        match log.apply_remote(remote) {
            Ok(()) => {
                self.publish(&log, None);
                Ok(())
            }
            Err(err) => {
                if let FrameCutError::ReconciliationRejected { reason, .. } = &err {
                    let _ = self.rejections.0.send(RemoteRejection {
                        stamp: remote.stamp.clone(),
                        reason: reason.clone(),
                    });
                }
                Err(err)
            }
        }
    }

    /// Replace the document with a project file. History is discarded.
    pub fn open_document(&self, path: &Path) -> Result<()> {
        let timeline = load_from_file(path)?;
        info!(
            path = %path.display(),
            tracks = timeline.tracks.len(),
            clips = timeline.clip_count(),
            duration = timeline.duration,
            "project opened"
        );
        self.playing.store(false, Ordering::Relaxed);
        let mut log = self.log.lock();
        log.reset(timeline);
        self.publish(&log, None);
        Ok(())
    }

    pub fn save_document(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        save_to_file(&snapshot, path)?;
        info!(path = %path.display(), "project saved");
        Ok(())
    }

    fn publish(&self, log: &EditLog, stamped: Option<StampedOperation>) {
        self.snapshots.send_replace(Arc::new(log.timeline().clone()));
        // Playhead, zoom and selection are local to this editor, including
        // the playhead restores bundled into undo batches
        let Some(StampedOperation { stamp, op }) = stamped else {
            return;
        };
        if let Some(op) = op.without_view_changes() {
            // The receiver half lives in `self`, so this cannot disconnect
            let _ = self.outbound.0.send(StampedOperation { stamp, op });
        }
    }

    // ── Keyboard actions ────────────────────────────────────────

    pub fn handle_action(&self, action: EditorAction) -> Result<()> {
        debug!(action = action.name(), "action");
        match action {
            EditorAction::Undo => return self.undo().map(|_| ()),
            EditorAction::Redo => return self.redo().map(|_| ()),
            _ => {}
        }

        // Decide and apply under one guard so no other writer lands between
        let mut log = self.log.lock();
        match self.action_op(action, log.timeline()) {
            Some(op) => self.perform_locked(&mut log, op),
            None => Ok(()),
        }
    }

    /// The edit an action makes to `timeline`, if any.
    fn action_op(&self, action: EditorAction, timeline: &Timeline) -> Option<Operation> {
        let rate = self.config.playback.frame_rate;
        match action {
            EditorAction::TogglePlayback => {
                let start = !self.is_playing();
                self.playing.store(start && timeline.duration > 0.0, Ordering::Relaxed);
                (start && timeline.playhead >= timeline.duration - TIME_EPSILON)
                    .then_some(Operation::SetPlayhead { time: 0.0 })
            }
            EditorAction::MarkIn => {
                let t = timeline.playhead;
                let end = timeline
                    .selection
                    .map(|s| s.end())
                    .filter(|end| *end > t + TIME_EPSILON)
                    .unwrap_or(timeline.duration);
                marks(t, end)
            }
            EditorAction::MarkOut => {
                let t = timeline.playhead;
                let start = timeline
                    .selection
                    .map(|s| s.start)
                    .filter(|start| *start < t - TIME_EPSILON)
                    .unwrap_or(0.0);
                marks(start, t)
            }
            EditorAction::CutAtPlayhead => {
                let ops = split_ops(timeline);
                if ops.is_empty() {
                    debug!(playhead = timeline.playhead, "nothing under the playhead to cut");
                    return None;
                }
                Some(Operation::Batch { ops })
            }
            EditorAction::StepFrames(n) => {
                let frame = (rate.frame_at(timeline.playhead) + n as i64).max(0);
                let time = rate.frame_time(frame as u64).min(timeline.duration);
                Some(Operation::SetPlayhead { time })
            }
            EditorAction::ZoomIn => Some(Operation::SetZoom {
                zoom: self.config.zoom.stepped(timeline.zoom, 1),
            }),
            EditorAction::ZoomOut => Some(Operation::SetZoom {
                zoom: self.config.zoom.stepped(timeline.zoom, -1),
            }),
            EditorAction::Undo | EditorAction::Redo => None,
        }
    }

    // ── Playback ────────────────────────────────────────────────

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Move the playhead by `delta` seconds of wall-clock time.
    ///
    /// Stops at the end of the timeline. Returns whether playback continues.
    pub fn advance_playback(&self, delta: f64) -> Result<bool> {
        if !self.is_playing() {
            return Ok(false);
        }
        let mut log = self.log.lock();
        let (playhead, duration) = (log.timeline().playhead, log.timeline().duration);
        let next = playhead + delta.max(0.0);
        let at_end = next >= duration - TIME_EPSILON;
        self.perform_locked(
            &mut log,
            Operation::SetPlayhead {
                time: next.min(duration),
            },
        )?;
        if at_end {
            self.playing.store(false, Ordering::Relaxed);
            debug!("playback reached the end");
        }
        Ok(!at_end)
    }

    /// Drive playback from the tick scheduler until the session is dropped.
    pub fn spawn_playback(self: &Arc<Self>) -> TickHandle {
        let session: Weak<Self> = Arc::downgrade(self);
        TickScheduler::spawn(self.config.playback.tick_rate, move |tick| {
            let Some(session) = session.upgrade() else {
                return ControlFlow::Break(());
            };
            if let Err(err) = session.advance_playback(tick.delta_secs()) {
                warn!(error = %err, "playback step failed");
                session.playing.store(false, Ordering::Relaxed);
            }
            ControlFlow::Continue(())
        })
    }

    // ── Preview, view and export ────────────────────────────────

    /// Composite the current snapshot at `t`.
    ///
    /// Starting a preview cancels any earlier one still in flight, so a fast
    /// scrub only finishes the latest frame.
    pub fn preview(&self, t: f64) -> Result<CompositeFrame> {
        let token = CancelToken::new();
        if let Some(previous) = self.preview_cancel.lock().replace(token.clone()) {
            previous.cancel();
        }
        let snapshot = self.snapshot();
        self.compositor.render(&snapshot, t, &token)
    }

    /// Draw the track view from the current snapshot.
    ///
    /// Never waits for peaks; missing ones are listed in the output for
    /// [`load_peaks`](Self::load_peaks).
    pub fn render_view(&self, renderer: &TimelineRenderer, viewport: &Viewport) -> RenderOutput {
        renderer.render(&self.snapshot(), viewport, &self.peaks)
    }

    /// Fetch peaks for `assets` into the peak store. Returns how many arrived.
    pub fn load_peaks(&self, assets: &[AssetId]) -> usize {
        assets
            .iter()
            .filter(|asset| match self.media.peaks(asset) {
                Ok(waveform) => {
                    self.peaks.insert((*asset).clone(), waveform);
                    true
                }
                Err(err) => {
                    debug!(asset = %asset, error = %err, "peaks not available yet");
                    false
                }
            })
            .count()
    }

    /// Export the current snapshot. Later edits do not affect the job.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_export<S>(&self, format: ExportFormat, sink: S) -> ExportHandle
    where
        S: ExportSink + 'static,
    {
        let job = ExportJob::new(self.snapshot(), Arc::clone(&self.media), format);
        spawn_export(job, sink)
    }
}

/// Selection for an in/out pair; `None` when the range is empty.
fn marks(start: f64, end: f64) -> Option<Operation> {
    if end - start <= TIME_EPSILON {
        debug!(start, end, "empty in/out range ignored");
        return None;
    }
    Some(Operation::SetSelection {
        selection: Some(TimeRange::from_start_end(start, end)),
    })
}

/// One split per unlocked track with a clip strictly under the playhead.
fn split_ops(timeline: &Timeline) -> Vec<Operation> {
    let t = timeline.playhead;
    timeline
        .tracks
        .iter()
        .filter(|track| !track.locked)
        .filter_map(|track| track.clip_at(t))
        .filter(|clip| t > clip.start_time + TIME_EPSILON && t < clip.end_time() - TIME_EPSILON)
        .map(|clip| Operation::SplitClip {
            clip_id: clip.id,
            at: t,
            new_clip_id: ClipId::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::Color;
    use framecut_media::{PatternAsset, PatternSource};
    use framecut_render::{ExportState, MemorySink};
    use framecut_timeline::{Clip, Track};

    fn session() -> (EditorSession, framecut_core::TrackId) {
        let media = PatternSource::new()
            .with_asset("red", PatternAsset::solid(10.0, 8, 8, Color::RED).with_tone(440.0, 0.5));
        let mut config = EditorConfig::default();
        config.canvas.width = 8;
        config.canvas.height = 8;
        config.author = "me".into();
        let track = Track::new_video("V1");
        let id = track.id;
        let timeline = Timeline::with_tracks(vec![track]).unwrap();
        (EditorSession::with_timeline(config, Arc::new(media), timeline), id)
    }

    fn add_clip(session: &EditorSession, track: framecut_core::TrackId, start: f64, dur: f64) -> ClipId {
        let clip = Clip::new("red", AssetId::new("red"), dur, track, start);
        let id = clip.id;
        session.perform(Operation::AddClip { clip }).unwrap();
        id
    }

    #[test]
    fn test_perform_publishes_snapshot_and_feed() {
        let (session, track) = session();
        let mut rx = session.subscribe();
        let feed = session.outbound();
        add_clip(&session, track, 0.0, 4.0);

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clip_count(), 1);
        let stamped = feed.try_recv().unwrap();
        assert_eq!(stamped.stamp.sequence, 1);
        assert_eq!(stamped.stamp.author, AuthorId::new("me"));

        assert!(session.undo().unwrap());
        assert_eq!(session.snapshot().clip_count(), 0);
        assert_eq!(feed.try_recv().unwrap().stamp.sequence, 2);
        assert!(session.redo().unwrap());
        assert_eq!(session.snapshot().clip_count(), 1);
        assert!(!session.redo().unwrap());
    }

    #[test]
    fn test_undo_feed_omits_playhead_restore() {
        let (session, track) = session();
        let feed = session.outbound();
        let clip_id = add_clip(&session, track, 0.0, 4.0);
        session.perform(Operation::SetPlayhead { time: 3.0 }).unwrap();
        // Shortening the timeline pulls the playhead back to 2
        session
            .perform(Operation::TrimClip {
                clip_id,
                in_point: None,
                out_point: Some(2.0),
            })
            .unwrap();
        assert_eq!(session.snapshot().playhead, 2.0);
        while feed.try_recv().is_ok() {}

        assert!(session.undo().unwrap());
        assert_eq!(session.snapshot().playhead, 3.0);
        let published = feed.try_recv().unwrap();
        assert!(matches!(published.op, Operation::UpdateClip { .. }));
        assert!(feed.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_steps_are_not_lost() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 10.0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        session.handle_action(EditorAction::StepFrames(1)).unwrap();
                    }
                });
            }
        });
        let rate = session.config().playback.frame_rate;
        assert_eq!(rate.frame_at(session.snapshot().playhead), 100);
    }

    #[test]
    fn test_remote_rejection_is_reported() {
        let (session, track) = session();
        let rejections = session.rejections();
        let clip = Clip::new("x", AssetId::new("red"), 1.0, track, 0.0);
        let remote = StampedOperation {
            stamp: OperationStamp {
                author: AuthorId::new("them"),
                sequence: 5,
            },
            op: Operation::RemoveClip { clip_id: clip.id },
        };
        assert!(matches!(
            session.apply_remote(&remote),
            Err(FrameCutError::ReconciliationRejected { .. })
        ));
        let notice = rejections.try_recv().unwrap();
        assert_eq!(notice.stamp.sequence, 5);
    }

    #[test]
    fn test_cut_at_playhead_splits_unlocked_tracks() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 4.0);
        let locked = Track {
            locked: true,
            ..Track::new_video("V2")
        };
        let locked_id = locked.id;
        session
            .perform(Operation::AddTrack { track: locked, index: None })
            .unwrap();
        session.perform(Operation::SetPlayhead { time: 2.0 }).unwrap();

        session.handle_action(EditorAction::CutAtPlayhead).unwrap();
        let tl = session.snapshot();
        assert_eq!(tl.tracks[0].clips.len(), 2);
        assert_eq!(tl.track(locked_id).map(|t| t.clips.len()), Some(0));

        // One undo reverts the whole cut
        session.handle_action(EditorAction::Undo).unwrap();
        assert_eq!(session.snapshot().tracks[0].clips.len(), 1);
    }

    #[test]
    fn test_marks_set_selection() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 4.0);
        session.perform(Operation::SetPlayhead { time: 1.0 }).unwrap();
        session.handle_action(EditorAction::MarkIn).unwrap();
        session.perform(Operation::SetPlayhead { time: 3.0 }).unwrap();
        session.handle_action(EditorAction::MarkOut).unwrap();

        let selection = session.snapshot().selection.unwrap();
        assert!((selection.start - 1.0).abs() < 1e-9);
        assert!((selection.end() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_frames_and_zoom() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 4.0);
        session.handle_action(EditorAction::StepFrames(10)).unwrap();
        assert!((session.snapshot().playhead - 10.0 / 30.0).abs() < 1e-9);
        session.handle_action(EditorAction::StepFrames(-100)).unwrap();
        assert_eq!(session.snapshot().playhead, 0.0);

        let before = session.snapshot().zoom;
        session.handle_action(EditorAction::ZoomIn).unwrap();
        assert!(session.snapshot().zoom > before);
        session.handle_action(EditorAction::ZoomOut).unwrap();
        assert!((session.snapshot().zoom - before).abs() < 1e-9);
    }

    #[test]
    fn test_playback_stops_at_end() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 1.0);
        session.handle_action(EditorAction::TogglePlayback).unwrap();
        assert!(session.is_playing());
        assert!(session.advance_playback(0.5).unwrap());
        assert!(!session.advance_playback(0.75).unwrap());
        assert!(!session.is_playing());
        assert_eq!(session.snapshot().playhead, 1.0);

        // Toggling at the end restarts from zero
        session.handle_action(EditorAction::TogglePlayback).unwrap();
        assert_eq!(session.snapshot().playhead, 0.0);
        assert!(session.is_playing());
    }

    #[test]
    fn test_preview_cancels_previous_token() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 2.0);
        let frame = session.preview(1.0).unwrap();
        assert_eq!(frame.image.pixel(4, 4), Some(Color::RED.to_array()));
        let first = session.preview_cancel.lock().clone().unwrap();
        session.preview(1.5).unwrap();
        assert!(first.is_cancelled());
    }

    #[test]
    fn test_render_view_and_peaks() {
        let (session, _) = session();
        let audio = Track::new_audio("A1");
        let audio_id = audio.id;
        session
            .perform(Operation::AddTrack { track: audio, index: None })
            .unwrap();
        add_clip(&session, audio_id, 0.0, 2.0);

        let renderer = TimelineRenderer::new(session.config().layout, session.config().playback.frame_rate);
        let out = session.render_view(&renderer, &Viewport::new(400.0, 200.0));
        assert_eq!(out.missing_peaks, vec![AssetId::new("red")]);
        assert_eq!(session.load_peaks(&out.missing_peaks), 1);
        let out = session.render_view(&renderer, &Viewport::new(400.0, 200.0));
        assert!(out.missing_peaks.is_empty());
    }

    #[test]
    fn test_save_and_open_document() {
        let (session, track) = session();
        add_clip(&session, track, 0.0, 3.0);
        let path = std::env::temp_dir().join(format!("framecut-session-{}.json", std::process::id()));
        session.save_document(&path).unwrap();

        let media: Arc<dyn MediaSource> = Arc::new(PatternSource::new());
        let other = EditorSession::new(EditorConfig::default(), media);
        other.open_document(&path).unwrap();
        assert_eq!(*other.snapshot(), *session.snapshot());
        assert!(!other.can_undo());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_export_uses_snapshot_at_start() {
        let (session, track) = session();
        let clip_id = add_clip(&session, track, 0.0, 1.0);
        let format = ExportFormat {
            width: 8,
            height: 8,
            ..ExportFormat::hd_30()
        };
        let handle = session.start_export(format, MemorySink::new());
        // Edits after the snapshot do not reach the job
        session.perform(Operation::RemoveClip { clip_id }).unwrap();

        let state = handle.join().await.unwrap();
        assert_eq!(
            state,
            ExportState::Completed {
                artifact: "memory://30-frames".into(),
                frames_rendered: 30,
            }
        );
    }
}
