//! Export jobs: render a timeline snapshot frame by frame into a sink.
//!
//! A job walks `t` from zero to the timeline duration at the output frame
//! rate, compositing each frame with a failing media policy. Any decode or
//! encode error fails the whole job; there is no partial success.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use framecut_core::{CancelToken, Color, FrameCutError, FrameRate, Result};
use framecut_media::MediaSource;
use framecut_timeline::Timeline;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::compositor::{CompositeFrame, Compositor, CompositorConfig, MediaErrorPolicy};

// ── Format ──────────────────────────────────────────────────────

/// Output format handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportFormat {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub sample_rate: u32,
    pub channels: u16,
}

impl ExportFormat {
    /// 1080p30 with 48 kHz stereo.
    pub fn hd_30() -> Self {
        Self {
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::FPS_30,
            sample_rate: 48_000,
            channels: 2,
        }
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            width: self.width,
            height: self.height,
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_rate: self.frame_rate,
            background: Color::BLACK,
            limiter: false,
        }
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::hd_30()
    }
}

// ── Sinks ───────────────────────────────────────────────────────

/// The encoder collaborator receiving rendered frames.
pub trait ExportSink: Send {
    /// Called once before the first frame.
    fn begin(&mut self, format: &ExportFormat, total_frames: u64) -> Result<()>;

    fn write_frame(&mut self, frame: &CompositeFrame) -> Result<()>;

    /// Finalize the artifact and return its handle (path, URL, ...).
    fn finish(&mut self) -> Result<String>;

    /// Discard a partially written artifact after a failure.
    fn abort(&mut self) {}
}

impl<S: ExportSink + ?Sized> ExportSink for Box<S> {
    fn begin(&mut self, format: &ExportFormat, total_frames: u64) -> Result<()> {
        (**self).begin(format, total_frames)
    }

    fn write_frame(&mut self, frame: &CompositeFrame) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<String> {
        (**self).finish()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<CompositeFrame>,
    pub finished: bool,
    pub aborted: bool,
    /// Fail `write_frame` for this frame index, for testing encoder errors
    pub fail_at: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExportSink for MemorySink {
    fn begin(&mut self, _format: &ExportFormat, total_frames: u64) -> Result<()> {
        self.frames.clear();
        self.frames.reserve(total_frames as usize);
        Ok(())
    }

    fn write_frame(&mut self, frame: &CompositeFrame) -> Result<()> {
        if self.fail_at == Some(self.frames.len()) {
            return Err(FrameCutError::EncodeFailure(format!(
                "sink rejected frame {}",
                self.frames.len()
            )));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<String> {
        self.finished = true;
        Ok(format!("memory://{}-frames", self.frames.len()))
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.frames.clear();
    }
}

/// Writes raw RGBA8 video to `<prefix>.rgba` and interleaved little-endian
/// f32 PCM to `<prefix>.pcm`.
pub struct RawFileSink {
    prefix: PathBuf,
    video: Option<BufWriter<File>>,
    audio: Option<BufWriter<File>>,
}

impl RawFileSink {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            video: None,
            audio: None,
        }
    }

    pub fn video_path(&self) -> PathBuf {
        self.prefix.with_extension("rgba")
    }

    pub fn audio_path(&self) -> PathBuf {
        self.prefix.with_extension("pcm")
    }
}

fn encode_err(e: std::io::Error) -> FrameCutError {
    FrameCutError::EncodeFailure(e.to_string())
}

impl ExportSink for RawFileSink {
    fn begin(&mut self, format: &ExportFormat, total_frames: u64) -> Result<()> {
        debug!(
            path = %self.video_path().display(),
            width = format.width,
            height = format.height,
            total_frames,
            "opening raw sink"
        );
        self.video = Some(BufWriter::new(File::create(self.video_path()).map_err(encode_err)?));
        self.audio = Some(BufWriter::new(File::create(self.audio_path()).map_err(encode_err)?));
        Ok(())
    }

    fn write_frame(&mut self, frame: &CompositeFrame) -> Result<()> {
        let (Some(video), Some(audio)) = (self.video.as_mut(), self.audio.as_mut()) else {
            return Err(FrameCutError::InvalidState("raw sink not started".into()));
        };
        video.write_all(&frame.image.data).map_err(encode_err)?;
        for s in &frame.audio.samples {
            audio.write_all(&s.to_le_bytes()).map_err(encode_err)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<String> {
        for writer in [self.video.take(), self.audio.take()].into_iter().flatten() {
            writer
                .into_inner()
                .map_err(|e| FrameCutError::EncodeFailure(e.to_string()))?
                .sync_all()
                .map_err(encode_err)?;
        }
        Ok(self.video_path().display().to_string())
    }

    fn abort(&mut self) {
        self.video = None;
        self.audio = None;
        for path in [self.video_path(), self.audio_path()] {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove partial export");
            }
        }
    }
}

// ── Job ─────────────────────────────────────────────────────────

/// Export progress information.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportProgress {
    pub frames_rendered: u64,
    pub total_frames: u64,
    /// Rendering speed in frames per second.
    pub fps: f64,
}

impl ExportProgress {
    /// Completion fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_rendered as f64 / self.total_frames as f64
    }
}

/// Lifecycle of an export job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Pending,
    Rendering {
        frames_rendered: u64,
        total_frames: u64,
    },
    Completed {
        artifact: String,
        frames_rendered: u64,
    },
    Failed {
        /// Timeline time of the frame that failed
        at_time: f64,
        frames_rendered: u64,
        reason: String,
    },
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub fn frames_rendered(&self) -> u64 {
        match self {
            Self::Pending => 0,
            Self::Rendering { frames_rendered, .. }
            | Self::Completed { frames_rendered, .. }
            | Self::Failed { frames_rendered, .. } => *frames_rendered,
        }
    }
}

/// Renders one immutable timeline snapshot.
pub struct ExportJob {
    timeline: Arc<Timeline>,
    format: ExportFormat,
    compositor: Compositor,
    state: ExportState,
    cancel: CancelToken,
}

impl ExportJob {
    pub fn new(timeline: Arc<Timeline>, media: Arc<dyn MediaSource>, format: ExportFormat) -> Self {
        let compositor = Compositor::new(format.compositor_config(), media).with_policy(MediaErrorPolicy::Fail);
        Self {
            timeline,
            format,
            compositor,
            state: ExportState::Pending,
            cancel: CancelToken::new(),
        }
    }

    pub fn format(&self) -> &ExportFormat {
        &self.format
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    /// Handle that stops the job before its next frame.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Frames covering the snapshot's duration.
    pub fn total_frames(&self) -> u64 {
        self.format.frame_rate.frame_count(self.timeline.duration)
    }

    /// Run the job to a terminal state.
    ///
    /// Errors only if the job was already run; render and sink failures are
    /// reported through the returned `Failed` state.
    pub fn run(
        &mut self,
        sink: &mut dyn ExportSink,
        mut on_progress: impl FnMut(ExportProgress),
    ) -> Result<&ExportState> {
        if self.state != ExportState::Pending {
            return Err(FrameCutError::InvalidState(format!(
                "export job already ran: {:?}",
                self.state
            )));
        }

        let total_frames = self.total_frames();
        let rate = self.format.frame_rate;
        info!(
            total_frames,
            fps = rate.to_fps_f64(),
            width = self.format.width,
            height = self.format.height,
            "export started"
        );
        self.state = ExportState::Rendering {
            frames_rendered: 0,
            total_frames,
        };

        if let Err(e) = sink.begin(&self.format, total_frames) {
            return Ok(self.fail(sink, 0.0, 0, e));
        }

        let started = Instant::now();
        for index in 0..total_frames {
            let t = rate.frame_time(index);
            let rendered = self
                .cancel
                .check()
                .and_then(|_| self.compositor.render(&self.timeline, t, &self.cancel))
                .and_then(|frame| sink.write_frame(&frame));
            if let Err(e) = rendered {
                return Ok(self.fail(sink, t, index, e));
            }

            let frames_rendered = index + 1;
            self.state = ExportState::Rendering {
                frames_rendered,
                total_frames,
            };
            let elapsed = started.elapsed().as_secs_f64();
            on_progress(ExportProgress {
                frames_rendered,
                total_frames,
                fps: if elapsed > 0.0 {
                    frames_rendered as f64 / elapsed
                } else {
                    0.0
                },
            });
        }

        match sink.finish() {
            Ok(artifact) => {
                info!(%artifact, frames = total_frames, "export completed");
                self.state = ExportState::Completed {
                    artifact,
                    frames_rendered: total_frames,
                };
                Ok(&self.state)
            }
            Err(e) => Ok(self.fail(sink, self.timeline.duration, total_frames, e)),
        }
    }

    fn fail(
        &mut self,
        sink: &mut dyn ExportSink,
        at_time: f64,
        frames_rendered: u64,
        reason: FrameCutError,
    ) -> &ExportState {
        error!(at_time, frames_rendered, error = %reason, "export failed");
        sink.abort();
        self.state = ExportState::Failed {
            at_time,
            frames_rendered,
            reason: reason.to_string(),
        };
        &self.state
    }
}

/// A job running on the tokio blocking pool.
pub struct ExportHandle {
    pub progress: watch::Receiver<ExportProgress>,
    pub cancel: CancelToken,
    pub task: JoinHandle<ExportState>,
}

impl ExportHandle {
    /// Wait for the job's terminal state.
    pub async fn join(self) -> Result<ExportState> {
        self.task
            .await
            .map_err(|e| FrameCutError::InvalidState(format!("export task panicked: {e}")))
    }
}

/// Run `job` on a blocking task, publishing progress on a watch channel.
///
/// Must be called from within a tokio runtime.
pub fn spawn_export<S>(mut job: ExportJob, mut sink: S) -> ExportHandle
where
    S: ExportSink + 'static,
{
    let (tx, rx) = watch::channel(ExportProgress {
        frames_rendered: 0,
        total_frames: job.total_frames(),
        fps: 0.0,
    });
    let cancel = job.cancel_token();
    let task = tokio::task::spawn_blocking(move || {
        let result = job.run(&mut sink, |p| {
            // Receivers may have gone away; the job still runs to completion
            let _ = tx.send(p);
        });
        match result {
            Ok(state) => state.clone(),
            Err(e) => ExportState::Failed {
                at_time: 0.0,
                frames_rendered: 0,
                reason: e.to_string(),
            },
        }
    });
    ExportHandle {
        progress: rx,
        cancel,
        task,
    }
}
