//! FrameCut command-line front end.
//!
//! Usage:
//!   framecut <project.json> [--export <out-prefix>] [--fps <n>] [--config <path>]
//!
//! Loads a project and logs a summary. With `--export`, renders the whole
//! timeline to `<out-prefix>.rgba` (raw RGBA frames) and `<out-prefix>.pcm`
//! (interleaved f32 little-endian samples), using generated pattern media in
//! place of real footage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use framecut_app::{init_logging, EditorConfig, EditorSession};
use framecut_core::{format_timecode, AssetId, FrameRate};
use framecut_media::{PatternAsset, PatternSource};
use framecut_render::{ExportState, RawFileSink};
use framecut_timeline::Timeline;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "framecut", about = "Timeline video editor core", version)]
struct Cli {
    /// Project file (JSON)
    project: PathBuf,

    /// Render the timeline to <OUT_PREFIX>.rgba and <OUT_PREFIX>.pcm
    #[arg(long, value_name = "OUT_PREFIX")]
    export: Option<PathBuf>,

    /// Export frame rate, overriding the configured one
    #[arg(long)]
    fps: Option<u32>,

    /// Config file; defaults to the per-user config location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(EditorConfig::default_path);
    let (config, config_error) = match EditorConfig::try_load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (EditorConfig::default(), Some(err)),
    };
    init_logging(&config.logging);
    match config_error {
        Some(err) if cli.config.is_some() || config_path.exists() => {
            warn!(path = %config_path.display(), error = %err, "using default config");
        }
        Some(_) => debug!(path = %config_path.display(), "no config file, using defaults"),
        None => debug!(path = %config_path.display(), "config loaded"),
    }

    let media = Arc::new(PatternSource::new());
    let session = EditorSession::new(config, media.clone());
    session
        .open_document(&cli.project)
        .with_context(|| format!("failed to open {}", cli.project.display()))?;

    let timeline = session.snapshot();
    register_assets(&media, &timeline, session.config());
    log_summary(&timeline, session.config().playback.frame_rate);

    if let Some(prefix) = cli.export {
        let mut format = session.config().export_format();
        if let Some(fps) = cli.fps {
            if fps == 0 {
                bail!("--fps must be positive");
            }
            format = format.with_frame_rate(FrameRate::new(fps, 1));
        }
        export(&session, format, &prefix).await?;
    }

    Ok(())
}

/// Give every referenced asset a deterministic pattern of the right length.
fn register_assets(media: &PatternSource, timeline: &Timeline, config: &EditorConfig) {
    let mut durations: HashMap<&AssetId, f64> = HashMap::new();
    for clip in timeline.tracks.iter().flat_map(|t| &t.clips) {
        let entry = durations.entry(&clip.asset_id).or_default();
        *entry = entry.max(clip.asset_duration);
    }
    for (asset_id, duration) in durations {
        media.insert(
            asset_id.clone(),
            PatternAsset::derived(asset_id, duration, config.canvas.width, config.canvas.height),
        );
    }
}

fn log_summary(timeline: &Timeline, rate: FrameRate) {
    info!(
        tracks = timeline.tracks.len(),
        clips = timeline.clip_count(),
        markers = timeline.markers.len(),
        duration = %format_timecode(timeline.duration, rate),
        "project summary"
    );
    for (index, track) in timeline.tracks.iter().enumerate() {
        info!(
            index,
            name = %track.name,
            kind = ?track.kind,
            clips = track.clips.len(),
            locked = track.locked,
            visible = track.visible,
            muted = track.muted,
            "track"
        );
    }
}

async fn export(
    session: &EditorSession,
    format: framecut_render::ExportFormat,
    prefix: &Path,
) -> Result<()> {
    let sink = RawFileSink::new(prefix);
    let (video, audio) = (sink.video_path(), sink.audio_path());
    info!(
        width = format.width,
        height = format.height,
        fps = format.frame_rate.to_fps_f64(),
        video = %video.display(),
        audio = %audio.display(),
        "export started"
    );

    let handle = session.start_export(format, sink);
    let mut progress = handle.progress.clone();
    let reporter = tokio::spawn(async move {
        let mut last_decile = 0;
        while progress.changed().await.is_ok() {
            let p = *progress.borrow_and_update();
            let decile = (p.fraction() * 10.0).floor() as u32;
            if decile > last_decile {
                last_decile = decile;
                info!(
                    frames = p.frames_rendered,
                    total = p.total_frames,
                    fps = p.fps,
                    "export {}%",
                    decile * 10
                );
            }
        }
    });

    let state = handle.join().await?;
    // The progress sender is gone once the job ends
    let _ = reporter.await;

    match state {
        ExportState::Completed {
            artifact,
            frames_rendered,
        } => {
            info!(%artifact, frames_rendered, "export finished");
            Ok(())
        }
        ExportState::Failed {
            at_time,
            frames_rendered,
            reason,
        } => bail!(
            "export failed at {:.3}s after {} frames: {}",
            at_time,
            frames_rendered,
            reason
        ),
        other => bail!("export ended in unexpected state {other:?}"),
    }
}
