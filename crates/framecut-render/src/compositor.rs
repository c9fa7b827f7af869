//! CPU preview compositor.
//!
//! `render` is a pure function of `(Timeline, t, media source)`: every call
//! allocates its own canvas and audio buffer, so scrub previews and export
//! jobs can run side by side on the same compositor.

use std::sync::Arc;

use framecut_audio::block::frames_between;
use framecut_audio::{AudioBlock, FadeEnvelope, MixInput, Mixer, MixerChannel};
use framecut_core::{
    CancelToken, Color, FrameBuffer, FrameRate, Result, TimeRange, Transform2D, Vec2, TIME_EPSILON,
};
use framecut_effects::{EffectRegistry, TransitionRegistry};
use framecut_media::MediaSource;
use framecut_timeline::{Clip, Timeline, Track, TrackKind, TransitionEdge};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Output geometry and audio layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositorConfig {
    pub width: u32,
    pub height: u32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frame rate used to size each audio block.
    pub frame_rate: FrameRate,
    pub background: Color,
    /// Clamp the mixed audio to the mixer threshold. Off by default: the
    /// output is the plain sum of every clip's enveloped samples.
    #[serde(default)]
    pub limiter: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            sample_rate: 48_000,
            channels: 2,
            frame_rate: FrameRate::FPS_30,
            background: Color::BLACK,
            limiter: false,
        }
    }
}

/// What to do when the media source cannot supply a frame or samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaErrorPolicy {
    /// Substitute color bars (or silence) and keep going. Used for preview.
    #[default]
    Placeholder,
    /// Propagate the error. Used for export.
    Fail,
}

/// A composited output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFrame {
    /// Timeline time this frame shows.
    pub time: f64,
    pub image: FrameBuffer,
    /// Audio covering `[time, next frame boundary)`.
    pub audio: AudioBlock,
}

/// Turns a timeline into frames.
#[derive(Clone)]
pub struct Compositor {
    config: CompositorConfig,
    media: Arc<dyn MediaSource>,
    effects: Arc<EffectRegistry>,
    transitions: Arc<TransitionRegistry>,
    mixer: Mixer,
    policy: MediaErrorPolicy,
}

impl Compositor {
    pub fn new(config: CompositorConfig, media: Arc<dyn MediaSource>) -> Self {
        let mut mixer = Mixer::new(config.channels);
        mixer.limiter_enabled = config.limiter;
        Self {
            config,
            media,
            effects: Arc::new(EffectRegistry::new()),
            transitions: Arc::new(TransitionRegistry::new()),
            mixer,
            policy: MediaErrorPolicy::Placeholder,
        }
    }

    pub fn with_policy(mut self, policy: MediaErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_effects(mut self, effects: Arc<EffectRegistry>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_transitions(mut self, transitions: Arc<TransitionRegistry>) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn policy(&self) -> MediaErrorPolicy {
        self.policy
    }

    /// Composite the frame shown at `t`.
    ///
    /// `cancel` is checked before each track and each media fetch; a
    /// cancelled call returns `FrameCutError::Cancelled`.
    pub fn render(&self, timeline: &Timeline, t: f64, cancel: &CancelToken) -> Result<CompositeFrame> {
        let image = self.render_image(timeline, t, cancel)?;
        let audio = self.render_audio(timeline, t, cancel)?;
        Ok(CompositeFrame {
            time: t,
            image,
            audio,
        })
    }

    fn render_image(&self, timeline: &Timeline, t: f64, cancel: &CancelToken) -> Result<FrameBuffer> {
        let mut canvas = FrameBuffer::solid(self.config.width, self.config.height, self.config.background);

        // Bottom to top: later tracks draw over earlier ones
        for track in timeline.tracks.iter().filter(|tr| tr.visible) {
            cancel.check()?;
            match track.kind {
                TrackKind::Effect => {
                    if let Some(clip) = track.clip_at(t) {
                        self.effects.apply_chain(&mut canvas, &clip.effects);
                    }
                }
                kind if kind.has_image() => {
                    if let Some(layer) = self.track_layer(track, t, cancel)? {
                        canvas.composite_over(&layer);
                    }
                }
                _ => {}
            }
        }
        Ok(canvas)
    }

    /// The image a track contributes at `t`, blending across a transition
    /// window when `t` falls inside one.
    fn track_layer(&self, track: &Track, t: f64, cancel: &CancelToken) -> Result<Option<FrameBuffer>> {
        let Some(index) = track.clip_index_at(t) else {
            return Ok(None);
        };
        let clip = &track.clips[index];

        if let Some(tr) = &clip.transition_in {
            if t < clip.start_time + tr.duration {
                let progress = ((t - clip.start_time) / tr.duration) as f32;
                let from = match track.adjacent(index, TransitionEdge::In) {
                    Some(prev) => self.clip_layer(prev, t, cancel)?,
                    None => self.empty_layer(),
                };
                let to = self.clip_layer(clip, t, cancel)?;
                trace!(clip = %clip.id, progress, "transition in");
                let blend = self.transitions.resolve(&tr.kind);
                return Ok(Some(blend.blend(&from, &to, progress, &tr.parameters)));
            }
        }

        if let Some(tr) = &clip.transition_out {
            let window_start = clip.end_time() - tr.duration;
            if t >= window_start {
                let progress = ((t - window_start) / tr.duration) as f32;
                let from = self.clip_layer(clip, t, cancel)?;
                let to = match track.adjacent(index, TransitionEdge::Out) {
                    Some(next) => self.clip_layer(next, t, cancel)?,
                    None => self.empty_layer(),
                };
                trace!(clip = %clip.id, progress, "transition out");
                let blend = self.transitions.resolve(&tr.kind);
                return Ok(Some(blend.blend(&from, &to, progress, &tr.parameters)));
            }
        }

        self.clip_layer(clip, t, cancel).map(Some)
    }

    fn empty_layer(&self) -> FrameBuffer {
        FrameBuffer::new(self.config.width, self.config.height)
    }

    /// One clip's canvas-sized layer: transformed source frame, then its
    /// effect chain.
    ///
    /// Outside the clip's own range (the far side of a transition) the
    /// nearest source frame is held.
    fn clip_layer(&self, clip: &Clip, t: f64, cancel: &CancelToken) -> Result<FrameBuffer> {
        cancel.check()?;
        let last_frame = (clip.out_point - self.config.frame_rate.frame_duration() * 0.5).max(clip.in_point);
        let source_time = clip.source_time_at(t).clamp(clip.in_point, last_frame);

        let source = match self.media.frame(&clip.asset_id, source_time) {
            Ok(frame) => frame,
            Err(e) if self.policy == MediaErrorPolicy::Placeholder => {
                warn!(clip = %clip.id, asset = %clip.asset_id, error = %e, "frame unavailable, using placeholder");
                FrameBuffer::test_pattern(self.config.width, self.config.height)
            }
            Err(e) => return Err(e),
        };

        let mut layer = self.place(&source, clip);
        self.effects.apply_chain(&mut layer, &clip.effects);
        Ok(layer)
    }

    /// Apply opacity, scale, rotation and position (in that order) onto a
    /// transparent canvas-sized layer.
    fn place(&self, source: &FrameBuffer, clip: &Clip) -> FrameBuffer {
        let (cw, ch) = (self.config.width, self.config.height);
        let opacity = clip.opacity.clamp(0.0, 1.0) as f32;
        let untransformed = clip.scale == 1.0
            && clip.rotation == 0.0
            && clip.position == Vec2::ZERO
            && source.width == cw
            && source.height == ch;

        if untransformed {
            let mut layer = source.clone();
            if opacity < 1.0 {
                for px in layer.data.chunks_exact_mut(4) {
                    px[3] = (px[3] as f32 * opacity).round() as u8;
                }
            }
            return layer;
        }

        let forward = Transform2D::placement(
            Vec2::new(source.width as f32, source.height as f32),
            Vec2::new(cw as f32, ch as f32),
            clip.scale as f32,
            clip.rotation as f32,
            clip.position,
        );
        let mut layer = FrameBuffer::new(cw, ch);
        let Some(inverse) = forward.try_inverse() else {
            return layer;
        };

        for y in 0..ch {
            for x in 0..cw {
                let p = inverse.transform_point(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if p.x < 0.0 || p.y < 0.0 {
                    continue;
                }
                if let Some(mut px) = source.pixel(p.x as u32, p.y as u32) {
                    px[3] = (px[3] as f32 * opacity).round() as u8;
                    layer.set_pixel(x, y, px);
                }
            }
        }
        layer
    }

    fn render_audio(&self, timeline: &Timeline, t: f64, cancel: &CancelToken) -> Result<AudioBlock> {
        let rate = self.config.sample_rate.max(1);
        let channels = self.config.channels.max(1);
        let frame_rate = self.config.frame_rate;
        let next_boundary = frame_rate.frame_time(frame_rate.frame_at(t).max(0) as u64 + 1);
        let frame_count = frames_between(t, next_boundary, rate);
        let block_end = t + frame_count as f64 / rate as f64;

        let mut sources: Vec<Vec<f32>> = Vec::new();
        for track in timeline.tracks.iter().filter(|tr| tr.kind.has_audio() && !tr.muted) {
            for clip in track.clips_in_range(TimeRange::from_start_end(t, block_end)) {
                cancel.check()?;
                if let Some(samples) = self.clip_audio(clip, t, frame_count, channels)? {
                    sources.push(samples);
                }
            }
        }

        let inputs: Vec<MixInput<'_>> = sources
            .iter()
            .map(|s| MixInput {
                samples: s,
                channel: MixerChannel::default(),
            })
            .collect();
        Ok(AudioBlock {
            sample_rate: rate,
            channels,
            start_time: t,
            samples: self.mixer.mix(&inputs, frame_count),
        })
    }

    /// A clip's enveloped samples for the block starting at `block_start`.
    fn clip_audio(
        &self,
        clip: &Clip,
        block_start: f64,
        frame_count: usize,
        channels: u16,
    ) -> Result<Option<Vec<f32>>> {
        let rate = self.config.sample_rate.max(1);
        let skip = ((clip.start_time - block_start) * rate as f64 - TIME_EPSILON)
            .ceil()
            .max(0.0) as usize;
        if skip >= frame_count {
            return Ok(None);
        }
        let fetch_start = block_start + skip as f64 / rate as f64;
        let fetched = self.media.audio(
            &clip.asset_id,
            clip.source_time_at(fetch_start),
            frame_count - skip,
            rate,
            channels,
        );
        let fetched = match fetched {
            Ok(samples) => samples,
            Err(e) if self.policy == MediaErrorPolicy::Placeholder => {
                warn!(clip = %clip.id, asset = %clip.asset_id, error = %e, "audio unavailable, using silence");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut samples = vec![0.0f32; frame_count * channels as usize];
        let offset = skip * channels as usize;
        let len = fetched.len().min(samples.len() - offset);
        samples[offset..offset + len].copy_from_slice(&fetched[..len]);

        let envelope = FadeEnvelope {
            start: clip.start_time,
            duration: clip.duration,
            volume: clip.volume,
            fade_in: clip.audio_fade_in,
            fade_out: clip.audio_fade_out,
        };
        envelope.apply(&mut samples, channels, rate, block_start);
        Ok(Some(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::{AssetId, FrameCutError};
    use framecut_media::{PatternAsset, PatternSource};
    use framecut_timeline::{Effect, Operation, ParamValue, Transition};

    const W: u32 = 4;
    const H: u32 = 4;

    fn config() -> CompositorConfig {
        CompositorConfig {
            width: W,
            height: H,
            sample_rate: 300,
            channels: 1,
            frame_rate: FrameRate::FPS_30,
            background: Color::BLACK,
            limiter: false,
        }
    }

    fn media() -> Arc<PatternSource> {
        Arc::new(
            PatternSource::new()
                .with_asset("red", PatternAsset::solid(10.0, W, H, Color::rgb(200, 0, 0)))
                .with_asset("blue", PatternAsset::solid(10.0, W, H, Color::rgb(0, 0, 200)))
                .with_asset("tone", PatternAsset::solid(10.0, W, H, Color::WHITE).with_tone(75.0, 0.5))
                .with_asset("loud", PatternAsset::solid(10.0, W, H, Color::WHITE).with_tone(75.0, 1.0)),
        )
    }

    fn compositor(media: Arc<PatternSource>) -> Compositor {
        Compositor::new(config(), media)
    }

    fn single_track(clips: Vec<Clip>) -> Timeline {
        let track = Track::new_video("V1");
        let id = track.id;
        let mut timeline = Timeline::with_tracks(vec![track]).unwrap();
        for mut clip in clips {
            clip.track_id = id;
            timeline = timeline.apply(&Operation::AddClip { clip }).unwrap();
        }
        timeline
    }

    fn clip(asset: &str, start: f64, duration: f64) -> Clip {
        Clip::new(asset, AssetId::new(asset), 10.0, Default::default(), start)
            .with_source_range(0.0, duration)
    }

    #[test]
    fn test_empty_timeline_is_background() {
        let frame = compositor(media())
            .render(&Timeline::new(), 0.0, &CancelToken::new())
            .unwrap();
        assert_eq!(frame.image.pixel(0, 0), Some([0, 0, 0, 255]));
        assert!(frame.audio.is_silent());
        assert_eq!(frame.audio.frame_count(), 10);
    }

    #[test]
    fn test_single_clip_and_opacity() {
        let mut c = clip("red", 0.0, 5.0);
        c.opacity = 0.5;
        let timeline = single_track(vec![c]);
        let frame = compositor(media()).render(&timeline, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(frame.image.pixel(2, 2), Some([100, 0, 0, 255]));
    }

    #[test]
    fn test_upper_track_draws_over_lower() {
        let v1 = Track::new_video("V1");
        let v2 = Track::new_video("V2");
        let (id1, id2) = (v1.id, v2.id);
        let mut lower = clip("red", 0.0, 5.0);
        lower.track_id = id1;
        let mut upper = clip("blue", 0.0, 5.0);
        upper.track_id = id2;
        let timeline = Timeline::with_tracks(vec![v1, v2])
            .unwrap()
            .apply(&Operation::Batch {
                ops: vec![Operation::AddClip { clip: lower }, Operation::AddClip { clip: upper }],
            })
            .unwrap();
        let frame = compositor(media()).render(&timeline, 2.0, &CancelToken::new()).unwrap();
        assert_eq!(frame.image.pixel(0, 0), Some([0, 0, 200, 255]));
    }

    #[test]
    fn test_scale_and_position_leave_background() {
        let mut c = clip("red", 0.0, 5.0);
        c.scale = 0.5;
        c.position = Vec2::new(-1.0, -1.0);
        let timeline = single_track(vec![c]);
        let frame = compositor(media()).render(&timeline, 0.0, &CancelToken::new()).unwrap();
        // Half-size image centred one pixel up-left of centre covers (0..2, 0..2)
        assert_eq!(frame.image.pixel(0, 0), Some([200, 0, 0, 255]));
        assert_eq!(frame.image.pixel(1, 1), Some([200, 0, 0, 255]));
        assert_eq!(frame.image.pixel(3, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_effect_chain_runs_on_clip() {
        let mut c = clip("red", 0.0, 5.0);
        c.effects.push(Effect::new("invert"));
        let timeline = single_track(vec![c]);
        let frame = compositor(media()).render(&timeline, 0.0, &CancelToken::new()).unwrap();
        assert_eq!(frame.image.pixel(1, 1), Some([55, 255, 255, 255]));
    }

    #[test]
    fn test_effect_track_adjusts_composite() {
        let video = Track::new_video("V1");
        let adjust = Track::new("FX", TrackKind::Effect);
        let (vid, fid) = (video.id, adjust.id);
        let mut base = clip("red", 0.0, 5.0);
        base.track_id = vid;
        let mut fx = clip("blue", 1.0, 1.0);
        fx.track_id = fid;
        fx.effects.push(Effect::new("brightness").with_param("amount", ParamValue::Float(0.2)));
        let timeline = Timeline::with_tracks(vec![video, adjust])
            .unwrap()
            .apply(&Operation::Batch {
                ops: vec![Operation::AddClip { clip: base }, Operation::AddClip { clip: fx }],
            })
            .unwrap();
        let comp = compositor(media());
        let inside = comp.render(&timeline, 1.5, &CancelToken::new()).unwrap();
        assert_eq!(inside.image.pixel(0, 0), Some([251, 51, 51, 255]));
        let outside = comp.render(&timeline, 3.0, &CancelToken::new()).unwrap();
        assert_eq!(outside.image.pixel(0, 0), Some([200, 0, 0, 255]));
    }

    #[test]
    fn test_hidden_track_contributes_nothing() {
        let mut timeline = single_track(vec![clip("red", 0.0, 5.0)]);
        timeline.tracks[0].visible = false;
        let frame = compositor(media()).render(&timeline, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(frame.image.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_dissolve_window_blends_neighbours() {
        let a = clip("red", 0.0, 5.0);
        let mut c = clip("blue", 5.0, 3.0);
        c.transition_in = Some(Transition::dissolve(1.0));
        let timeline = single_track(vec![a, c]);
        let comp = compositor(media());
        let mid = comp.render(&timeline, 5.5, &CancelToken::new()).unwrap();
        assert_eq!(mid.image.pixel(0, 0), Some([100, 0, 100, 255]));
        let after = comp.render(&timeline, 6.5, &CancelToken::new()).unwrap();
        assert_eq!(after.image.pixel(0, 0), Some([0, 0, 200, 255]));
    }

    #[test]
    fn test_missing_asset_uses_placeholder_in_preview() {
        let timeline = single_track(vec![clip("ghost", 0.0, 5.0)]);
        let frame = compositor(media()).render(&timeline, 1.0, &CancelToken::new()).unwrap();
        assert_eq!(frame.image, FrameBuffer::test_pattern(W, H));
    }

    #[test]
    fn test_fail_policy_propagates_decode_error() {
        let media = media();
        media.fail_decode(&AssetId::new("red"), TimeRange::new(1.0, 0.1));
        let timeline = single_track(vec![clip("red", 0.0, 5.0)]);
        let comp = compositor(media).with_policy(MediaErrorPolicy::Fail);
        let err = comp.render(&timeline, 1.0, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, FrameCutError::DecodeFailure { .. }));
    }

    #[test]
    fn test_cancelled_render() {
        let timeline = single_track(vec![clip("red", 0.0, 5.0)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = compositor(media()).render(&timeline, 1.0, &cancel).unwrap_err();
        assert!(matches!(err, FrameCutError::Cancelled));
    }

    #[test]
    fn test_audio_volume_and_mute() {
        let mut c = clip("tone", 0.0, 5.0);
        c.volume = 0.5;
        let mut timeline = single_track(vec![c]);
        let comp = compositor(media());
        // 75 Hz at 300 Hz: second sample is the crest
        let frame = comp.render(&timeline, 0.0, &CancelToken::new()).unwrap();
        assert!((frame.audio.samples[1] - 0.25).abs() < 1e-4);

        timeline.tracks[0].muted = true;
        let frame = comp.render(&timeline, 0.0, &CancelToken::new()).unwrap();
        assert!(frame.audio.is_silent());
    }

    #[test]
    fn test_audio_block_starting_mid_clip_gap() {
        // Clip starts 5 samples into the block
        let timeline = single_track(vec![clip("tone", 1.0 / 60.0, 1.0)]);
        let frame = compositor(media()).render(&timeline, 0.0, &CancelToken::new()).unwrap();
        assert!(frame.audio.samples[..5].iter().all(|s| *s == 0.0));
        assert!(frame.audio.samples[5..].iter().any(|s| *s != 0.0));
    }

    fn loud_on_two_tracks(volumes: [f64; 2]) -> Timeline {
        let tracks = vec![Track::new_audio("A1"), Track::new_audio("A2")];
        let ids: Vec<_> = tracks.iter().map(|t| t.id).collect();
        let mut timeline = Timeline::with_tracks(tracks).unwrap();
        for (track_id, volume) in ids.into_iter().zip(volumes) {
            let mut c = clip("loud", 0.0, 5.0);
            c.track_id = track_id;
            c.volume = volume;
            timeline = timeline.apply(&Operation::AddClip { clip: c }).unwrap();
        }
        timeline
    }

    #[test]
    fn test_audio_clips_sum_without_clamping() {
        let timeline = loud_on_two_tracks([1.0, 0.5]);
        let frame = compositor(media()).render(&timeline, 0.0, &CancelToken::new()).unwrap();
        // Crest of a full-scale tone at 1.0 plus the same at 0.5
        assert!((frame.audio.samples[1] - 1.5).abs() < 1e-4);
        assert!((frame.audio.samples[3] + 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_limiter_is_opt_in() {
        let timeline = loud_on_two_tracks([1.0, 0.5]);
        let limited = Compositor::new(
            CompositorConfig {
                limiter: true,
                ..config()
            },
            media(),
        );
        let frame = limited.render(&timeline, 0.0, &CancelToken::new()).unwrap();
        let peak = frame.audio.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.95 + 1e-6);
    }
}
