//! Deterministic in-memory media source.
//!
//! Each asset is a solid color or color-bar image plus an optional sine
//! tone. Failures can be injected per asset to exercise the placeholder and
//! export-failure paths.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use framecut_audio::Waveform;
use framecut_core::{AssetId, Color, FrameBuffer, FrameCutError, Result, TimeRange, TIME_EPSILON};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::{AssetInfo, MediaSource};

/// Sample rate peaks are computed at.
pub const PEAK_SAMPLE_RATE: u32 = 8_000;
/// Source samples per peak bucket.
pub const PEAK_BUCKET_SIZE: usize = 256;

/// Image content of a pattern asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Solid(Color),
    ColorBars,
}

/// Definition of one synthetic asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAsset {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub pattern: PatternKind,
    /// Sine frequency in Hz; `None` for a silent asset.
    pub tone_hz: Option<f32>,
    pub amplitude: f32,
}

impl PatternAsset {
    pub fn solid(duration: f64, width: u32, height: u32, color: Color) -> Self {
        Self {
            duration,
            width,
            height,
            pattern: PatternKind::Solid(color),
            tone_hz: None,
            amplitude: 0.5,
        }
    }

    pub fn color_bars(duration: f64, width: u32, height: u32) -> Self {
        Self {
            pattern: PatternKind::ColorBars,
            ..Self::solid(duration, width, height, Color::BLACK)
        }
    }

    pub fn with_tone(mut self, hz: f32, amplitude: f32) -> Self {
        self.tone_hz = Some(hz);
        self.amplitude = amplitude;
        self
    }

    /// A stable solid color and tone derived from the asset id, so unknown
    /// project assets still render distinguishably.
    pub fn derived(asset_id: &AssetId, duration: f64, width: u32, height: u32) -> Self {
        let hash = asset_id
            .as_str()
            .bytes()
            .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
        let [r, g, b, _] = hash.to_le_bytes();
        let tone = 220.0 + (hash % 440) as f32;
        Self::solid(duration, width, height, Color::rgb(r, g, b)).with_tone(tone, 0.25)
    }

    fn sample(&self, t: f64) -> f32 {
        match self.tone_hz {
            Some(hz) if t >= 0.0 && t < self.duration => {
                self.amplitude * (TAU * hz * t as f32).sin()
            }
            _ => 0.0,
        }
    }
}

#[derive(Default)]
struct Failures {
    unavailable: HashMap<AssetId, String>,
    decode: HashMap<AssetId, Vec<TimeRange>>,
    peaks_pending: HashSet<AssetId>,
}

/// In-memory [`MediaSource`].
#[derive(Default)]
pub struct PatternSource {
    assets: RwLock<HashMap<AssetId, PatternAsset>>,
    peaks: Mutex<HashMap<AssetId, Arc<Waveform>>>,
    failures: RwLock<Failures>,
    frames_served: AtomicUsize,
}

impl PatternSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an asset.
    pub fn insert(&self, asset_id: AssetId, asset: PatternAsset) {
        debug!(asset = %asset_id, duration = asset.duration, "pattern asset registered");
        self.peaks.lock().remove(&asset_id);
        self.assets.write().insert(asset_id, asset);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_asset(self, asset_id: impl Into<String>, asset: PatternAsset) -> Self {
        self.insert(AssetId::new(asset_id), asset);
        self
    }

    pub fn contains(&self, asset_id: &AssetId) -> bool {
        self.assets.read().contains_key(asset_id)
    }

    /// Make every request for `asset_id` fail with `AssetUnavailable`.
    pub fn set_unavailable(&self, asset_id: &AssetId, reason: impl Into<String>) {
        self.failures
            .write()
            .unavailable
            .insert(asset_id.clone(), reason.into());
    }

    /// Make frame requests with a source time inside `range` fail with
    /// `DecodeFailure`.
    pub fn fail_decode(&self, asset_id: &AssetId, range: TimeRange) {
        self.failures
            .write()
            .decode
            .entry(asset_id.clone())
            .or_default()
            .push(range);
    }

    /// Report peaks as not yet computed for `asset_id`.
    pub fn set_peaks_pending(&self, asset_id: &AssetId, pending: bool) {
        let mut failures = self.failures.write();
        if pending {
            failures.peaks_pending.insert(asset_id.clone());
        } else {
            failures.peaks_pending.remove(asset_id);
        }
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        *self.failures.write() = Failures::default();
    }

    /// Number of frames decoded successfully so far.
    pub fn frames_served(&self) -> usize {
        self.frames_served.load(Ordering::Relaxed)
    }

    fn asset(&self, asset_id: &AssetId) -> Result<PatternAsset> {
        if let Some(reason) = self.failures.read().unavailable.get(asset_id) {
            return Err(FrameCutError::AssetUnavailable {
                asset_id: asset_id.clone(),
                reason: reason.clone(),
            });
        }
        self.assets
            .read()
            .get(asset_id)
            .cloned()
            .ok_or_else(|| FrameCutError::AssetUnavailable {
                asset_id: asset_id.clone(),
                reason: "unknown asset".into(),
            })
    }
}

impl MediaSource for PatternSource {
    fn info(&self, asset_id: &AssetId) -> Option<AssetInfo> {
        self.assets.read().get(asset_id).map(|a| AssetInfo {
            asset_id: asset_id.clone(),
            duration: a.duration,
            width: a.width,
            height: a.height,
            has_audio: a.tone_hz.is_some(),
        })
    }

    fn frame(&self, asset_id: &AssetId, source_time: f64) -> Result<FrameBuffer> {
        let asset = self.asset(asset_id)?;
        if source_time < -TIME_EPSILON || source_time > asset.duration + TIME_EPSILON {
            return Err(FrameCutError::DecodeFailure {
                timestamp: source_time,
                reason: format!("{asset_id} has no frame at {source_time:.3}s"),
            });
        }
        let injected = self
            .failures
            .read()
            .decode
            .get(asset_id)
            .is_some_and(|ranges| ranges.iter().any(|r| r.contains(source_time)));
        if injected {
            return Err(FrameCutError::DecodeFailure {
                timestamp: source_time,
                reason: format!("corrupt packet in {asset_id}"),
            });
        }

        self.frames_served.fetch_add(1, Ordering::Relaxed);
        Ok(match asset.pattern {
            PatternKind::Solid(color) => FrameBuffer::solid(asset.width, asset.height, color),
            PatternKind::ColorBars => FrameBuffer::test_pattern(asset.width, asset.height),
        })
    }

    fn audio(
        &self,
        asset_id: &AssetId,
        source_start: f64,
        frame_count: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>> {
        let asset = self.asset(asset_id)?;
        let channels = channels.max(1) as usize;
        let rate = sample_rate.max(1) as f64;
        let mut out = vec![0.0f32; frame_count * channels];
        if asset.tone_hz.is_none() {
            return Ok(out);
        }
        for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
            let s = asset.sample(source_start + i as f64 / rate);
            frame.fill(s);
        }
        Ok(out)
    }

    fn peaks(&self, asset_id: &AssetId) -> Result<Arc<Waveform>> {
        let asset = self.asset(asset_id)?;
        if self.failures.read().peaks_pending.contains(asset_id) {
            return Err(FrameCutError::AssetUnavailable {
                asset_id: asset_id.clone(),
                reason: "peaks not ready".into(),
            });
        }
        let mut cache = self.peaks.lock();
        if let Some(peaks) = cache.get(asset_id) {
            return Ok(Arc::clone(peaks));
        }
        let rate = PEAK_SAMPLE_RATE as f64;
        let count = (asset.duration * rate).ceil().max(0.0) as usize;
        let mono: Vec<f32> = (0..count).map(|i| asset.sample(i as f64 / rate)).collect();
        let peaks = Arc::new(Waveform::compute(&mono, PEAK_BUCKET_SIZE, PEAK_SAMPLE_RATE));
        debug!(asset = %asset_id, buckets = peaks.data.len(), "peaks computed");
        cache.insert(asset_id.clone(), Arc::clone(&peaks));
        Ok(peaks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> PatternSource {
        PatternSource::new()
            .with_asset("red", PatternAsset::solid(5.0, 4, 2, Color::RED))
            .with_asset("tone", PatternAsset::color_bars(2.0, 8, 1).with_tone(100.0, 1.0))
    }

    #[test]
    fn test_solid_frame() {
        let src = source();
        let frame = src.frame(&AssetId::new("red"), 1.0).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixel(3, 1), Some(Color::RED.to_array()));
        assert_eq!(src.frames_served(), 1);
    }

    #[test]
    fn test_unknown_asset_is_unavailable() {
        let err = source().frame(&AssetId::new("missing"), 0.0).unwrap_err();
        assert!(matches!(err, FrameCutError::AssetUnavailable { .. }));
    }

    #[test]
    fn test_out_of_range_time_fails() {
        let err = source().frame(&AssetId::new("red"), 6.0).unwrap_err();
        assert!(matches!(err, FrameCutError::DecodeFailure { .. }));
    }

    #[test]
    fn test_injected_decode_failure() {
        let src = source();
        let red = AssetId::new("red");
        src.fail_decode(&red, TimeRange::new(2.0, 0.5));
        assert!(src.frame(&red, 1.9).is_ok());
        assert!(matches!(
            src.frame(&red, 2.2),
            Err(FrameCutError::DecodeFailure { .. })
        ));
        src.clear_failures();
        assert!(src.frame(&red, 2.2).is_ok());
    }

    #[test]
    fn test_audio_tone_and_tail_silence() {
        let src = source();
        // 100 Hz at 400 Hz sample rate: quarter period per sample
        let samples = src.audio(&AssetId::new("tone"), 0.0, 4, 400, 2).unwrap();
        assert_eq!(samples.len(), 8);
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[2] - 1.0).abs() < 1e-4);
        assert_eq!(samples[2], samples[3]);

        let tail = src.audio(&AssetId::new("tone"), 2.5, 4, 400, 1).unwrap();
        assert!(tail.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_peaks_cached_and_pending() {
        let src = source();
        let tone = AssetId::new("tone");
        let first = src.peaks(&tone).unwrap();
        let second = src.peaks(&tone).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.peak_between(0.0, 2.0) > 0.9);

        src.set_peaks_pending(&tone, true);
        assert!(src.peaks(&tone).is_err());
    }

    #[test]
    fn test_derived_is_stable() {
        let id = AssetId::new("clips/a.mov");
        assert_eq!(
            PatternAsset::derived(&id, 3.0, 2, 2),
            PatternAsset::derived(&id, 3.0, 2, 2)
        );
    }
}
