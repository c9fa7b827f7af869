//! The media source provider trait.

use std::sync::Arc;

use framecut_audio::Waveform;
use framecut_core::{AssetId, FrameBuffer, Result};
use serde::{Deserialize, Serialize};

/// Basic facts about an asset, as reported by its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub asset_id: AssetId,
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

/// Supplies decoded media for assets referenced by clips.
///
/// Implementations are shared between the preview path and export jobs, so
/// every method takes `&self` and must be callable from any thread.
pub trait MediaSource: Send + Sync {
    /// Metadata for an asset, `None` if unknown.
    fn info(&self, asset_id: &AssetId) -> Option<AssetInfo>;

    /// Decode the frame shown at `source_time` seconds into the asset.
    ///
    /// Errors with `AssetUnavailable` when the asset cannot be served at all
    /// and `DecodeFailure` when this particular frame failed.
    fn frame(&self, asset_id: &AssetId, source_time: f64) -> Result<FrameBuffer>;

    /// Decode `frame_count` interleaved audio frames starting at
    /// `source_start`, resampled to `sample_rate` and `channels`.
    ///
    /// Frames past the end of the asset are silent.
    fn audio(
        &self,
        asset_id: &AssetId,
        source_start: f64,
        frame_count: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>>;

    /// Precomputed peak array for the whole asset.
    fn peaks(&self, asset_id: &AssetId) -> Result<Arc<Waveform>>;
}

impl<T: MediaSource + ?Sized> MediaSource for Arc<T> {
    fn info(&self, asset_id: &AssetId) -> Option<AssetInfo> {
        (**self).info(asset_id)
    }

    fn frame(&self, asset_id: &AssetId, source_time: f64) -> Result<FrameBuffer> {
        (**self).frame(asset_id, source_time)
    }

    fn audio(
        &self,
        asset_id: &AssetId,
        source_start: f64,
        frame_count: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>> {
        (**self).audio(asset_id, source_start, frame_count, sample_rate, channels)
    }

    fn peaks(&self, asset_id: &AssetId) -> Result<Arc<Waveform>> {
        (**self).peaks(asset_id)
    }
}
