//! Peak arrays the track view can draw right now.

use std::collections::HashMap;
use std::sync::Arc;

use framecut_audio::Waveform;
use framecut_core::AssetId;
use parking_lot::RwLock;

/// Waveforms delivered by the media source, keyed by asset.
///
/// The renderer only ever `try_read`s this; a contended or missing entry is
/// skipped for the tick and picked up on a later one.
#[derive(Debug, Default)]
pub struct PeakStore {
    peaks: RwLock<HashMap<AssetId, Arc<Waveform>>>,
}

impl PeakStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, asset_id: AssetId, waveform: Arc<Waveform>) {
        self.peaks.write().insert(asset_id, waveform);
    }

    pub fn contains(&self, asset_id: &AssetId) -> bool {
        self.peaks.read().contains_key(asset_id)
    }

    pub fn len(&self) -> usize {
        self.peaks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking lookup. `None` if absent or the store is being written.
    pub fn try_get(&self, asset_id: &AssetId) -> Option<Arc<Waveform>> {
        self.peaks.try_read()?.get(asset_id).cloned()
    }
}
