//! Process-lifetime cache of decoded audio, keyed by source path.
//!
//! Entries are never evicted. A failed load leaves no entry, so the next
//! request for the same path simply tries again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crate::audio_engine::errors::SampleLoadError;
use crate::audio_engine::sample_loader::load_audio_file;
use crate::messages::DecodedAudio;

#[derive(Debug, Clone)]
pub struct BufferCache {
    asset_root: PathBuf,
    entries: Arc<RwLock<HashMap<String, DecodedAudio>>>,
}

impl BufferCache {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Returns the decoded audio for `path`, if a load has completed.
    pub fn get(&self, path: &str) -> Option<DecodedAudio> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `audio` under `path` unless an entry already exists.
    ///
    /// Returns `true` if this call created the entry.
    pub fn insert(&self, path: &str, audio: DecodedAudio) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(path) {
            return false;
        }
        entries.insert(path.to_string(), audio);
        true
    }

    /// Starts a background load of `path` unless it is already cached.
    ///
    /// Failures are logged and leave no entry. The returned handle may be joined
    /// by callers that need to wait; dropping it detaches the load.
    pub fn ensure_loaded(&self, path: &str) -> Option<JoinHandle<()>> {
        if self.contains(path) {
            return None;
        }

        let cache = self.clone();
        let path = path.to_string();
        let handle = thread::spawn(move || match cache.load_blocking(&path) {
            Ok(true) => log::debug!("Cached {path}"),
            Ok(false) => {}
            Err(err) => log::warn!("Failed to load {path}, using fallback tone: {err}"),
        });

        Some(handle)
    }

    /// Reads and decodes `path` on the calling thread.
    ///
    /// Returns `Ok(false)` if another load stored the entry first.
    pub fn load_blocking(&self, path: &str) -> Result<bool, SampleLoadError> {
        if self.contains(path) {
            return Ok(false);
        }

        let audio = load_audio_file(&self.resolve(path))?;
        log::debug!(
            "Decoded {path} ({} ch@{} Hz, {:.2}s)",
            audio.channels,
            audio.sample_rate,
            audio.duration_sec()
        );
        Ok(self.insert(path, audio))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.asset_root.join(path)
    }
}
