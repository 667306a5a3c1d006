//! Process-wide cache of decoded shape images.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dotfield_core::AnimationError;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// Decoded images keyed by source identifier (a file path, or any name
/// registered with [`ImageCache::insert`]).
///
/// Clones share one store. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    images: Arc<RwLock<HashMap<String, Arc<RgbaImage>>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already decoded image under `source`, replacing any
    /// previous entry.
    pub fn insert(&self, source: impl Into<String>, image: DynamicImage) {
        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.into(), Arc::new(image.into_rgba8()));
    }

    pub fn get(&self, source: &str) -> Option<Arc<RgbaImage>> {
        self.images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.get(source).is_some()
    }

    pub fn len(&self) -> usize {
        self.images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached image for `source`, decoding it from disk on the
    /// first request.
    ///
    /// Read and decode failures are `AssetLoadFailure`s and are not cached,
    /// so a later request retries.
    pub fn load(&self, source: &str) -> Result<Arc<RgbaImage>, AnimationError> {
        if let Some(image) = self.get(source) {
            debug!(source, "image cache hit");
            return Ok(image);
        }
        debug!(source, "image cache miss, decoding");
        let decoded = image::open(source)
            .map_err(|e| AnimationError::asset(source, e))?
            .into_rgba8();
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(AnimationError::asset(source, "image has no pixels"));
        }
        let decoded = Arc::new(decoded);
        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(source.to_string())
            .or_insert_with(|| Arc::clone(&decoded));
        Ok(decoded)
    }
}
