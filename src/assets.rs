//! Asset provider boundary.
//!
//! Components never load files themselves. They ask an [`AssetProvider`] for
//! an immutable asset by id and hand it back when they are done. A failed
//! load is an absent result, and the caller decides whether to run degraded
//! or refuse to start.
//!
//! [`ContentCache`] is the stock provider: it fetches from an
//! [`AssetSource`] on first use, shares the result behind an `Arc` and keeps
//! a reference count per id so the asset is dropped when its last user
//! unloads it.
//!
//! ```ignore
//! let mut cache = ContentCache::new(JsonDirectory::new("assets/particles"));
//! let smoke: Option<Arc<ParticleSettings>> = cache.load("smoke");
//! ```

use crate::error::AssetError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Something that can produce an asset of type `T` from an id.
pub trait AssetSource<T> {
    /// Fetch a fresh copy of the asset.
    fn fetch(&self, id: &str) -> Result<T, AssetError>;
}

/// Hands out shared, immutable assets by id.
pub trait AssetProvider<T> {
    /// Get the asset, or `None` if it cannot be loaded.
    fn load(&mut self, id: &str) -> Option<Arc<T>>;

    /// Release one use of the asset.
    fn unload(&mut self, id: &str);
}

/// Reads `<root>/<id>.json` and deserializes it.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    root: PathBuf,
}

impl JsonDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path an id resolves to.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

impl<T: DeserializeOwned> AssetSource<T> for JsonDirectory {
    fn fetch(&self, id: &str) -> Result<T, AssetError> {
        let path = self.path_for(id);
        let json = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(id.to_string())
            } else {
                AssetError::Io {
                    id: id.to_string(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&json).map_err(|source| AssetError::Parse {
            id: id.to_string(),
            source,
        })
    }
}

/// Assets registered in memory. Useful for built-in presets and tests.
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    assets: HashMap<String, T>,
}

impl<T> Default for MemorySource<T> {
    fn default() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }
}

impl<T: Clone> MemorySource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset under `id`, replacing any previous one.
    pub fn insert(&mut self, id: impl Into<String>, asset: T) -> &mut Self {
        self.assets.insert(id.into(), asset);
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, id: impl Into<String>, asset: T) -> Self {
        self.insert(id, asset);
        self
    }
}

impl<T: Clone> AssetSource<T> for MemorySource<T> {
    fn fetch(&self, id: &str) -> Result<T, AssetError> {
        self.assets
            .get(id)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(id.to_string()))
    }
}

struct CacheEntry<T> {
    asset: Arc<T>,
    refs: usize,
}

/// Reference-counted asset cache.
pub struct ContentCache<T, S> {
    source: S,
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T, S: AssetSource<T>> ContentCache<T, S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: HashMap::new(),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether `id` is currently held in the cache.
    pub fn is_cached(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Outstanding loads of `id`.
    pub fn ref_count(&self, id: &str) -> usize {
        self.entries.get(id).map_or(0, |e| e.refs)
    }

    /// Number of distinct cached assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached asset regardless of reference counts.
    pub fn clear(&mut self) {
        log::debug!("Clearing {} cached assets", self.entries.len());
        self.entries.clear();
    }
}

impl<T, S: AssetSource<T>> AssetProvider<T> for ContentCache<T, S> {
    fn load(&mut self, id: &str) -> Option<Arc<T>> {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.refs += 1;
            log::debug!("Asset [{id}] served from cache ({} refs)", entry.refs);
            return Some(Arc::clone(&entry.asset));
        }

        match self.source.fetch(id) {
            Ok(asset) => {
                let asset = Arc::new(asset);
                self.entries.insert(
                    id.to_string(),
                    CacheEntry {
                        asset: Arc::clone(&asset),
                        refs: 1,
                    },
                );
                log::debug!("Asset [{id}] loaded");
                Some(asset)
            }
            Err(e) => {
                log::error!("Unable to load asset [{id}]: {e}");
                None
            }
        }
    }

    fn unload(&mut self, id: &str) {
        let Some(entry) = self.entries.get_mut(id) else {
            log::warn!("Asset [{id}] unloaded but was never loaded");
            return;
        };

        entry.refs -= 1;
        if entry.refs == 0 {
            self.entries.remove(id);
            log::debug!("Asset [{id}] evicted");
        }
    }
}
