//! # Embedding cache
//!
//! The on-disk map from note key to embedding vector, stored as a single JSON object:
//!
//! ```json
//! {
//!   "on-gardening": { "embedding": [0.0123, -0.044, ...] },
//!   "slow-reading": { "embedding": [...], "content_hash": "9f86d08..." }
//! }
//! ```
//!
//! The whole file is read at the start of an operation and replaced at the end of
//! an index run. Writes go through a temporary file in the same directory which is
//! then renamed over the old cache, so an interrupted run leaves the previous cache
//! intact.
//!
//! A missing or unparsable file is treated as an empty cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// A cached embedding for one note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The vector returned by the embedding model.
    pub embedding: Vec<f32>,

    /// SHA-256 of the text that was embedded; only consulted by
    /// [`StalePolicy::Rehash`](crate::index::StalePolicy::Rehash).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl CacheEntry {
    pub fn new(embedding: Vec<f32>, content_hash: Option<String>) -> Self {
        Self {
            embedding,
            content_hash,
        }
    }
}

/// Note key → [`CacheEntry`], iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl EmbeddingCache {
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> Iter<'_, String, CacheEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the cache at `path`.
///
/// Never fails: a missing file yields an empty cache silently, an unreadable or
/// malformed one yields an empty cache with a warning.
pub fn load_cache(path: &Path) -> EmbeddingCache {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            if path.exists() {
                warn!("Could not read cache {}: {err}", path.display());
            } else {
                debug!("No cache at {}, starting empty", path.display());
            }
            return EmbeddingCache::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(cache) => cache,
        Err(err) => {
            warn!(
                "Cache {} is malformed ({err}), starting empty",
                path.display()
            );
            EmbeddingCache::default()
        }
    }
}

/// Serialize `cache` and atomically replace the file at `path`.
///
/// # Errors
/// I/O failures creating, writing or renaming the temporary file, and
/// serialization errors.
pub fn save_cache(path: &Path, cache: &EmbeddingCache) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let json = serde_json::to_string(cache)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)?;

    debug!("Wrote {} cache entries to {}", cache.len(), path.display());
    Ok(())
}
