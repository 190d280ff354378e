//! # Index builder
//!
//! Brings the embedding cache up to date with the note store.
//!
//! For each scanned note (store order, at most `max_notes`):
//!
//! 1. Notes whose filtered body is shorter than [`MIN_BODY_LEN`] lose any cache
//!    entry they had.
//! 2. Notes already in the cache are left alone (see [`StalePolicy`]).
//! 3. Everything else is embedded, one request at a time.
//!
//! The cache file is written once, after the loop. If any request fails the run
//! aborts before that write, so the file still holds the previous run's state and
//! this run's embeddings are lost.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, EmbeddingCache, load_cache, save_cache};
use crate::embeddings::Embedder;
use crate::notes::{MIN_BODY_LEN, NoteStore};

/// What to do with a note that already has a cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Never re-embed a cached note, even if it was edited.
    #[default]
    Keep,
    /// Re-embed when the note text no longer matches the stored hash.
    Rehash,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Upper bound on notes scanned this run.
    pub max_notes: usize,
    pub policy: StalePolicy,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_notes: usize::MAX,
            policy: StalePolicy::Keep,
            progress: false,
        }
    }
}

/// Counts from one index run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub scanned: usize,
    /// Notes sent to the embedding API.
    pub embedded: usize,
    /// Notes skipped because they were already cached.
    pub cached: usize,
    /// Too-short notes whose old entry was removed.
    pub purged: usize,
    /// Too-short notes, purged or not.
    pub too_short: usize,
}

/// Load the cache at `cache_path`, index `store` into it and write it back.
///
/// # Errors
/// Note store I/O errors, embedding failures and cache write failures. On error the
/// cache file is not touched.
pub async fn update_index<E: Embedder>(
    store: &NoteStore,
    embedder: &E,
    cache_path: &Path,
    options: &IndexOptions,
) -> Result<IndexReport, Box<dyn Error>> {
    let mut cache = load_cache(cache_path);
    info!(
        "Loaded {} cached embeddings from {}",
        cache.len(),
        cache_path.display()
    );

    let report = index_notes(store, embedder, &mut cache, options).await?;

    save_cache(cache_path, &cache)?;
    info!(
        "Index updated: {} scanned, {} embedded, {} purged, {} entries total",
        report.scanned,
        report.embedded,
        report.purged,
        cache.len()
    );
    Ok(report)
}

/// The in-memory half of [`update_index`]: mutate `cache`, do not persist.
pub async fn index_notes<E: Embedder>(
    store: &NoteStore,
    embedder: &E,
    cache: &mut EmbeddingCache,
    options: &IndexOptions,
) -> Result<IndexReport, Box<dyn Error>> {
    let keys: Vec<String> = store
        .list_keys()?
        .into_iter()
        .take(options.max_notes)
        .collect();

    let progress = if options.progress {
        let bar = ProgressBar::new(keys.len() as u64);
        bar.set_style(ProgressStyle::with_template(
            "{spinner} [{bar:40}] {pos}/{len} {msg}",
        )?);
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut report = IndexReport::default();

    // One request in flight at a time; the API is billed and rate limited.
    for key in keys {
        report.scanned += 1;
        progress.set_message(key.clone());

        let note = store.read(&key)?;
        if note.is_trivial() {
            warn!(
                "Note {key} is shorter than {MIN_BODY_LEN} UTF-16 units, skipping"
            );
            report.too_short += 1;
            if cache.remove(&key).is_some() {
                report.purged += 1;
            }
            progress.inc(1);
            continue;
        }

        let text = note.embedding_text();
        let hash = sha256::digest(text.as_str());

        if let Some(entry) = cache.get(&key) {
            let fresh = match options.policy {
                StalePolicy::Keep => true,
                StalePolicy::Rehash => entry.content_hash.as_deref() == Some(hash.as_str()),
            };
            if fresh {
                debug!("Note {key} already embedded");
                report.cached += 1;
                progress.inc(1);
                continue;
            }
            debug!("Note {key} changed since it was embedded");
        }

        let embedding = embedder.embed(&text).await?;
        cache.insert(key, CacheEntry::new(embedding, Some(hash)));
        report.embedded += 1;
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(report)
}
