//! # Related-note search
//!
//! Embed a query and rank the cached note embeddings against it.

use std::error::Error;
use std::path::Path;
use tracing::{debug, info};

use crate::cache::load_cache;
use crate::embeddings::Embedder;
use crate::similarity::{SimilarityResult, rank};

/// Result limit used when the caller has no preference.
pub const DEFAULT_COUNT: usize = 10;

/// Similarity floor used when the caller has no preference. Exclusive.
pub const DEFAULT_THRESHOLD: f32 = 0.75;

/// Find up to `count` cached notes whose similarity to `query` is above `threshold`.
///
/// The cache is re-read from `cache_path` on every call. Results are sorted by
/// score, highest first; equal scores keep the cache's key order.
///
/// # Errors
/// - `query` is blank.
/// - The embedding request fails.
/// - The query embedding is empty or all zeros
///   ([`SimilarityError::ZeroMagnitude`](crate::similarity::SimilarityError)).
pub async fn find_related<E: Embedder>(
    embedder: &E,
    cache_path: &Path,
    query: &str,
    count: usize,
    threshold: f32,
) -> Result<Vec<SimilarityResult>, Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("query must not be empty".into());
    }

    let cache = load_cache(cache_path);
    if cache.is_empty() {
        info!(
            "Embedding cache {} is empty, run `muse index` first",
            cache_path.display()
        );
    }

    let query_embedding = embedder.embed(query).await?;
    let results = rank(&query_embedding, &cache, count, threshold)?;
    debug!(
        "{} of {} cached notes matched above {threshold}",
        results.len(),
        cache.len()
    );
    Ok(results)
}
