//! # Similarity
//!
//! Cosine similarity and top-K ranking over cached note embeddings.
//!
//! Unlike the rest of the crate, which propagates `Box<dyn Error>`, this module
//! returns a typed [`SimilarityError`] so callers can decide per entry whether a
//! failure is fatal (a broken query vector) or skippable (one bad cache entry).
//!
//! ```rust
//! use subtext_muse::similarity::cosine_similarity;
//!
//! let s = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
//! assert!((s - 1.0).abs() < 1e-6);
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::cache::EmbeddingCache;

/// Errors raised while comparing two embedding vectors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// The vectors come from models with different output sizes.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// One side has zero L2 norm (this includes empty vectors).
    #[error("cannot compare a zero-magnitude vector")]
    ZeroMagnitude,

    /// A component is infinite or NaN, so the norm or the score is not a number.
    #[error("vector contains non-finite values")]
    NonFinite,
}

/// Cosine similarity `Σ aᵢbᵢ / (‖a‖ ‖b‖)`, in `[-1, 1]`.
///
/// Sums run in `f64`, so components near `f32::MAX` do not overflow to NaN.
///
/// # Errors
/// - [`SimilarityError::DimensionMismatch`] when `a.len() != b.len()`.
/// - [`SimilarityError::ZeroMagnitude`] when either norm is zero.
/// - [`SimilarityError::NonFinite`] when either vector holds an infinity or NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let magnitude_a = checked_magnitude(a)?;
    let magnitude_b = checked_magnitude(b)?;

    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let score = (dot / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0);
    if !score.is_finite() {
        return Err(SimilarityError::NonFinite);
    }
    Ok(score as f32)
}

/// L2 norm of `v`, accumulated in `f64`.
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

fn checked_magnitude(v: &[f32]) -> Result<f64, SimilarityError> {
    let m = magnitude(v);
    if !m.is_finite() {
        return Err(SimilarityError::NonFinite);
    }
    if m == 0.0 {
        return Err(SimilarityError::ZeroMagnitude);
    }
    Ok(m)
}

/// One ranked hit: a note key and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub key: String,
    pub score: f32,
}

/// Rank every cache entry against `query`.
///
/// Keeps scores strictly above `threshold`, sorts descending (stable, so ties keep
/// cache order) and truncates to `count`. Entries that cannot be compared are
/// logged and skipped; a zero-magnitude or non-finite query fails the whole ranking.
pub fn rank(
    query: &[f32],
    cache: &EmbeddingCache,
    count: usize,
    threshold: f32,
) -> Result<Vec<SimilarityResult>, SimilarityError> {
    checked_magnitude(query)?;

    let mut results = Vec::new();
    for (key, entry) in cache.iter() {
        match cosine_similarity(query, &entry.embedding) {
            Ok(score) if score > threshold => results.push(SimilarityResult {
                key: key.clone(),
                score,
            }),
            Ok(_) => {}
            Err(err) => warn!("Skipping cache entry {key}: {err}"),
        }
    }

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(count);
    Ok(results)
}
