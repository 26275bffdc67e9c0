//! Similarity functions over embedding vectors
//!
//! Pure functions shared by every ranking strategy. Anything that can hit a
//! zero-length vector returns `Option` so callers decide how to skip it.

use courserec_core::simd::{add_scaled, dot_product_simd, l2_distance_simd, norm_simd};

/// Cosine similarity in `[-1, 1]`
///
/// # Returns
/// `None` if the lengths differ or either vector has zero norm
#[inline]
pub fn cosine(u: &[f32], v: &[f32]) -> Option<f32> {
    if u.len() != v.len() {
        return None;
    }
    cosine_with_norms(u, norm_simd(u), v, norm_simd(v))
}

/// Cosine similarity with precomputed norms
#[inline]
pub fn cosine_with_norms(u: &[f32], norm_u: f32, v: &[f32], norm_v: f32) -> Option<f32> {
    if norm_u <= f32::EPSILON || norm_v <= f32::EPSILON {
        return None;
    }
    Some((dot_product_simd(u, v) / (norm_u * norm_v)).clamp(-1.0, 1.0))
}

/// `1 / (1 + ‖u - v‖)`, in `(0, 1]`
#[inline]
pub fn inverse_euclidean(u: &[f32], v: &[f32]) -> f32 {
    1.0 / (1.0 + l2_distance_simd(u, v))
}

/// Element-wise mean of the given vectors
///
/// # Returns
/// `None` for an empty set or vectors of differing length
pub fn centroid(vectors: &[&[f32]]) -> Option<Vec<f32>> {
    let dim = vectors.first()?.len();
    let mut acc = vec![0.0f32; dim];
    let scale = 1.0 / vectors.len() as f32;
    for v in vectors {
        if v.len() != dim {
            return None;
        }
        add_scaled(&mut acc, v, scale);
    }
    Some(acc)
}

/// `centroid(liked) - weight * centroid(disliked)`, or just the liked centroid
/// when nothing is disliked
pub fn aggregate_target(liked: &[&[f32]], disliked: &[&[f32]], dislike_weight: f32) -> Option<Vec<f32>> {
    let mut target = centroid(liked)?;
    if let Some(penalty) = centroid(disliked) {
        if penalty.len() != target.len() {
            return None;
        }
        add_scaled(&mut target, &penalty, -dislike_weight);
    }
    Some(target)
}

/// Highest cosine similarity between `candidate` and any reference vector.
///
/// # Returns
/// `(index, similarity)` of the best reference, or `None` when no reference
/// is comparable. Ties keep the earliest reference.
pub fn pairwise_max_similarity(candidate: &[f32], references: &[&[f32]]) -> Option<(usize, f32)> {
    let norm_c = norm_simd(candidate);
    let mut best: Option<(usize, f32)> = None;
    for (i, r) in references.iter().enumerate() {
        if r.len() != candidate.len() {
            continue;
        }
        if let Some(sim) = cosine_with_norms(candidate, norm_c, r, norm_simd(r)) {
            if best.map(|(_, b)| sim > b).unwrap_or(true) {
                best = Some((i, sim));
            }
        }
    }
    best
}

/// True if `candidate` is at least `threshold` similar to any disliked vector
pub fn hard_reject(candidate: &[f32], disliked: &[&[f32]], threshold: f32) -> bool {
    let norm_c = norm_simd(candidate);
    disliked.iter().any(|d| {
        d.len() == candidate.len()
            && cosine_with_norms(candidate, norm_c, d, norm_simd(d))
                .map(|sim| sim >= threshold)
                .unwrap_or(false)
    })
}
