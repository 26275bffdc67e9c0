//! The ranking strategy contract and the pieces every strategy shares

use courserec_core::{Catalog, CourseId, FeatureStore, RankingConfig, Result};
use ahash::AHashSet;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Reverse;
use tracing::warn;

/// Liked course(s) a recommendation was matched against. Never more than two.
pub type Provenance = SmallVec<[CourseId; 2]>;

/// Per-request overrides for strategy tunables
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendParams {
    /// MMR relevance/diversity trade-off, `0 < lambda <= 1`
    pub lambda: Option<f32>,
    /// MMR candidate pool size before clamping
    pub pool_size: Option<usize>,
    /// Seed for strategies that shuffle; fresh entropy when unset
    pub seed: Option<u64>,
}

/// Read-only state a strategy ranks against
#[derive(Clone, Copy)]
pub struct RankContext<'a> {
    pub catalog: &'a Catalog,
    pub features: &'a FeatureStore,
    pub config: &'a RankingConfig,
}

/// Resolved request as seen by a strategy
#[derive(Debug, Clone, Copy)]
pub struct RankQuery<'a> {
    pub liked: &'a [CourseId],
    pub disliked: &'a [CourseId],
    /// Never returned, whatever the score
    pub excluded: &'a AHashSet<CourseId>,
    pub count: usize,
    pub params: &'a RecommendParams,
}

/// A scored candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub id: CourseId,
    pub score: f32,
    /// Hard-rejected candidates carry score 0 and sort after everything else
    pub rejected: bool,
    pub provenance: Provenance,
}

impl Ranked {
    #[inline]
    pub fn new(id: CourseId, score: f32) -> Self {
        Self {
            id,
            score,
            rejected: false,
            provenance: Provenance::new(),
        }
    }

    #[inline]
    pub fn rejected(id: CourseId) -> Self {
        Self {
            id,
            score: 0.0,
            rejected: true,
            provenance: Provenance::new(),
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

/// A named ranking algorithm.
///
/// Implementations score candidates in [`score`](Self::score); the provided
/// [`rank`](Self::rank) sorts, applies the exclusion set and truncates.
pub trait RankingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score every eligible candidate, in catalog id order
    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>>;

    /// Fill in provenance for the final, truncated list. The default picks the
    /// liked course with the most similar embedding.
    fn explain(&self, ranked: &mut [Ranked], query: &RankQuery<'_>, ctx: &RankContext<'_>) {
        for item in ranked.iter_mut().filter(|r| r.provenance.is_empty()) {
            if let Some(best) = nearest_liked(item.id, query.liked, ctx.features) {
                item.provenance.push(best);
            }
        }
    }

    fn rank(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        if query.liked.is_empty() || query.count == 0 {
            return Ok(Vec::new());
        }
        let mut ranked = finalize(self.score(query, ctx)?, query.excluded, query.count);
        self.explain(&mut ranked, query, ctx);
        Ok(ranked)
    }
}

/// Stable sort (accepted before rejected, then score descending), drop
/// excluded ids, keep at most `count`
pub fn finalize(mut scored: Vec<Ranked>, excluded: &AHashSet<CourseId>, count: usize) -> Vec<Ranked> {
    scored.sort_by_key(|r| (r.rejected, Reverse(OrderedFloat(r.score))));
    scored.retain(|r| !excluded.contains(&r.id));
    scored.truncate(count);
    scored
}

/// Liked course whose embedding is most similar to `id`
pub fn nearest_liked(id: CourseId, liked: &[CourseId], features: &FeatureStore) -> Option<CourseId> {
    let mut best: Option<(CourseId, f32)> = None;
    for &l in liked {
        if let Some(sim) = features.cosine(id, l) {
            if best.map(|(_, b)| sim > b).unwrap_or(true) {
                best = Some((l, sim));
            }
        }
    }
    best.map(|(l, _)| l)
}

/// Liked or disliked ids that have a usable embedding, with their vectors
pub(crate) fn usable_embeddings<'a>(
    ids: &[CourseId],
    features: &'a FeatureStore,
    role: &str,
) -> Vec<(CourseId, &'a [f32])> {
    ids.iter()
        .filter_map(|&id| {
            if !features.is_usable(id) {
                warn!("Ignoring {} course {} with degenerate embedding", role, id);
                return None;
            }
            features.embedding_of(id).map(|v| (id, v))
        })
        .collect()
}
