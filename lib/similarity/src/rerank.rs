//! Maximal marginal relevance re-ranking
//!
//! Takes the relevance ranking of another strategy, cuts it to a bounded
//! candidate pool and greedily picks the candidate maximizing
//! `lambda * relevance - (1 - lambda) * max_similarity`, where the maximum
//! runs over liked courses and everything picked so far. Picked items keep
//! the wrapped strategy's relevance score; the objective only sets the order.

use crate::strategy::{finalize, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::config::{validate_lambda, MMR_POOL_MAX, MMR_POOL_MIN};
use courserec_core::{CourseId, FeatureStore, Result};
use std::sync::Arc;
use tracing::debug;

/// Relevance/diversity re-ranker on top of an embedding-based strategy
#[derive(Clone)]
pub struct MmrStrategy {
    relevance: Arc<dyn RankingStrategy>,
    lambda: Option<f32>,
}

impl std::fmt::Debug for MmrStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmrStrategy")
            .field("relevance", &self.relevance.name())
            .field("lambda", &self.lambda)
            .finish()
    }
}

impl MmrStrategy {
    pub fn new(relevance: Arc<dyn RankingStrategy>) -> Self {
        Self {
            relevance,
            lambda: None,
        }
    }

    /// Fix lambda for this instance instead of reading it from the config
    pub fn with_lambda(mut self, lambda: f32) -> Result<Self> {
        validate_lambda(lambda)?;
        self.lambda = Some(lambda);
        Ok(self)
    }

    pub fn relevance(&self) -> &dyn RankingStrategy {
        self.relevance.as_ref()
    }

    fn resolve_lambda(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<f32> {
        let lambda = query
            .params
            .lambda
            .or(self.lambda)
            .unwrap_or(ctx.config.mmr_lambda);
        validate_lambda(lambda)?;
        Ok(lambda)
    }

    fn pool_size(query: &RankQuery<'_>, ctx: &RankContext<'_>) -> usize {
        let bounded = match query.params.pool_size {
            Some(size) => size.clamp(MMR_POOL_MIN, MMR_POOL_MAX),
            None => ctx.config.clamped_pool_size(),
        };
        bounded.max(query.count)
    }
}

impl RankingStrategy for MmrStrategy {
    fn name(&self) -> &'static str {
        "mmr"
    }

    /// Plain relevance scores from the wrapped strategy
    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        self.relevance.score(query, ctx)
    }

    fn explain(&self, ranked: &mut [Ranked], query: &RankQuery<'_>, ctx: &RankContext<'_>) {
        self.relevance.explain(ranked, query, ctx);
    }

    fn rank(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let lambda = self.resolve_lambda(query, ctx)?;
        if query.liked.is_empty() || query.count == 0 {
            return Ok(Vec::new());
        }

        let pool_size = Self::pool_size(query, ctx);
        let pool = finalize(self.score(query, ctx)?, query.excluded, pool_size);
        let (accepted, rejected): (Vec<Ranked>, Vec<Ranked>) = pool.into_iter().partition(|r| !r.rejected);
        debug!(
            "MMR over {} candidates ({} rejected), lambda {}",
            accepted.len(),
            rejected.len(),
            lambda
        );

        let mut selected = select(accepted, query.liked, ctx.features, lambda, query.count);
        selected.extend(rejected.into_iter().take(query.count - selected.len()));

        self.explain(&mut selected, query, ctx);
        Ok(selected)
    }
}

/// Greedy MMR selection over `pool`, which must be in relevance order.
/// Ties keep the earlier (more relevant) candidate.
fn select(
    pool: Vec<Ranked>,
    liked: &[CourseId],
    features: &FeatureStore,
    lambda: f32,
    count: usize,
) -> Vec<Ranked> {
    let mut max_sim: Vec<f32> = pool
        .iter()
        .map(|candidate| {
            liked
                .iter()
                .filter_map(|&l| features.cosine(candidate.id, l))
                .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))))
                .unwrap_or(0.0)
        })
        .collect();

    let mut remaining: Vec<usize> = (0..pool.len()).collect();
    let mut selected = Vec::with_capacity(count.min(pool.len()));

    while selected.len() < count && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_objective = f32::NEG_INFINITY;
        for (pos, &k) in remaining.iter().enumerate() {
            let mmr = lambda * pool[k].score - (1.0 - lambda) * max_sim[k];
            if mmr > best_objective {
                best_objective = mmr;
                best_pos = pos;
            }
        }

        let chosen = remaining.remove(best_pos);
        let chosen_id = pool[chosen].id;
        for &k in &remaining {
            if let Some(sim) = features.cosine(pool[k].id, chosen_id) {
                max_sim[k] = max_sim[k].max(sim);
            }
        }

        selected.push(pool[chosen].clone());
    }

    selected
}
