use crate::distance::{cosine_with_norms, hard_reject};
use crate::strategy::{usable_embeddings, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::{CourseId, Result};
use rayon::prelude::*;

/// `Σ cosine(liked_i, candidate)²`, with a hard reject for anything too close
/// to a disliked course. Dislikes only ever reject; they never lower a score.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOfSquaresStrategy;

impl RankingStrategy for SumOfSquaresStrategy {
    fn name(&self) -> &'static str {
        "sum-of-squares"
    }

    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let features = ctx.features;
        let liked = usable_embeddings(query.liked, features, "liked");
        if liked.is_empty() {
            return Ok(Vec::new());
        }
        let disliked: Vec<&[f32]> = usable_embeddings(query.disliked, features, "disliked")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let threshold = ctx.config.reject_threshold;

        let scored: Vec<Ranked> = (0..features.len())
            .into_par_iter()
            .filter_map(|i| {
                let id = CourseId::from(i);
                if !features.is_usable(id) {
                    tracing::trace!("Skipping course {} with degenerate embedding", id);
                    return None;
                }
                let v = features.embedding_of(id)?;
                if hard_reject(v, &disliked, threshold) {
                    return Some(Ranked::rejected(id));
                }
                let norm = features.norm_of(id)?;
                let score: f32 = liked
                    .iter()
                    .filter_map(|(l, lv)| cosine_with_norms(v, norm, lv, features.norm_of(*l)?))
                    .map(|sim| sim * sim)
                    .sum();
                Some(Ranked::new(id, score))
            })
            .collect();

        Ok(scored)
    }
}
