use crate::distance::{aggregate_target, cosine_with_norms, inverse_euclidean};
use crate::strategy::{usable_embeddings, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::simd::norm_simd;
use courserec_core::{CourseId, Result};
use rayon::prelude::*;
use tracing::{trace, warn};

/// How closeness to the target vector is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidMetric {
    Cosine,
    /// `1 / (1 + euclidean distance)`
    Euclidean,
}

/// Scores candidates against `centroid(liked) - w * centroid(disliked)`.
///
/// Dislikes are penalized proportionally: the disliked centroid is weighted
/// by `dislike_weight` regardless of how many courses were disliked.
#[derive(Debug, Clone, Copy)]
pub struct CentroidStrategy {
    metric: CentroidMetric,
}

impl CentroidStrategy {
    pub fn new(metric: CentroidMetric) -> Self {
        Self { metric }
    }

    pub fn cosine() -> Self {
        Self::new(CentroidMetric::Cosine)
    }

    pub fn euclidean() -> Self {
        Self::new(CentroidMetric::Euclidean)
    }
}

impl RankingStrategy for CentroidStrategy {
    fn name(&self) -> &'static str {
        match self.metric {
            CentroidMetric::Cosine => "centroid",
            CentroidMetric::Euclidean => "centroid-euclidean",
        }
    }

    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let features = ctx.features;
        let liked: Vec<&[f32]> = usable_embeddings(query.liked, features, "liked")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let disliked: Vec<&[f32]> = usable_embeddings(query.disliked, features, "disliked")
            .into_iter()
            .map(|(_, v)| v)
            .collect();

        let Some(target) = aggregate_target(&liked, &disliked, ctx.config.dislike_weight) else {
            return Ok(Vec::new());
        };
        let target_norm = norm_simd(&target);
        if self.metric == CentroidMetric::Cosine && target_norm <= f32::EPSILON {
            warn!("Preference target has zero norm, nothing to rank against");
            return Ok(Vec::new());
        }

        let metric = self.metric;
        let scored: Vec<Ranked> = (0..features.len())
            .into_par_iter()
            .filter_map(|i| {
                let id = CourseId::from(i);
                let (Some(v), Some(norm)) = (features.embedding_of(id), features.norm_of(id)) else {
                    return None;
                };
                let score = match metric {
                    CentroidMetric::Cosine => cosine_with_norms(v, norm, &target, target_norm),
                    CentroidMetric::Euclidean if norm > f32::EPSILON => Some(inverse_euclidean(v, &target)),
                    CentroidMetric::Euclidean => None,
                };
                if score.is_none() {
                    trace!("Skipping course {} with degenerate embedding", id);
                }
                score.map(|s| Ranked::new(id, s))
            })
            .collect();

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, OwnedQuery};

    fn abcd() -> Fixture {
        Fixture::with_embeddings(
            &["A", "B", "C", "D"],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![-0.95, 0.05, 0.0],
            ],
        )
    }

    #[test]
    fn test_closest_then_orthogonal() {
        let fx = abcd();
        let query = OwnedQuery::new(fx.ids(&["A"]), vec![], 2);
        let ranked = CentroidStrategy::cosine().rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["B", "C"]);
        assert!(ranked[0].score > ranked[1].score);
        assert_eq!(ranked[0].provenance.as_slice(), fx.ids(&["A"]).as_slice());
    }

    #[test]
    fn test_euclidean_variant_orders_the_same() {
        let fx = abcd();
        let query = OwnedQuery::new(fx.ids(&["A"]), vec![], 3);
        let ranked = CentroidStrategy::euclidean().rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["B", "C", "D"]);
        assert!(ranked.iter().all(|r| r.score > 0.0 && r.score <= 1.0));
    }

    #[test]
    fn test_dislike_shifts_target() {
        let fx = Fixture::with_embeddings(
            &["L", "X", "Y", "D"],
            vec![
                vec![1.0, 1.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, -0.2],
            ],
        );
        let query = OwnedQuery::new(fx.ids(&["L"]), fx.ids(&["D"]), 2);
        let ranked = CentroidStrategy::cosine().rank(&query.as_query(), &fx.ctx()).unwrap();
        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["Y", "X"]);
    }

    #[test]
    fn test_empty_liked_and_degenerate_candidates() {
        let fx = Fixture::with_embeddings(&["A", "Z", "B"], vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![1.0, 0.5]]);

        let query = OwnedQuery::new(vec![], vec![], 5);
        assert!(CentroidStrategy::cosine().rank(&query.as_query(), &fx.ctx()).unwrap().is_empty());

        let query = OwnedQuery::new(fx.ids(&["A"]), vec![], 5);
        let ranked = CentroidStrategy::cosine().rank(&query.as_query(), &fx.ctx()).unwrap();
        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["B"]);
    }
}
