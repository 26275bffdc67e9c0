use crate::distance::{cosine_with_norms, hard_reject};
use crate::strategy::{usable_embeddings, Provenance, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::{CourseId, Result};
use rayon::prelude::*;
use smallvec::smallvec;

/// Score is the highest cosine similarity to any single liked course, which
/// is also reported as provenance. Candidates too close to a disliked course
/// are hard-rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseMaxStrategy;

impl RankingStrategy for PairwiseMaxStrategy {
    fn name(&self) -> &'static str {
        "pairwise-max"
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

                let mut best: Option<(CourseId, f32)> = None;
                for (l, lv) in &liked {
                    let Some(sim) = cosine_with_norms(v, norm, lv, features.norm_of(*l)?) else {
                        continue;
                    };
                    if best.map(|(_, b)| sim > b).unwrap_or(true) {
                        best = Some((*l, sim));
                    }
                }
                best.map(|(source, sim)| {
                    let provenance: Provenance = smallvec![source];
                    Ranked::new(id, sim).with_provenance(provenance)
                })
            })
            .collect();

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, OwnedQuery};

    #[test]
    fn test_disliked_twin_is_rejected() {
        // E would rank first on raw relevance but is identical to disliked B
        let fx = Fixture::with_embeddings(
            &["A", "B", "C", "E"],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.95, 0.1, 0.0],
                vec![0.3, 0.9, 0.1],
                vec![0.95, 0.1, 0.0],
            ],
        );
        let query = OwnedQuery::new(fx.ids(&["A"]), fx.ids(&["B"]), 2);
        let ranked = PairwiseMaxStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["C", "E"]);
        assert!(!ranked[0].rejected);
        assert!(ranked[1].rejected);
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_provenance_is_best_liked_course() {
        let fx = Fixture::with_embeddings(
            &["L1", "L2", "NEAR_L2", "NEAR_L1"],
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.1, 1.0],
                vec![1.0, 0.3],
            ],
        );
        let query = OwnedQuery::new(fx.ids(&["L1", "L2"]), vec![], 2);
        let ranked = PairwiseMaxStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["NEAR_L2", "NEAR_L1"]);
        assert_eq!(fx.codes(ranked[0].provenance.iter().copied()), vec!["L2"]);
        assert_eq!(fx.codes(ranked[1].provenance.iter().copied()), vec!["L1"]);
    }
}
