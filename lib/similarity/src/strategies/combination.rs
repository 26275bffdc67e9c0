use crate::distance::{centroid, cosine_with_norms, hard_reject};
use crate::strategy::{usable_embeddings, Provenance, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::{CourseId, Result, Vector};
use rayon::prelude::*;
use smallvec::smallvec;
use tracing::debug;

/// Unit-length target vector and the liked course(s) it was built from
struct Target {
    direction: Vector,
    sources: Provenance,
}

/// Pairwise-max extended with the centroid of every unordered pair of liked
/// courses, so a candidate can match a blend of two interests.
///
/// Matches against a single liked course are multiplied by
/// `single_target_penalty`. Candidates at or above `near_duplicate_threshold`
/// to an individual liked course, or `reject_threshold` to a disliked one,
/// are hard-rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseCombinationStrategy;

impl PairwiseCombinationStrategy {
    fn targets(liked: &[(CourseId, &[f32])], max_pair_sources: Option<usize>) -> Vec<Target> {
        let paired = &liked[..max_pair_sources.map_or(liked.len(), |max| liked.len().min(max))];
        if paired.len() < liked.len() {
            debug!(
                "Pairing only the first {} of {} liked courses",
                paired.len(),
                liked.len()
            );
        }

        let mut targets = Vec::with_capacity(paired.len() * paired.len() / 2 + liked.len());
        // pairs go first so exact ties resolve in favor of a blend
        for (i, (a, va)) in paired.iter().enumerate() {
            for (b, vb) in &paired[i + 1..] {
                let Some(mid) = centroid(&[*va, *vb]) else {
                    continue;
                };
                let mid = Vector::from(mid);
                if mid.norm() <= f32::EPSILON {
                    continue;
                }
                targets.push(Target {
                    direction: mid.normalized(),
                    sources: smallvec![*a, *b],
                });
            }
        }
        for (id, v) in liked {
            targets.push(Target {
                direction: Vector::from_slice(v).normalized(),
                sources: smallvec![*id],
            });
        }
        targets
    }
}

impl RankingStrategy for PairwiseCombinationStrategy {
    fn name(&self) -> &'static str {
        "pairwise-combination"
    }

    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let features = ctx.features;
        let config = ctx.config;
        let liked = usable_embeddings(query.liked, features, "liked");
        if liked.is_empty() {
            return Ok(Vec::new());
        }
        let disliked: Vec<&[f32]> = usable_embeddings(query.disliked, features, "disliked")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let liked_vectors: Vec<&[f32]> = liked.iter().map(|(_, v)| *v).collect();
        let targets = Self::targets(&liked, config.max_pair_sources);

        let scored: Vec<Ranked> = (0..features.len())
            .into_par_iter()
            .filter_map(|i| {
                let id = CourseId::from(i);
                if !features.is_usable(id) {
                    tracing::trace!("Skipping course {} with degenerate embedding", id);
                    return None;
                }
                let v = features.embedding_of(id)?;
                if hard_reject(v, &liked_vectors, config.near_duplicate_threshold)
                    || hard_reject(v, &disliked, config.reject_threshold)
                {
                    return Some(Ranked::rejected(id));
                }
                let norm = features.norm_of(id)?;

                let mut best: Option<(&Target, f32)> = None;
                for target in &targets {
                    let Some(sim) = cosine_with_norms(v, norm, target.direction.as_slice(), 1.0) else {
                        continue;
                    };
                    if best.map(|(_, b)| sim > b).unwrap_or(true) {
                        best = Some((target, sim));
                    }
                }
                best.map(|(target, sim)| {
                    let score = if target.sources.len() == 1 {
                        sim * config.single_target_penalty
                    } else {
                        sim
                    };
                    Ranked::new(id, score).with_provenance(target.sources.clone())
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

    fn fixture() -> Fixture {
        Fixture::with_embeddings(
            &["L1", "L2", "SINGLE", "BLEND", "DUP"],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.3, 0.3],
                vec![1.0, 1.0, 0.1],
                vec![1.0, 0.05, 0.0],
            ],
        )
    }

    #[test]
    fn test_blend_wins_and_near_duplicate_rejected() {
        let fx = fixture();
        let query = OwnedQuery::new(fx.ids(&["L1", "L2"]), vec![], 3);
        let ranked = PairwiseCombinationStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["BLEND", "SINGLE", "DUP"]);
        assert_eq!(fx.codes(ranked[0].provenance.iter().copied()), vec!["L1", "L2"]);
        assert_eq!(fx.codes(ranked[1].provenance.iter().copied()), vec!["L1"]);
        assert!(ranked[2].rejected);
    }

    #[test]
    fn test_single_target_penalty_applied() {
        let fx = fixture();
        let query = OwnedQuery::new(fx.ids(&["L1", "L2"]), vec![], 2);
        let ranked = PairwiseCombinationStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        let single = fx.features.embedding_of(ranked[1].id).unwrap();
        let raw = crate::distance::cosine(single, &[1.0, 0.0, 0.0]).unwrap();
        assert!((ranked[1].score - raw * 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_every_liked_pair_is_a_target() {
        // thirteen orthogonal liked courses; the candidate blends the first and last
        let dim = 14;
        let mut codes: Vec<String> = (0..13).map(|i| format!("L{}", i)).collect();
        codes.push("BLEND".into());
        let mut rows: Vec<Vec<f32>> = (0..13)
            .map(|i| {
                let mut row = vec![0.0; dim];
                row[i] = 1.0;
                row
            })
            .collect();
        let mut blend = vec![0.0; dim];
        blend[0] = 1.0;
        blend[12] = 1.0;
        rows.push(blend);

        let code_refs: Vec<&str> = codes.iter().map(String::as_str).collect();
        let fx = Fixture::with_embeddings(&code_refs, rows);
        let query = OwnedQuery::new(fx.ids(&code_refs[..13]), vec![], 1);
        let ranked = PairwiseCombinationStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["BLEND"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-5);
        assert_eq!(fx.codes(ranked[0].provenance.iter().copied()), vec!["L0", "L12"]);
    }

    #[test]
    fn test_close_to_disliked_is_rejected() {
        let fx = Fixture::with_embeddings(
            &["L1", "L2", "D", "NEAR_D", "GOOD", "NEG"],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.1, 0.0, 1.0],
                vec![1.0, 1.0, 0.1],
                vec![-1.0, -1.0, -0.1],
            ],
        );
        let query = OwnedQuery::new(fx.ids(&["L1", "L2"]), fx.ids(&["D"]), 3);
        let ranked = PairwiseCombinationStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        assert_eq!(fx.codes(ranked.iter().map(|r| r.id)), vec!["GOOD", "NEG", "NEAR_D"]);
        assert!(!ranked[1].rejected);
        assert!(ranked[1].score < 0.0);
        assert!(ranked[2].rejected);
        assert_eq!(ranked[2].score, 0.0);
    }

    #[test]
    fn test_pair_sources_cap_is_opt_in() {
        let liked_vectors = [vec![1.0f32, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let liked: Vec<(CourseId, &[f32])> = liked_vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (CourseId::from(i), v.as_slice()))
            .collect();

        assert_eq!(PairwiseCombinationStrategy::targets(&liked, None).len(), 3 + 3);
        assert_eq!(PairwiseCombinationStrategy::targets(&liked, Some(12)).len(), 3 + 3);
        assert_eq!(PairwiseCombinationStrategy::targets(&liked, Some(2)).len(), 1 + 3);
    }
}
