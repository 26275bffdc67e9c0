use crate::strategy::{Provenance, RankContext, RankQuery, Ranked, RankingStrategy};
use courserec_core::{CourseId, CsrMatrix, Error, FeatureStore, Result};

/// Which overlap matrix keyword scoring reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordWeighting {
    /// Shared keyword counts; disliked rows are damped
    #[default]
    Counts,
    /// Shared keywords weighted by inverse document frequency; disliked rows
    /// are subtracted in full
    TfIdf,
}

/// Sum of overlap-matrix rows for liked courses, minus the disliked rows.
///
/// With [`KeywordWeighting::Counts`] the disliked rows are damped by
/// `dislike_weight / max(|disliked|, 1)`. Does not need embeddings; every
/// catalog course is a candidate and ties keep matrix row order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordOverlapStrategy {
    weighting: KeywordWeighting,
}

impl KeywordOverlapStrategy {
    pub fn counts() -> Self {
        Self {
            weighting: KeywordWeighting::Counts,
        }
    }

    pub fn tfidf() -> Self {
        Self {
            weighting: KeywordWeighting::TfIdf,
        }
    }

    pub fn weighting(&self) -> KeywordWeighting {
        self.weighting
    }

    fn matrix<'a>(&self, features: &'a FeatureStore) -> Result<&'a CsrMatrix> {
        match self.weighting {
            KeywordWeighting::Counts => Ok(features.overlap()),
            KeywordWeighting::TfIdf => features
                .weighted_overlap()
                .ok_or_else(|| Error::Storage("idf-weighted overlap matrix is not loaded".into())),
        }
    }

    /// Up to two liked courses sharing the most keywords with `id`
    fn sources(id: CourseId, liked: &[CourseId], matrix: &CsrMatrix) -> Provenance {
        let mut overlaps: Vec<(CourseId, f32)> = liked
            .iter()
            .filter_map(|&l| {
                let shared = matrix.get(l.index(), id.index());
                (shared > 0.0).then_some((l, shared))
            })
            .collect();
        overlaps.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        overlaps.into_iter().take(2).map(|(l, _)| l).collect()
    }
}

impl RankingStrategy for KeywordOverlapStrategy {
    fn name(&self) -> &'static str {
        match self.weighting {
            KeywordWeighting::Counts => "keywords",
            KeywordWeighting::TfIdf => "keywords-tfidf",
        }
    }

    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let matrix = self.matrix(ctx.features)?;
        let mut dense = vec![0.0f32; matrix.size()];

        for &id in query.liked {
            if let Some(row) = matrix.row(id.index()) {
                row.accumulate_into(&mut dense, 1.0);
            }
        }
        if !query.disliked.is_empty() {
            let scale = match self.weighting {
                KeywordWeighting::Counts => ctx.config.dislike_weight / query.disliked.len().max(1) as f32,
                KeywordWeighting::TfIdf => 1.0,
            };
            for &id in query.disliked {
                if let Some(row) = matrix.row(id.index()) {
                    row.accumulate_into(&mut dense, -scale);
                }
            }
        }

        Ok(dense
            .into_iter()
            .enumerate()
            .map(|(i, score)| Ranked::new(CourseId::from(i), score))
            .collect())
    }

    fn explain(&self, ranked: &mut [Ranked], query: &RankQuery<'_>, ctx: &RankContext<'_>) {
        let Ok(matrix) = self.matrix(ctx.features) else {
            return;
        };
        for item in ranked.iter_mut() {
            item.provenance = Self::sources(item.id, query.liked, matrix);
        }
    }
}
