//! Small in-memory catalogs for unit tests

use crate::strategy::{RankContext, RankQuery, RecommendParams};
use ahash::AHashSet;
use courserec_core::{
    Catalog, CourseId, CourseRecord, CsrMatrix, DuplicatePolicy, EmbeddingMatrix, FeatureStore,
    RankingConfig,
};

pub(crate) struct Fixture {
    pub catalog: Catalog,
    pub features: FeatureStore,
    pub config: RankingConfig,
}

impl Fixture {
    /// One course per embedding, coded by the given names
    pub fn with_embeddings(codes: &[&str], embeddings: Vec<Vec<f32>>) -> Self {
        let size = codes.len();
        Self::build(
            codes.iter().map(|c| CourseRecord::new(*c, *c)).collect(),
            embeddings,
            CsrMatrix::zeros(size),
        )
    }

    pub fn build(records: Vec<CourseRecord>, embeddings: Vec<Vec<f32>>, overlap: CsrMatrix) -> Self {
        let catalog = Catalog::from_records(records, DuplicatePolicy::FirstWins).unwrap();
        let embeddings = EmbeddingMatrix::from_rows(embeddings).unwrap();
        let features = FeatureStore::new(catalog.len(), embeddings, overlap).unwrap();
        Self {
            catalog,
            features,
            config: RankingConfig::default(),
        }
    }

    pub fn ctx(&self) -> RankContext<'_> {
        RankContext {
            catalog: &self.catalog,
            features: &self.features,
            config: &self.config,
        }
    }

    pub fn ids(&self, codes: &[&str]) -> Vec<CourseId> {
        self.catalog.resolve_codes(codes)
    }

    pub fn codes(&self, ids: impl IntoIterator<Item = CourseId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| self.catalog.lookup_by_id(id).unwrap().code.clone())
            .collect()
    }
}

/// Query whose exclusion set is `liked ∪ disliked`
pub(crate) struct OwnedQuery {
    pub liked: Vec<CourseId>,
    pub disliked: Vec<CourseId>,
    pub excluded: AHashSet<CourseId>,
    pub count: usize,
    pub params: RecommendParams,
}

impl OwnedQuery {
    pub fn new(liked: Vec<CourseId>, disliked: Vec<CourseId>, count: usize) -> Self {
        let excluded = liked.iter().chain(disliked.iter()).copied().collect();
        Self {
            liked,
            disliked,
            excluded,
            count,
            params: RecommendParams::default(),
        }
    }

    pub fn as_query(&self) -> RankQuery<'_> {
        RankQuery {
            liked: &self.liked,
            disliked: &self.disliked,
            excluded: &self.excluded,
            count: self.count,
            params: &self.params,
        }
    }
}
