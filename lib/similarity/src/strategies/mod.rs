//! Ranking strategy implementations and the registry that names them

mod baseline;
mod centroid;
mod combination;
mod keywords;
mod pairwise;
mod sum_squares;

pub use baseline::FeatureBaselineStrategy;
pub use centroid::{CentroidMetric, CentroidStrategy};
pub use combination::PairwiseCombinationStrategy;
pub use keywords::{KeywordOverlapStrategy, KeywordWeighting};
pub use pairwise::PairwiseMaxStrategy;
pub use sum_squares::SumOfSquaresStrategy;

use crate::rerank::MmrStrategy;
use crate::strategy::RankingStrategy;
use ahash::AHashMap;
use courserec_core::{Error, RankingConfig, RelevanceSignal, Result};
use std::sync::Arc;

/// Strategies addressable by name, in registration order
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    by_name: AHashMap<&'static str, Arc<dyn RankingStrategy>>,
    order: Vec<&'static str>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in strategy. MMR re-ranks the relevance signal named in
    /// `config.mmr_relevance`.
    pub fn with_defaults(config: &RankingConfig) -> Self {
        let mut registry = Self::new();
        let centroid: Arc<dyn RankingStrategy> = Arc::new(CentroidStrategy::cosine());
        let sum_squares: Arc<dyn RankingStrategy> = Arc::new(SumOfSquaresStrategy);
        let pairwise: Arc<dyn RankingStrategy> = Arc::new(PairwiseMaxStrategy);

        let relevance = match config.mmr_relevance {
            RelevanceSignal::Centroid => centroid.clone(),
            RelevanceSignal::PairwiseMax => pairwise.clone(),
            RelevanceSignal::SumOfSquares => sum_squares.clone(),
        };

        registry.register(centroid);
        registry.register(Arc::new(CentroidStrategy::euclidean()));
        registry.register(sum_squares);
        registry.register(pairwise);
        registry.register(Arc::new(PairwiseCombinationStrategy));
        registry.register(Arc::new(MmrStrategy::new(relevance)));
        registry.register(Arc::new(KeywordOverlapStrategy::counts()));
        registry.register(Arc::new(KeywordOverlapStrategy::tfidf()));
        registry.register(Arc::new(FeatureBaselineStrategy));
        registry
    }

    /// Add a strategy, replacing any previous one with the same name
    pub fn register(&mut self, strategy: Arc<dyn RankingStrategy>) {
        let name = strategy.name();
        if self.by_name.insert(name, strategy).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn RankingStrategy>> {
        self.by_name
            .get(name.trim())
            .cloned()
            .ok_or_else(|| Error::StrategyNotFound(name.to_string()))
    }

    pub fn names(&self) -> &[&'static str] {
        &self.order
    }
}
