//! # courserec Similarity
//!
//! Scoring and ranking on top of the course catalog and feature store.
//!
//! ## Features
//!
//! - **Similarity Engine**: cosine, centroid, aggregate target, pairwise max, hard reject
//! - **Ranking Strategies**: interchangeable algorithms selected by name
//! - **MMR Re-ranking**: greedy relevance/diversity trade-off over a bounded pool
//! - **Orchestrator**: code resolution, exclusion, provenance and course materialization
//!
//! ## Example
//!
//! ```rust
//! use courserec_core::{Catalog, CourseRecord, CsrMatrix, DuplicatePolicy, EmbeddingMatrix, FeatureStore, RankingConfig};
//! use courserec_similarity::{RecommendationRequest, Recommender};
//! use std::sync::Arc;
//!
//! let catalog = Catalog::from_records(
//!     ["A", "B", "C"].iter().map(|c| CourseRecord::new(*c, *c)),
//!     DuplicatePolicy::FirstWins,
//! ).unwrap();
//! let embeddings = EmbeddingMatrix::from_rows(vec![
//!     vec![1.0, 0.0],
//!     vec![0.9, 0.2],
//!     vec![0.0, 1.0],
//! ]).unwrap();
//! let features = FeatureStore::new(catalog.len(), embeddings, CsrMatrix::zeros(3)).unwrap();
//!
//! let recommender = Recommender::new(Arc::new(catalog), Arc::new(features), RankingConfig::default()).unwrap();
//! let results = recommender
//!     .recommend(&RecommendationRequest::new(vec!["A".into()], 1, "centroid"))
//!     .unwrap();
//! assert_eq!(results[0].course.code, "B");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Catalog    │────>│ Recommender │<────│  Features   │
//! │ (code → id) │     │ (resolve)   │     │ (emb, CSR)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  Strategy   │──> distance
//!                     │ (score)     │
//!                     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  finalize / │
//!                     │  MMR        │
//!                     └─────────────┘
//! ```

pub mod distance;
pub mod recommender;
pub mod rerank;
pub mod strategies;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use recommender::{Recommendation, RecommendationRequest, Recommender};
pub use rerank::MmrStrategy;
pub use strategies::{
    CentroidMetric, CentroidStrategy, FeatureBaselineStrategy, KeywordOverlapStrategy, KeywordWeighting,
    PairwiseCombinationStrategy, PairwiseMaxStrategy, StrategyRegistry, SumOfSquaresStrategy,
};
pub use strategy::{finalize, Provenance, RankContext, RankQuery, Ranked, RankingStrategy, RecommendParams};
