//! # courserec
//!
//! A course recommendation engine. Given the courses a user liked, disliked
//! or skipped, it ranks the rest of the catalog with one of several
//! interchangeable strategies.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! courserec --courses-dir ./assets/courses --embeddings ./assets/embeddings.bin \
//!     recommend --liked IB111,MB151 --count 10 --strategy mmr
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use courserec::prelude::*;
//!
//! let config = EngineConfig::from_file("engine.json").unwrap();
//! let recommender = courserec::open(&config).unwrap();
//!
//! let mut request = RecommendationRequest::new(vec!["IB111".into()], 10, "pairwise-max");
//! request.disliked = vec!["MB151".into()];
//! for rec in recommender.recommend(&request).unwrap() {
//!     println!("{} {:.3} {:?}", rec.course.code, rec.score, rec.recommended_from);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `courserec-core` - Course catalog, feature store, configuration, feedback events
//! - `courserec-similarity` - Similarity functions, ranking strategies, MMR, orchestrator
//! - `courserec-storage` - Catalog/embedding/overlap loaders and the feedback log
//!
//! ## Strategies
//!
//! - **centroid** / **centroid-euclidean**: closeness to the liked centroid minus half the disliked one
//! - **sum-of-squares**: squared cosine summed over liked courses
//! - **pairwise-max**: best match against any single liked course
//! - **pairwise-combination**: also matches centroids of liked pairs
//! - **mmr**: relevance/diversity re-ranking
//! - **keywords**: keyword overlap counts
//! - **keywords-tfidf**: keyword overlap weighted by inverse document frequency
//! - **baseline**: shared teacher, faculty and department

// Re-export core types
pub use courserec_core::{
    Catalog, Course, CourseId, CourseRecord, DataConfig, DuplicatePolicy, EngineConfig, Error,
    FeatureStore, FeedbackAction, FeedbackEvent, FeedbackSink, RankingConfig,
    RecommendationFeedback, Result, UserFeedback,
};

// Re-export similarity
pub use courserec_similarity::{
    RecommendParams, Recommendation, RecommendationRequest, Recommender, RankingStrategy,
    StrategyRegistry,
};

// Re-export storage
pub use courserec_storage::{FeedbackLog, LoadedStores, MemoryFeedbackSink, StoreManager};

use tracing::info;

/// Load every store named in `config` and build a recommender wired to the
/// configured feedback sink
pub fn open(config: &EngineConfig) -> Result<Recommender> {
    config.ranking.validate()?;
    let stores = StoreManager::load(&config.data)?;
    let sink = StoreManager::feedback_sink(config)?;
    let recommender = Recommender::new(stores.catalog, stores.features, config.ranking.clone())?
        .with_feedback_sink(sink);
    info!("Engine ready with strategies {:?}", recommender.strategies());
    Ok(recommender)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Course, CourseId, EngineConfig, Error, FeedbackAction, FeedbackEvent, FeedbackSink,
        RecommendParams, Recommendation, RecommendationRequest, Recommender, Result,
    };
}

/// SIMD-optimized vector operations
pub mod simd {
    pub use courserec_core::simd::{dot_product_simd, l2_distance_simd, norm_simd};
}
