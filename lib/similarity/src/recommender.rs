//! Recommendation orchestrator
//!
//! Owns the shared stores and the strategy registry, resolves course codes,
//! runs the named strategy and materializes results as course records.

use crate::strategies::StrategyRegistry;
use crate::strategy::{RankContext, RankQuery, RecommendParams};
use ahash::AHashSet;
use courserec_core::{
    Catalog, Course, CourseId, Error, FeatureStore, FeedbackEvent, FeedbackSink, NullFeedbackSink,
    RankingConfig, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn default_strategy() -> String {
    "mmr".to_string()
}

/// A recommendation request in terms of course codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub disliked: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<String>,
    pub count: usize,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub params: RecommendParams,
}

impl RecommendationRequest {
    pub fn new(liked: Vec<String>, count: usize, strategy: impl Into<String>) -> Self {
        Self {
            liked,
            disliked: Vec::new(),
            skipped: Vec::new(),
            count,
            strategy: strategy.into(),
            params: RecommendParams::default(),
        }
    }
}

/// One recommended course with its score and the liked course(s) behind it
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation<'a> {
    #[serde(flatten)]
    pub course: &'a Course,
    /// Zero for hard-rejected courses, which always come after accepted ones
    pub score: f32,
    /// Too close to a disliked course (or a near-duplicate of a liked one)
    pub rejected: bool,
    pub recommended_from: Vec<String>,
}

/// Entry point for serving recommendations.
///
/// Cheap to clone; all state is shared and read-only, so one instance can
/// serve any number of concurrent requests.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    features: Arc<FeatureStore>,
    strategies: StrategyRegistry,
    config: RankingConfig,
    feedback: Arc<dyn FeedbackSink>,
}

impl Recommender {
    /// Recommender with every built-in strategy and feedback discarded
    pub fn new(catalog: Arc<Catalog>, features: Arc<FeatureStore>, config: RankingConfig) -> Result<Self> {
        config.validate()?;
        if catalog.len() != features.len() {
            return Err(Error::ShapeMismatch {
                what: "feature store",
                expected: catalog.len(),
                actual: features.len(),
            });
        }
        let strategies = StrategyRegistry::with_defaults(&config);
        info!(
            "Recommender ready: {} courses, {} strategies",
            catalog.len(),
            strategies.names().len()
        );
        Ok(Self {
            catalog,
            features,
            strategies,
            config,
            feedback: Arc::new(NullFeedbackSink),
        })
    }

    pub fn with_feedback_sink(mut self, sink: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = sink;
        self
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Names accepted by [`recommend`](Self::recommend)
    pub fn strategies(&self) -> &[&'static str] {
        self.strategies.names()
    }

    /// Rank the catalog for `request`.
    ///
    /// Unknown codes are ignored. No liked, disliked or skipped course is ever
    /// returned, and at most `count` results come back.
    #[instrument(skip(self, request), fields(strategy = %request.strategy, count = request.count))]
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<Recommendation<'_>>> {
        if request.count == 0 {
            return Err(Error::InvalidRequest("count must be greater than zero".into()));
        }
        let strategy = self.strategies.get(&request.strategy)?;

        let liked = self.catalog.resolve_codes(&request.liked);
        let disliked = self.catalog.resolve_codes(&request.disliked);
        let skipped = self.catalog.resolve_codes(&request.skipped);
        let excluded: AHashSet<CourseId> = liked
            .iter()
            .chain(disliked.iter())
            .chain(skipped.iter())
            .copied()
            .collect();
        debug!(
            "Resolved {} liked, {} disliked, {} skipped",
            liked.len(),
            disliked.len(),
            skipped.len()
        );

        let query = RankQuery {
            liked: &liked,
            disliked: &disliked,
            excluded: &excluded,
            count: request.count,
            params: &request.params,
        };
        let ctx = RankContext {
            catalog: &self.catalog,
            features: &self.features,
            config: &self.config,
        };

        let ranked = strategy.rank(&query, &ctx)?;
        let results: Vec<Recommendation<'_>> = ranked
            .into_iter()
            .filter(|r| !excluded.contains(&r.id))
            .take(request.count)
            .filter_map(|r| {
                let course = self.catalog.lookup_by_id(r.id)?;
                let recommended_from = r
                    .provenance
                    .iter()
                    .filter_map(|&id| self.catalog.lookup_by_id(id))
                    .map(|c| c.code.clone())
                    .collect();
                Some(Recommendation {
                    course,
                    score: r.score,
                    rejected: r.rejected,
                    recommended_from,
                })
            })
            .collect();

        debug!("Returning {} recommendations", results.len());
        Ok(results)
    }

    pub fn get_course(&self, code: &str) -> Result<&Course> {
        self.catalog
            .lookup_by_code(code)
            .ok_or_else(|| Error::CourseNotFound(code.to_string()))
    }

    /// Case-insensitive search over code, name, faculty and department
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Course> {
        self.catalog.search(query, limit)
    }

    /// Hand an event to the feedback sink without waiting for it to be stored.
    /// A user rating outside 1..=5 is refused before it reaches the sink.
    pub fn record_feedback(&self, event: FeedbackEvent) -> Result<()> {
        if let FeedbackEvent::User(feedback) = &event {
            if !feedback.is_valid_rating() {
                return Err(Error::InvalidRequest(format!(
                    "rating must be between 1 and 5, got {:?}",
                    feedback.rating
                )));
            }
        }
        self.feedback.record(event);
        Ok(())
    }

    /// Wait until the feedback sink has persisted everything recorded so far
    pub fn flush_feedback(&self) {
        self.feedback.flush();
    }
}
