use crate::embeddings::load_embeddings;
use crate::feedback::FeedbackLog;
use crate::loader::load_catalog;
use crate::overlap::{build_overlap, build_weighted_overlap, load_overlap};
use courserec_core::{
    Catalog, CsrMatrix, DataConfig, EngineConfig, FeatureStore, FeedbackSink, NullFeedbackSink, Result,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

fn load_or_build(path: Option<&Path>, catalog: &Catalog, build: fn(&Catalog) -> CsrMatrix) -> Result<CsrMatrix> {
    match path {
        Some(path) => load_overlap(path),
        None => Ok(build(catalog)),
    }
}

/// Immutable stores built at startup
#[derive(Debug, Clone)]
pub struct LoadedStores {
    pub catalog: Arc<Catalog>,
    pub features: Arc<FeatureStore>,
}

/// Loads and cross-checks the static data a recommender serves from
pub struct StoreManager;

impl StoreManager {
    /// Load the catalog and embeddings in parallel, then attach both overlap
    /// matrices. Any missing file or shape mismatch is fatal.
    pub fn load(config: &DataConfig) -> Result<LoadedStores> {
        let started = Instant::now();
        let (catalog, embeddings) = rayon::join(
            || load_catalog(&config.courses_dir, config.duplicate_policy),
            || load_embeddings(&config.embeddings_path),
        );
        let catalog = catalog?;
        let embeddings = embeddings?;

        let (overlap, weighted) = rayon::join(
            || load_or_build(config.overlap_path.as_deref(), &catalog, build_overlap),
            || load_or_build(config.weighted_overlap_path.as_deref(), &catalog, build_weighted_overlap),
        );
        let features =
            FeatureStore::new(catalog.len(), embeddings, overlap?)?.with_weighted_overlap(weighted?)?;

        info!(
            "Stores loaded in {:.2?}: {} courses",
            started.elapsed(),
            catalog.len()
        );
        Ok(LoadedStores {
            catalog: Arc::new(catalog),
            features: Arc::new(features),
        })
    }

    /// Feedback sink for `config`: a JSONL log when a path is set, otherwise
    /// one that discards events
    pub fn feedback_sink(config: &EngineConfig) -> Result<Arc<dyn FeedbackSink>> {
        Ok(match &config.feedback_log {
            Some(path) => Arc::new(FeedbackLog::open(path)?),
            None => Arc::new(NullFeedbackSink),
        })
    }
}
