//! # courserec Core
//!
//! Data model shared by the recommendation engine:
//!
//! - [`Catalog`] - Every course, addressable by code or dense [`CourseId`]
//! - [`FeatureStore`] - Embeddings and keyword overlap aligned with catalog ids
//! - [`EngineConfig`] - Data locations and ranking tunables
//! - [`FeedbackSink`] - Where user reactions are handed off to
//!
//! ## Example
//!
//! ```rust
//! use courserec_core::{Catalog, CourseRecord, CsrMatrix, DuplicatePolicy, EmbeddingMatrix, FeatureStore};
//!
//! let catalog = Catalog::from_records(
//!     vec![CourseRecord::new("IB111", "Programming"), CourseRecord::new("MB151", "Algebra")],
//!     DuplicatePolicy::FirstWins,
//! ).unwrap();
//!
//! let embeddings = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! let features = FeatureStore::new(catalog.len(), embeddings, CsrMatrix::zeros(2)).unwrap();
//!
//! let id = catalog.id_of("MB151").unwrap();
//! assert_eq!(features.embedding_of(id), Some(&[0.0, 1.0][..]));
//! ```

pub mod catalog;
pub mod config;
pub mod course;
pub mod error;
pub mod features;
pub mod feedback;
pub mod sparse;
pub mod vector;

/// SIMD-optimized vector operations
///
/// Provides hardware-accelerated kernels:
/// - AVX2/FMA on x86_64
/// - Unrolled scalar fallback elsewhere
pub mod simd;

pub use catalog::{Catalog, DuplicatePolicy};
pub use config::{DataConfig, EngineConfig, RankingConfig, RelevanceSignal};
pub use course::{Course, CourseId, CourseRecord, Ratings};
pub use error::{Error, Result};
pub use features::{EmbeddingMatrix, FeatureStore};
pub use feedback::{
    FeedbackAction, FeedbackEnvelope, FeedbackEvent, FeedbackSink, NullFeedbackSink,
    RecommendationFeedback, UserFeedback,
};
pub use sparse::{CsrMatrix, SparseRow};
pub use vector::Vector;
