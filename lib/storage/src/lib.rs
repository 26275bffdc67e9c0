pub mod embeddings;
pub mod feedback;
pub mod loader;
pub mod manager;
pub mod overlap;

pub use embeddings::{load_embeddings, save_embeddings, EmbeddingSnapshot};
pub use feedback::{read_feedback_log, FeedbackLog, MemoryFeedbackSink, FEEDBACK_QUEUE_CAPACITY};
pub use loader::load_catalog;
pub use manager::{LoadedStores, StoreManager};
pub use overlap::{build_overlap, build_weighted_overlap, load_overlap, save_overlap};
