use crate::catalog::DuplicatePolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest and largest candidate pool MMR will re-rank
pub const MMR_POOL_MIN: usize = 100;
pub const MMR_POOL_MAX: usize = 500;

/// Top-level engine configuration, usually read from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data: DataConfig,
    pub ranking: RankingConfig,
    /// Append-only feedback log; feedback is discarded when unset
    pub feedback_log: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.ranking.validate()?;
        Ok(config)
    }
}

/// Where the static data files live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of per-faculty course files (`*.json`, each an array of records)
    pub courses_dir: PathBuf,
    /// Embedding file aligned to catalog order (`.json` or bincode `.bin`)
    pub embeddings_path: PathBuf,
    /// Precomputed overlap matrix; built from course keywords when unset
    pub overlap_path: Option<PathBuf>,
    /// Precomputed idf-weighted overlap matrix; built from course keywords when unset
    pub weighted_overlap_path: Option<PathBuf>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            courses_dir: PathBuf::from("./assets/courses"),
            embeddings_path: PathBuf::from("./assets/embeddings.bin"),
            overlap_path: None,
            weighted_overlap_path: None,
            duplicate_policy: DuplicatePolicy::FirstWins,
        }
    }
}

/// Relevance signal MMR re-ranks on top of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceSignal {
    Centroid,
    #[default]
    PairwiseMax,
    SumOfSquares,
}

/// Tunables shared by the ranking strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Cosine similarity to a disliked course at or above which a candidate is rejected
    pub reject_threshold: f32,
    /// Cosine similarity to a liked course at or above which a candidate counts as a near-duplicate
    pub near_duplicate_threshold: f32,
    /// Score multiplier for candidates whose best match is a single liked course
    pub single_target_penalty: f32,
    /// Total weight of disliked rows in keyword scoring, split across all dislikes
    pub dislike_weight: f32,
    pub mmr_lambda: f32,
    pub mmr_pool_size: usize,
    pub mmr_relevance: RelevanceSignal,
    /// Pair only the first this many liked courses in pairwise-combination
    /// scoring; every pair is used when unset
    pub max_pair_sources: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            reject_threshold: 0.9,
            near_duplicate_threshold: 0.94,
            single_target_penalty: 0.95,
            dislike_weight: 0.5,
            mmr_lambda: 0.75,
            mmr_pool_size: 200,
            mmr_relevance: RelevanceSignal::PairwiseMax,
            max_pair_sources: None,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        validate_lambda(self.mmr_lambda)?;
        for (name, value) in [
            ("reject_threshold", self.reject_threshold),
            ("near_duplicate_threshold", self.near_duplicate_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must lie in [-1, 1], got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.single_target_penalty) {
            return Err(Error::InvalidConfig(format!(
                "single_target_penalty must lie in [0, 1], got {}",
                self.single_target_penalty
            )));
        }
        if self.dislike_weight < 0.0 {
            return Err(Error::InvalidConfig("dislike_weight cannot be negative".into()));
        }
        Ok(())
    }

    /// Pool size clamped into the supported range
    pub fn clamped_pool_size(&self) -> usize {
        self.mmr_pool_size.clamp(MMR_POOL_MIN, MMR_POOL_MAX)
    }
}

/// MMR trade-off must satisfy `0 < lambda <= 1`
pub fn validate_lambda(lambda: f32) -> Result<()> {
    if lambda > 0.0 && lambda <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "lambda",
            reason: format!("must satisfy 0 < lambda <= 1, got {}", lambda),
        })
    }
}
