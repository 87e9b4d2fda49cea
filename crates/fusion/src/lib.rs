//! Decision fusion: feature extraction, per-model-type predictors, vote
//! fusion, caching and the rule-based fallback.

mod cache;
mod engine;
mod features;
mod history;
mod predictors;
mod simulated;

pub use cache::{fingerprint, CacheError, DecisionCache, InMemoryDecisionCache};
pub use engine::FusionEngine;
pub use features::FeatureExtractor;
pub use history::DecisionHistory;
pub use predictors::{classification_score, ModelPredictor, CLASSIFICATION_WEIGHTS};
pub use simulated::SimulatedBackend;
