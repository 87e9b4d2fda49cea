//! Model backend abstraction.
//!
//! The engine's control plane (registry, fusion, evolution, scheduling)
//! never touches model internals. Training, evaluation and inference go
//! through this trait so a genuine ML backend can be substituted without
//! changing control-plane logic.

use adaptix_core::{FeatureVector, Model, RecommendedAction};
use async_trait::async_trait;

/// Error type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors raised by a model backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Training did not converge or was rejected
    #[error("training failed: {0}")]
    TrainingFailed(String),

    /// Inference failed for this model
    #[error("prediction failed: {0}")]
    PredictionFailed(String),

    /// Evaluation could not be measured
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// What one model proposes for a decision request.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Proposed action
    pub action: RecommendedAction,

    /// Model confidence in [0, 1]
    pub confidence: f64,

    /// One-line explanation for the reasoning trail
    pub reasoning: String,
}

/// Report returned by a completed training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Accuracy measured on held-out data
    pub accuracy: f64,

    /// Wall-clock training time, milliseconds
    pub duration_ms: u64,
}

/// Pluggable model backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Train (or retrain) a model, returning the measured accuracy.
    async fn train(&self, model: &Model) -> Result<TrainReport>;

    /// Measure the performance score of a model under its current
    /// hyperparameters, in [0, 1]. Used by the tuner and the optimizer.
    async fn evaluate(&self, model: &Model) -> Result<f64>;

    /// Run inference for one model against extracted features.
    async fn predict(&self, model: &Model, features: &FeatureVector) -> Result<PredictionResult>;
}
