//! Simulated model backend.
//!
//! Stands in for a real ML backend: training sleeps briefly and returns
//! a jittered accuracy, evaluation scores hyperparameters against fixed
//! sweet spots, inference delegates to the typed predictors. Control
//! plane code never depends on this type directly, only on
//! [`ModelBackend`].

use crate::predictors::ModelPredictor;
use adaptix_core::{FeatureVector, Model};
use adaptix_registry::{BackendError, ModelBackend, PredictionResult, TrainReport};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Hyperparameter sweet spots used by the simulated score: (name,
/// target, tolerance scale, weight).
const SWEET_SPOTS: [(&str, f64, f64, f64); 3] = [
    ("learning_rate", 0.01, 0.05, 0.2),
    ("batch_size", 64.0, 128.0, 0.15),
    ("regularization", 0.001, 0.01, 0.1),
];

/// Baseline evaluation score before hyperparameter contributions.
const BASE_SCORE: f64 = 0.55;

/// Simulated training/evaluation/inference backend.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    /// Simulated training duration
    train_delay: Duration,
}

impl SimulatedBackend {
    /// Create a backend with a short simulated training delay.
    pub fn new() -> Self {
        Self {
            train_delay: Duration::from_millis(20),
        }
    }

    /// Override the simulated training delay (tests use zero).
    pub fn with_train_delay(mut self, delay: Duration) -> Self {
        self.train_delay = delay;
        self
    }

    /// Deterministic part of the evaluation score.
    fn hyperparameter_score(model: &Model) -> f64 {
        let mut score = BASE_SCORE;
        for (name, target, scale, weight) in SWEET_SPOTS {
            let value = model.hyperparameters.get(name).copied().unwrap_or(0.0);
            let closeness = 1.0 / (1.0 + (value - target).abs() / scale);
            score += weight * closeness;
        }
        score.clamp(0.0, 1.0)
    }
}

#[async_trait]
impl ModelBackend for SimulatedBackend {
    async fn train(&self, model: &Model) -> Result<TrainReport, BackendError> {
        tokio::time::sleep(self.train_delay).await;
        let accuracy = rand::thread_rng().gen_range(0.82..0.95);
        tracing::debug!(
            model_id = %model.id,
            accuracy,
            "simulated training finished"
        );
        Ok(TrainReport {
            accuracy,
            duration_ms: self.train_delay.as_millis() as u64,
        })
    }

    async fn evaluate(&self, model: &Model) -> Result<f64, BackendError> {
        let base = Self::hyperparameter_score(model);
        let jitter = rand::thread_rng().gen_range(-0.005..0.005);
        Ok((base + jitter).clamp(0.0, 1.0))
    }

    async fn predict(
        &self,
        model: &Model,
        features: &FeatureVector,
    ) -> Result<PredictionResult, BackendError> {
        ModelPredictor::for_model(model).predict(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::ModelType;

    #[tokio::test]
    async fn train_reports_accuracy_in_simulated_band() {
        let backend = SimulatedBackend::new().with_train_delay(Duration::ZERO);
        let model = Model::new(ModelType::Classification, "infrastructure");
        let report = backend.train(&model).await.unwrap();
        assert!(report.accuracy >= 0.82 && report.accuracy < 0.95);
    }

    #[tokio::test]
    async fn evaluation_rewards_sweet_spot_hyperparameters() {
        let backend = SimulatedBackend::new();
        let tuned = Model::new(ModelType::Classification, "infrastructure")
            .with_hyperparameter("learning_rate", 0.01)
            .with_hyperparameter("batch_size", 64.0)
            .with_hyperparameter("regularization", 0.001);
        let untuned = Model::new(ModelType::Classification, "infrastructure")
            .with_hyperparameter("learning_rate", 0.9)
            .with_hyperparameter("batch_size", 2048.0)
            .with_hyperparameter("regularization", 0.5);

        let good = backend.evaluate(&tuned).await.unwrap();
        let bad = backend.evaluate(&untuned).await.unwrap();
        assert!(good > bad);
    }
}
