//! Model entity - the unit the registry owns and the engine dispatches to.

use crate::id::ModelId;
use crate::Time;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of model, drives predictor dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Scores the context and buckets it into an action
    Classification,
    /// Projects near-term metric trajectories
    Regression,
    /// Groups the context into a load regime
    Clustering,
    /// Flags features outside declared normal ranges
    AnomalyDetection,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Classification => write!(f, "classification"),
            ModelType::Regression => write!(f, "regression"),
            ModelType::Clustering => write!(f, "clustering"),
            ModelType::AnomalyDetection => write!(f, "anomaly_detection"),
        }
    }
}

/// Lifecycle status of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Initial training in progress
    Training,
    /// Serving predictions
    Ready,
    /// Accuracy fell below the retrain floor, being retrained
    Retraining,
    /// Retrain failed, excluded from serving
    Deprecated,
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Training => write!(f, "training"),
            ModelStatus::Ready => write!(f, "ready"),
            ModelStatus::Retraining => write!(f, "retraining"),
            ModelStatus::Deprecated => write!(f, "deprecated"),
        }
    }
}

/// Offline evaluation metrics for a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Precision on the validation set
    pub precision: f64,
    /// Recall on the validation set
    pub recall: f64,
    /// F1 score
    pub f1: f64,
    /// Area under ROC curve (classification only)
    pub auc: Option<f64>,
    /// Mean squared error (regression only)
    pub mse: Option<f64>,
}

/// A registered model.
///
/// Accuracy is mutated by the feedback loop (EMA), status and version by
/// the retrain path. All mutations go through the store so they stay
/// atomic per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Unique identifier
    pub id: ModelId,

    /// Model kind
    pub model_type: ModelType,

    /// Domain the model was trained for (e.g. "infrastructure")
    pub domain: String,

    /// Version string, "major.minor.patch"
    pub version: String,

    /// Live accuracy estimate in [0, 1]
    pub accuracy: f64,

    /// Tunable hyperparameters
    pub hyperparameters: HashMap<String, f64>,

    /// Offline evaluation metrics
    pub metrics: ModelMetrics,

    /// Lifecycle status
    pub status: ModelStatus,

    /// Creation time
    pub created_at: Time,

    /// Last mutation time
    pub updated_at: Time,
}

impl Model {
    /// Create a new model in `Training` status.
    pub fn new(model_type: ModelType, domain: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ModelId::new(),
            model_type,
            domain: domain.into(),
            version: "1.0.0".to_string(),
            accuracy: 0.0,
            hyperparameters: HashMap::new(),
            metrics: ModelMetrics::default(),
            status: ModelStatus::Training,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the initial accuracy, clamped to [0, 1].
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy.clamp(0.0, 1.0);
        self
    }

    /// Mark the model ready for serving.
    pub fn with_status(mut self, status: ModelStatus) -> Self {
        self.status = status;
        self
    }

    /// Set a hyperparameter.
    pub fn with_hyperparameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.hyperparameters.insert(name.into(), value);
        self
    }

    /// Increment the patch component of the version, e.g. "1.0.3" -> "1.0.4".
    ///
    /// Unparseable versions reset to "1.0.1" rather than erroring.
    pub fn bump_patch_version(&mut self) {
        let parts: Vec<u64> = self
            .version
            .split('.')
            .filter_map(|p| p.parse().ok())
            .collect();
        self.version = match parts.as_slice() {
            [major, minor, patch] => format!("{}.{}.{}", major, minor, patch + 1),
            _ => "1.0.1".to_string(),
        };
        self.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_patch_increments_last_component() {
        let mut model = Model::new(ModelType::Classification, "infrastructure");
        model.version = "2.1.7".to_string();
        model.bump_patch_version();
        assert_eq!(model.version, "2.1.8");
    }

    #[test]
    fn bump_patch_recovers_from_garbage_version() {
        let mut model = Model::new(ModelType::Regression, "infrastructure");
        model.version = "not-a-version".to_string();
        model.bump_patch_version();
        assert_eq!(model.version, "1.0.1");
    }

    #[test]
    fn accuracy_is_clamped() {
        let model = Model::new(ModelType::Clustering, "infrastructure").with_accuracy(1.7);
        assert_eq!(model.accuracy, 1.0);
    }
}
