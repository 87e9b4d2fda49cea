//! Model store abstraction.

use adaptix_core::{Model, ModelId, ModelStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Model does not exist
    #[error("model not found: {0}")]
    NotFound(ModelId),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A single atomic mutation of one model entry.
///
/// Mutations are applied under the store's lock so an entry is never
/// observed half-updated.
#[derive(Debug, Clone)]
pub enum ModelMutation {
    /// Replace the accuracy with a clamped value
    SetAccuracy(f64),
    /// Fold an event accuracy in via exponential moving average
    ApplyEma {
        /// Accuracy of the learning event
        event_accuracy: f64,
        /// Smoothing factor in (0, 1)
        alpha: f64,
    },
    /// Move the model to a new lifecycle status
    SetStatus(ModelStatus),
    /// Increment the patch version (after a successful retrain)
    BumpPatchVersion,
    /// Replace the hyperparameter set
    SetHyperparameters(HashMap<String, f64>),
}

/// Storage abstraction for registered models.
///
/// The registry is shared between request-driven calls and background
/// tasks, so every method takes `&self` and implementations guard their
/// state internally.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Insert a model (replaces an existing entry with the same id).
    async fn insert(&self, model: Model) -> Result<()>;

    /// Load a model by id.
    async fn get(&self, id: ModelId) -> Result<Option<Model>>;

    /// List all models.
    async fn list(&self) -> Result<Vec<Model>>;

    /// List models in a given status.
    async fn list_by_status(&self, status: ModelStatus) -> Result<Vec<Model>>;

    /// Apply one atomic mutation and return the updated model.
    async fn update(&self, id: ModelId, mutation: ModelMutation) -> Result<Model>;

    /// Remove a model.
    async fn remove(&self, id: ModelId) -> Result<()>;
}

/// In-memory model store behind a single RwLock.
#[derive(Default)]
pub struct InMemoryModelStore {
    models: Arc<RwLock<HashMap<ModelId, Model>>>,
}

impl InMemoryModelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_mutation(model: &mut Model, mutation: ModelMutation) {
    match mutation {
        ModelMutation::SetAccuracy(accuracy) => {
            model.accuracy = accuracy.clamp(0.0, 1.0);
        }
        ModelMutation::ApplyEma {
            event_accuracy,
            alpha,
        } => {
            let event_accuracy = event_accuracy.clamp(0.0, 1.0);
            model.accuracy = alpha * event_accuracy + (1.0 - alpha) * model.accuracy;
        }
        ModelMutation::SetStatus(status) => {
            model.status = status;
        }
        ModelMutation::BumpPatchVersion => {
            model.bump_patch_version();
        }
        ModelMutation::SetHyperparameters(params) => {
            model.hyperparameters = params;
        }
    }
    model.updated_at = chrono::Utc::now();
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn insert(&self, model: Model) -> Result<()> {
        let mut models = self.models.write().await;
        models.insert(model.id, model);
        Ok(())
    }

    async fn get(&self, id: ModelId) -> Result<Option<Model>> {
        let models = self.models.read().await;
        Ok(models.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Model>> {
        let models = self.models.read().await;
        Ok(models.values().cloned().collect())
    }

    async fn list_by_status(&self, status: ModelStatus) -> Result<Vec<Model>> {
        let models = self.models.read().await;
        Ok(models
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect())
    }

    async fn update(&self, id: ModelId, mutation: ModelMutation) -> Result<Model> {
        let mut models = self.models.write().await;
        let model = models.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply_mutation(model, mutation);
        Ok(model.clone())
    }

    async fn remove(&self, id: ModelId) -> Result<()> {
        let mut models = self.models.write().await;
        models.remove(&id).ok_or(StoreError::NotFound(id))?;
        Ok(())
    }
}
