//! Learning effectiveness check - sends underperforming models back to
//! training.

use adaptix_core::{EngineConfig, EngineEvent, EventSink, ModelStatus};
use adaptix_registry::{ModelBackend, ModelMutation, ModelStore};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of one effectiveness sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrainSummary {
    /// Models inspected
    pub checked: usize,
    /// Models retrained back to ready
    pub retrained: usize,
    /// Models deprecated after a failed retrain
    pub deprecated: usize,
}

/// Watches ready models and retrains any whose accuracy fell below the
/// configured floor. Runs on its own cadence and never blocks decision
/// serving.
pub struct RetrainService {
    store: Arc<dyn ModelStore>,
    backend: Arc<dyn ModelBackend>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl RetrainService {
    /// Create a retrain service.
    pub fn new(
        store: Arc<dyn ModelStore>,
        backend: Arc<dyn ModelBackend>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            backend,
            sink,
            config,
        }
    }

    /// Run one sweep over all ready models.
    ///
    /// Each underperformer transitions ready -> retraining, then either
    /// back to ready with a patch version bump or to deprecated with an
    /// alert. A store or backend failure affects only the model at hand.
    pub async fn run_check(&self) -> RetrainSummary {
        let ready = match self.store.list_by_status(ModelStatus::Ready).await {
            Ok(models) => models,
            Err(e) => {
                error!(error = %e, "effectiveness check skipped, store unavailable");
                return RetrainSummary::default();
            }
        };

        let mut summary = RetrainSummary {
            checked: ready.len(),
            ..Default::default()
        };

        for model in ready {
            if model.accuracy >= self.config.retrain_floor {
                continue;
            }
            info!(
                model_id = %model.id,
                accuracy = model.accuracy,
                floor = self.config.retrain_floor,
                "accuracy below floor, retraining"
            );
            if self
                .store
                .update(model.id, ModelMutation::SetStatus(ModelStatus::Retraining))
                .await
                .is_err()
            {
                continue;
            }

            match self.backend.train(&model).await {
                Ok(report) => {
                    let steps = [
                        ModelMutation::SetAccuracy(report.accuracy),
                        ModelMutation::BumpPatchVersion,
                        ModelMutation::SetStatus(ModelStatus::Ready),
                    ];
                    let mut updated = None;
                    for step in steps {
                        match self.store.update(model.id, step).await {
                            Ok(m) => updated = Some(m),
                            Err(e) => {
                                error!(model_id = %model.id, error = %e, "retrain commit failed");
                                updated = None;
                                break;
                            }
                        }
                    }
                    if let Some(updated) = updated {
                        summary.retrained += 1;
                        self.sink.emit(EngineEvent::ModelRetrained {
                            model_id: updated.id,
                            version: updated.version.clone(),
                            accuracy: updated.accuracy,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
                Err(e) => {
                    error!(model_id = %model.id, error = %e, "retrain failed, deprecating");
                    let _ = self
                        .store
                        .update(model.id, ModelMutation::SetStatus(ModelStatus::Deprecated))
                        .await;
                    summary.deprecated += 1;
                    self.sink.emit(EngineEvent::ModelDeprecated {
                        model_id: model.id,
                        reason: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        }

        summary
    }
}
