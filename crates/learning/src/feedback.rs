//! Feedback loop - records decision outcomes and folds them into model
//! accuracy.

use crate::adaptive::AdaptiveStateController;
use adaptix_core::{
    DecisionId, EngineConfig, EngineEvent, EventSink, LearningEvent, ModelStatus,
};
use adaptix_fusion::DecisionHistory;
use adaptix_registry::{ModelMutation, ModelStore, StoreError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Error type for feedback operations.
pub type Result<T> = std::result::Result<T, LearningError>;

/// Errors raised by the feedback loop.
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    /// The decision is unknown or already evicted from history
    #[error("decision not found: {0}")]
    DecisionNotFound(DecisionId),

    /// Model store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records outcomes, updates model accuracy by EMA and feeds the
/// adaptive state controller.
pub struct FeedbackLoop {
    store: Arc<dyn ModelStore>,
    history: Arc<DecisionHistory>,
    sink: Arc<dyn EventSink>,
    controller: Arc<AdaptiveStateController>,
    queue: Mutex<Vec<LearningEvent>>,
    config: EngineConfig,
}

impl FeedbackLoop {
    /// Create a feedback loop over shared collaborators.
    pub fn new(
        store: Arc<dyn ModelStore>,
        history: Arc<DecisionHistory>,
        sink: Arc<dyn EventSink>,
        controller: Arc<AdaptiveStateController>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            history,
            sink,
            controller,
            queue: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Record the observed outcome of a decision.
    ///
    /// Computes the event accuracy and learning value, appends a
    /// [`LearningEvent`] to the queue and applies the EMA accuracy
    /// update to every ready model.
    pub async fn record_outcome(
        &self,
        decision_id: DecisionId,
        actual_outcome: f64,
        feedback: Option<String>,
    ) -> Result<LearningEvent> {
        let decision = self
            .history
            .find(decision_id)
            .await
            .ok_or(LearningError::DecisionNotFound(decision_id))?;

        let expected = decision.expected_outcome.performance;
        let actual = actual_outcome.clamp(0.0, 1.0);
        let gap = (expected - actual).abs();
        let accuracy = (1.0 - gap).clamp(0.0, 1.0);
        let learning_value = ((1.0 - decision.confidence) + gap) / 2.0;

        let event = LearningEvent {
            decision_id,
            actual_outcome: actual,
            expected_outcome: expected,
            accuracy,
            learning_value,
            feedback,
            recorded_at: chrono::Utc::now(),
        };

        self.queue.lock().await.push(event.clone());
        self.apply_ema(accuracy).await;

        self.sink.emit(EngineEvent::LearningRecorded {
            decision_id,
            accuracy,
            learning_value,
            timestamp: event.recorded_at,
        });
        debug!(%decision_id, accuracy, learning_value, "outcome recorded");

        Ok(event)
    }

    /// Fold one event accuracy into every ready model.
    ///
    /// The EMA keeps the new accuracy between the old value and the
    /// event value for any alpha in (0, 1); each model's update happens
    /// atomically inside the store.
    async fn apply_ema(&self, event_accuracy: f64) {
        let ready = match self.store.list_by_status(ModelStatus::Ready).await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "skipping EMA update, store unavailable");
                return;
            }
        };
        for model in ready {
            if let Err(e) = self
                .store
                .update(
                    model.id,
                    ModelMutation::ApplyEma {
                        event_accuracy,
                        alpha: self.config.ema_alpha,
                    },
                )
                .await
            {
                warn!(model_id = %model.id, error = %e, "EMA update failed");
            }
        }
    }

    /// Drain one batch of queued events into the adaptive state.
    ///
    /// EMA was already applied when each outcome was recorded; the batch
    /// pass consumes the queued events as performance samples for the
    /// learning-phase controller, then truncates the queue.
    pub async fn process_batch(&self) -> usize {
        let batch: Vec<LearningEvent> = {
            let mut queue = self.queue.lock().await;
            let take = queue.len().min(self.config.learning_batch_size);
            queue.drain(..take).collect()
        };

        if batch.is_empty() {
            return 0;
        }

        for event in &batch {
            self.controller.observe(event.accuracy).await;
        }
        let phase = self.controller.evaluate_phase().await;
        info!(
            processed = batch.len(),
            phase = %phase,
            "learning batch processed"
        );
        batch.len()
    }

    /// Number of events waiting for the next batch.
    pub async fn pending_events(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::{Decision, Model, ModelType, NullEventSink, RecommendedAction};
    use adaptix_registry::InMemoryModelStore;

    async fn fixture() -> (FeedbackLoop, Arc<InMemoryModelStore>, DecisionId) {
        let store = Arc::new(InMemoryModelStore::new());
        let model = Model::new(ModelType::Classification, "infrastructure")
            .with_accuracy(0.9)
            .with_status(ModelStatus::Ready);
        store.insert(model).await.unwrap();

        let history = Arc::new(DecisionHistory::new(8));
        let mut decision = Decision::new(RecommendedAction::Monitor, 0.6);
        decision.expected_outcome.performance = 0.8;
        let decision_id = decision.id;
        history.push(decision).await;

        let controller = Arc::new(AdaptiveStateController::new(EngineConfig::default()));
        let feedback = FeedbackLoop::new(
            store.clone(),
            history,
            Arc::new(NullEventSink),
            controller,
            EngineConfig::default(),
        );
        (feedback, store, decision_id)
    }

    #[tokio::test]
    async fn record_outcome_computes_accuracy_and_learning_value() {
        let (feedback, _, decision_id) = fixture().await;
        let event = feedback
            .record_outcome(decision_id, 0.6, Some("regressed".to_string()))
            .await
            .unwrap();

        // expected 0.8, actual 0.6: accuracy 0.8, learning (0.4 + 0.2)/2.
        assert!((event.accuracy - 0.8).abs() < 1e-9);
        assert!((event.learning_value - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ema_stays_between_old_and_event_accuracy() {
        let (feedback, store, decision_id) = fixture().await;
        feedback.record_outcome(decision_id, 0.2, None).await.unwrap();

        let models = store.list().await.unwrap();
        let accuracy = models[0].accuracy;
        // event accuracy is 0.4, old was 0.9.
        assert!(accuracy >= 0.4 && accuracy <= 0.9);
    }

    #[tokio::test]
    async fn unknown_decision_is_an_error() {
        let (feedback, _, _) = fixture().await;
        let err = feedback
            .record_outcome(DecisionId::new(), 0.5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LearningError::DecisionNotFound(_)));
    }

    #[tokio::test]
    async fn batch_drains_the_queue() {
        let (feedback, _, decision_id) = fixture().await;
        for _ in 0..3 {
            feedback.record_outcome(decision_id, 0.7, None).await.unwrap();
        }
        assert_eq!(feedback.pending_events().await, 3);

        let processed = feedback.process_batch().await;
        assert_eq!(processed, 3);
        assert_eq!(feedback.pending_events().await, 0);
    }
}
