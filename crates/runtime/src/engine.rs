//! Engine assembly - wires every subsystem together and drives the
//! background cadences.

use crate::sink::LogEventSink;
use crate::tasks::{spawn_periodic, TaskHandle};
use adaptix_core::{
    Decision, DecisionId, DecisionRequest, Direction, EngineConfig, EventSink, FailurePrediction,
    LearningEvent, LearningPhase, Model, ModelStatus, ModelType, Time,
};
use adaptix_evolution::{EvolutionEngine, HyperparameterTuner, TuningError, TuningReport};
use adaptix_fusion::{DecisionHistory, FusionEngine, InMemoryDecisionCache, SimulatedBackend};
use adaptix_learning::{AdaptiveStateController, FeedbackLoop, RetrainService};
use adaptix_maintenance::{FailurePredictor, HealthMonitor, MaintenanceScheduler};
use adaptix_registry::{InMemoryModelStore, ModelStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Component id the engine reports its own health under.
const SELF_COMPONENT: &str = "engine-core";

/// Initial accuracy given to the seeded models.
const SEED_ACCURACY: [(ModelType, f64); 4] = [
    (ModelType::Classification, 0.87),
    (ModelType::Regression, 0.84),
    (ModelType::Clustering, 0.82),
    (ModelType::AnomalyDetection, 0.85),
];

/// Point-in-time view of the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Registered models, any status
    pub total_models: usize,

    /// Models currently serving
    pub ready_models: usize,

    /// Decisions retained in history
    pub decisions_recorded: usize,

    /// Outcomes queued for the next learning batch
    pub pending_feedback: usize,

    /// Current learning phase
    pub learning_phase: LearningPhase,

    /// Current exploration rate
    pub exploration_rate: f64,

    /// Evolutionary population size
    pub population_size: usize,

    /// Components under health monitoring
    pub monitored_components: usize,

    /// Maintenance schedules in the book
    pub schedules: usize,

    /// Snapshot time
    pub generated_at: Time,
}

/// The assembled engine.
///
/// Owns every subsystem and the background tasks; callers interact
/// through the handful of methods below. All state is in memory.
pub struct AdaptiveEngine {
    store: Arc<dyn ModelStore>,
    fusion: Arc<FusionEngine>,
    feedback: Arc<FeedbackLoop>,
    controller: Arc<AdaptiveStateController>,
    retrain: Arc<RetrainService>,
    evolution: Arc<EvolutionEngine>,
    tuner: Arc<HyperparameterTuner>,
    monitor: Arc<HealthMonitor>,
    predictor: Arc<FailurePredictor>,
    scheduler: Arc<MaintenanceScheduler>,
    history: Arc<DecisionHistory>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<TaskHandle>>,
    config: EngineConfig,
}

impl AdaptiveEngine {
    /// Assemble an engine that logs its events through tracing.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(Arc::new(LogEventSink), config)
    }

    /// Assemble an engine with a caller-supplied event sink.
    pub fn with_sink(sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        let store: Arc<dyn ModelStore> = Arc::new(InMemoryModelStore::new());
        let backend = Arc::new(SimulatedBackend::new());
        let cache = Arc::new(InMemoryDecisionCache::new());
        let history = Arc::new(DecisionHistory::new(config.decision_history_cap));
        let controller = Arc::new(AdaptiveStateController::new(config.clone()));

        let fusion = Arc::new(FusionEngine::new(
            store.clone(),
            backend.clone(),
            cache,
            sink.clone(),
            history.clone(),
            config.clone(),
        ));
        let feedback = Arc::new(FeedbackLoop::new(
            store.clone(),
            history.clone(),
            sink.clone(),
            controller.clone(),
            config.clone(),
        ));
        let retrain = Arc::new(RetrainService::new(
            store.clone(),
            backend.clone(),
            sink.clone(),
            config.clone(),
        ));
        let evolution = Arc::new(EvolutionEngine::new(sink.clone(), config.clone()));
        let tuner = Arc::new(HyperparameterTuner::new(
            store.clone(),
            backend,
            sink.clone(),
            config.clone(),
        ));
        let monitor = Arc::new(HealthMonitor::new(sink.clone(), config.clone()));
        let scheduler = Arc::new(MaintenanceScheduler::new(sink.clone(), config.clone()));
        let predictor = Arc::new(FailurePredictor::new(
            monitor.clone(),
            scheduler.clone(),
            sink,
            config.clone(),
        ));

        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            fusion,
            feedback,
            controller,
            retrain,
            evolution,
            tuner,
            monitor,
            predictor,
            scheduler,
            history,
            shutdown,
            tasks: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Register one ready model per type so decisions have an ensemble
    /// to fan out to.
    pub async fn seed_default_models(&self) -> Result<(), StoreError> {
        for (model_type, accuracy) in SEED_ACCURACY {
            let model = Model::new(model_type, "infrastructure")
                .with_accuracy(accuracy)
                .with_status(ModelStatus::Ready)
                .with_hyperparameter("learning_rate", 0.02)
                .with_hyperparameter("batch_size", 64.0)
                .with_hyperparameter("regularization", 0.005);
            self.store.insert(model).await?;
        }
        info!(models = SEED_ACCURACY.len(), "default models registered");
        Ok(())
    }

    /// Start the background cadences.
    ///
    /// Idempotent only across a shutdown; calling it twice on a running
    /// engine doubles the tasks, so don't.
    pub async fn start(&self) {
        if self.evolution.population_size().await == 0 {
            self.evolution.seed_population(self.config.pool_size).await;
        }

        let cadences = &self.config.cadences;
        let mut tasks = self.tasks.lock().await;

        tasks.push(spawn_periodic(
            "self-health",
            Duration::from_secs(cadences.health_ingestion_secs),
            self.shutdown.subscribe(),
            {
                let store = self.store.clone();
                let monitor = self.monitor.clone();
                let feedback = self.feedback.clone();
                move || {
                    let store = store.clone();
                    let monitor = monitor.clone();
                    let feedback = feedback.clone();
                    async move {
                        sample_self_health(&*store, &monitor, &feedback).await;
                    }
                }
            },
        ));

        tasks.push(spawn_periodic(
            "failure-prediction",
            Duration::from_secs(cadences.prediction_secs),
            self.shutdown.subscribe(),
            {
                let predictor = self.predictor.clone();
                let scheduler = self.scheduler.clone();
                move || {
                    let predictor = predictor.clone();
                    let scheduler = scheduler.clone();
                    async move {
                        predictor.run_cycle().await;
                        if !scheduler.schedules().await.is_empty() {
                            scheduler.optimize().await;
                        }
                    }
                }
            },
        ));

        tasks.push(spawn_periodic(
            "effectiveness-check",
            Duration::from_secs(cadences.effectiveness_secs),
            self.shutdown.subscribe(),
            {
                let retrain = self.retrain.clone();
                move || {
                    let retrain = retrain.clone();
                    async move {
                        retrain.run_check().await;
                    }
                }
            },
        ));

        tasks.push(spawn_periodic(
            "batch-feedback",
            Duration::from_secs(cadences.batch_feedback_secs),
            self.shutdown.subscribe(),
            {
                let feedback = self.feedback.clone();
                move || {
                    let feedback = feedback.clone();
                    async move {
                        feedback.process_batch().await;
                    }
                }
            },
        ));

        tasks.push(spawn_periodic(
            "evolution",
            Duration::from_secs(cadences.evolution_secs),
            self.shutdown.subscribe(),
            {
                let evolution = self.evolution.clone();
                move || {
                    let evolution = evolution.clone();
                    async move {
                        if let Err(e) = evolution.run_cycle().await {
                            debug!(error = %e, "evolution cycle skipped");
                        }
                    }
                }
            },
        ));

        tasks.push(spawn_periodic(
            "hyperparameter-tuning",
            Duration::from_secs(cadences.tuning_secs),
            self.shutdown.subscribe(),
            {
                let tuner = self.tuner.clone();
                let evolution = self.evolution.clone();
                move || {
                    let tuner = tuner.clone();
                    let evolution = evolution.clone();
                    async move {
                        // Tune toward the evolution engine's standing
                        // maximization objectives.
                        let targets: HashMap<String, f64> = evolution
                            .objectives()
                            .await
                            .into_iter()
                            .filter(|o| o.target == Direction::Maximize)
                            .map(|o| (o.name, o.target_value))
                            .collect();
                        match tuner.auto_tune(&targets, true).await {
                            Ok(report) => {
                                info!(improvement = report.improvement_score, "tuning run done")
                            }
                            Err(TuningError::NoReadyModel) => {
                                debug!("tuning skipped, no ready model")
                            }
                            Err(e) => warn!(error = %e, "tuning run failed"),
                        }
                    }
                }
            },
        ));

        info!(tasks = tasks.len(), "background cadences started");
    }

    /// Signal every background task and wait for them to exit.
    pub async fn shutdown(&self) {
        self.shutdown.send(true).ok();
        let tasks: Vec<TaskHandle> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            task.join().await;
        }
        info!("engine stopped");
    }

    /// Produce a decision for a request. Never fails.
    pub async fn decide(&self, request: &DecisionRequest) -> Decision {
        self.fusion.decide(request).await
    }

    /// Record the observed outcome of a past decision.
    pub async fn record_outcome(
        &self,
        decision_id: DecisionId,
        actual_outcome: f64,
        feedback: Option<String>,
    ) -> adaptix_learning::Result<LearningEvent> {
        self.feedback
            .record_outcome(decision_id, actual_outcome, feedback)
            .await
    }

    /// Ingest health metrics for an external component.
    pub async fn ingest_metrics(&self, component_id: &str, metrics: HashMap<String, f64>) {
        self.monitor
            .ingest_metrics(component_id, metrics, chrono::Utc::now())
            .await;
    }

    /// Latest failure forecast for a component, if one exists.
    pub async fn forecast(&self, component_id: &str) -> Option<FailurePrediction> {
        self.predictor.forecast(component_id).await
    }

    /// Run one tuning pass on the best ready model, scored against the
    /// requested target metrics.
    pub async fn tune(
        &self,
        target_metrics: &HashMap<String, f64>,
        commit: bool,
    ) -> Result<TuningReport, TuningError> {
        self.tuner.auto_tune(target_metrics, commit).await
    }

    /// Snapshot the engine.
    pub async fn status(&self) -> EngineStatus {
        let models = self.store.list().await.unwrap_or_default();
        let ready = models
            .iter()
            .filter(|m| m.status == ModelStatus::Ready)
            .count();
        let learning = self.controller.snapshot().await;

        EngineStatus {
            total_models: models.len(),
            ready_models: ready,
            decisions_recorded: self.history.len().await,
            pending_feedback: self.feedback.pending_events().await,
            learning_phase: learning.phase,
            exploration_rate: learning.exploration_rate,
            population_size: self.evolution.population_size().await,
            monitored_components: self.monitor.components().await.len(),
            schedules: self.scheduler.schedules().await.len(),
            generated_at: chrono::Utc::now(),
        }
    }
}

/// Derive the engine's own health sample from registry and feedback
/// state and feed it through the regular ingestion path.
async fn sample_self_health(
    store: &dyn ModelStore,
    monitor: &HealthMonitor,
    feedback: &FeedbackLoop,
) {
    let models = store.list().await.unwrap_or_default();
    let availability = if models.is_empty() {
        100.0
    } else {
        let ready = models
            .iter()
            .filter(|m| m.status == ModelStatus::Ready)
            .count();
        ready as f64 / models.len() as f64 * 100.0
    };
    let backlog = feedback.pending_events().await;
    let backlog_health = (100.0 - backlog as f64).max(0.0);

    monitor
        .ingest_metrics(
            SELF_COMPONENT,
            HashMap::from([
                ("model_availability".to_string(), availability),
                ("feedback_backlog".to_string(), backlog_health),
            ]),
            chrono::Utc::now(),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::NullEventSink;

    fn request() -> DecisionRequest {
        DecisionRequest {
            real_time_metrics: HashMap::from([
                ("cpu_usage".to_string(), 0.85),
                ("memory_usage".to_string(), 0.85),
                ("response_time".to_string(), 100.0),
                ("error_rate".to_string(), 0.02),
                ("system_load".to_string(), 0.5),
            ]),
            priority: 3,
            ..Default::default()
        }
    }

    fn engine() -> AdaptiveEngine {
        AdaptiveEngine::with_sink(Arc::new(NullEventSink), EngineConfig::default())
    }

    #[tokio::test]
    async fn seeded_engine_serves_decisions() {
        let engine = engine();
        engine.seed_default_models().await.unwrap();

        let decision = engine.decide(&request()).await;
        assert!(decision.confidence > 0.0);

        let status = engine.status().await;
        assert_eq!(status.total_models, 4);
        assert_eq!(status.ready_models, 4);
        assert_eq!(status.decisions_recorded, 1);
    }

    #[tokio::test]
    async fn outcome_feeds_the_learning_queue() {
        let engine = engine();
        engine.seed_default_models().await.unwrap();

        let decision = engine.decide(&request()).await;
        let event = engine
            .record_outcome(decision.id, 0.7, Some("observed".to_string()))
            .await
            .unwrap();
        assert!(event.accuracy >= 0.0 && event.accuracy <= 1.0);
        assert_eq!(engine.status().await.pending_feedback, 1);
    }

    #[tokio::test]
    async fn metrics_ingestion_shows_up_in_status() {
        let engine = engine();
        engine
            .ingest_metrics("db-1", HashMap::from([("availability".to_string(), 95.0)]))
            .await;
        assert_eq!(engine.status().await.monitored_components, 1);
    }

    #[tokio::test]
    async fn tuning_reports_against_requested_targets() {
        let engine = engine();
        engine.seed_default_models().await.unwrap();

        let targets = HashMap::from([("precision".to_string(), 0.9)]);
        let report = engine.tune(&targets, false).await.unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("precision")));
    }

    #[tokio::test]
    async fn start_and_shutdown_are_clean() {
        let engine = engine();
        engine.seed_default_models().await.unwrap();
        engine.start().await;
        assert!(engine.status().await.population_size > 0);
        engine.shutdown().await;
        assert!(engine.tasks.lock().await.is_empty());
    }
}
