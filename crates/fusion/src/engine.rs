//! The decision fusion engine.
//!
//! Fans a request out to every ready model, fuses the votes into one
//! recommendation with alternatives and a risk assessment, and caches
//! the result by context fingerprint. Never fails a caller: with no
//! usable model it degrades to a rule-based decision.

use crate::cache::{fingerprint, DecisionCache};
use crate::features::FeatureExtractor;
use crate::history::DecisionHistory;
use adaptix_core::{
    Alternative, Decision, DecisionRequest, EngineConfig, EngineEvent, EventSink, ExpectedOutcome,
    FeatureVector, RecommendedAction, RiskAssessment, RiskLevel,
};
use adaptix_registry::{ModelBackend, ModelStore, PredictionResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Ensemble decision engine.
pub struct FusionEngine {
    store: Arc<dyn ModelStore>,
    backend: Arc<dyn ModelBackend>,
    cache: Arc<dyn DecisionCache>,
    sink: Arc<dyn EventSink>,
    history: Arc<DecisionHistory>,
    extractor: FeatureExtractor,
    config: EngineConfig,
}

impl FusionEngine {
    /// Create a fusion engine over shared collaborators.
    pub fn new(
        store: Arc<dyn ModelStore>,
        backend: Arc<dyn ModelBackend>,
        cache: Arc<dyn DecisionCache>,
        sink: Arc<dyn EventSink>,
        history: Arc<DecisionHistory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            backend,
            cache,
            sink,
            history,
            extractor: FeatureExtractor::new(),
            config,
        }
    }

    /// Produce a decision for a request.
    ///
    /// Cache hits return the stored decision unchanged without invoking
    /// any model. This method never fails: model, store and cache
    /// problems all degrade to the rule-based fallback.
    pub async fn decide(&self, request: &DecisionRequest) -> Decision {
        let key = fingerprint(request);

        match self.cache.get(&key).await {
            Ok(Some(decision)) => {
                debug!(%key, "decision cache hit");
                return decision;
            }
            Ok(None) => {}
            Err(e) => warn!(%key, error = %e, "cache read failed, treating as miss"),
        }

        let features = self.extractor.extract(request);
        let predictions = self.collect_predictions(&features).await;

        let decision = if predictions.is_empty() {
            info!("no usable model predictions, using rule-based fallback");
            self.fallback_decision(&features)
        } else {
            self.fuse(&features, predictions)
        };

        if let Err(e) = self
            .cache
            .set(
                &key,
                decision.clone(),
                Duration::from_secs(self.config.cache_ttl_secs),
            )
            .await
        {
            warn!(%key, error = %e, "cache write failed, continuing uncached");
        }

        self.history.push(decision.clone()).await;
        self.sink.emit(EngineEvent::DecisionMade {
            decision_id: decision.id,
            recommendation: decision.recommendation,
            confidence: decision.confidence,
            timestamp: decision.created_at,
        });

        decision
    }

    /// Fan out to every ready model concurrently. Each call gets its own
    /// timeout; a slow or failing model is skipped, not fatal.
    async fn collect_predictions(&self, features: &FeatureVector) -> Vec<PredictionResult> {
        let ready = match self
            .store
            .list_by_status(adaptix_core::ModelStatus::Ready)
            .await
        {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "model store unavailable");
                return Vec::new();
            }
        };

        let timeout = Duration::from_millis(self.config.model_timeout_ms);
        let mut tasks = JoinSet::new();
        for model in ready {
            let backend = Arc::clone(&self.backend);
            let features = features.clone();
            tasks.spawn(async move {
                let id = model.id;
                let outcome =
                    tokio::time::timeout(timeout, backend.predict(&model, &features)).await;
                (id, outcome)
            });
        }

        let mut predictions = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Ok(prediction)))) => predictions.push(prediction),
                Ok((id, Ok(Err(e)))) => warn!(model_id = %id, error = %e, "model skipped"),
                Ok((id, Err(_))) => warn!(model_id = %id, "model timed out, skipped"),
                Err(e) => warn!(error = %e, "prediction task panicked, skipped"),
            }
        }
        predictions
    }

    /// Tally votes per action and build the fused decision.
    fn fuse(&self, features: &FeatureVector, predictions: Vec<PredictionResult>) -> Decision {
        let mut tally: HashMap<RecommendedAction, (usize, f64)> = HashMap::new();
        let mut reasoning = Vec::new();
        for prediction in &predictions {
            let entry = tally.entry(prediction.action).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += prediction.confidence;
            reasoning.push(prediction.reasoning.clone());
        }

        // count x average confidence collapses to the summed confidence.
        let mut ranked: Vec<(RecommendedAction, usize, f64)> = tally
            .into_iter()
            .map(|(action, (votes, total))| (action, votes, total))
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2));

        let (action, votes, total) = ranked[0];
        let confidence = (total / votes as f64).clamp(0.0, 1.0);
        reasoning.push(format!(
            "fused {} predictions, {action} won with {votes} vote(s)",
            predictions.len()
        ));

        let alternatives = ranked
            .iter()
            .skip(1)
            .take(3)
            .map(|(action, votes, total)| Alternative {
                action: *action,
                confidence: total / *votes as f64,
                votes: *votes,
            })
            .collect();

        let mut decision = Decision::new(action, confidence);
        decision.reasoning = reasoning;
        decision.alternatives = alternatives;
        decision.risk = assess_risk(features, confidence);
        decision.expected_outcome = expected_outcome(features, confidence, action);
        decision.required_actions = required_actions(action);
        self.validate(decision)
    }

    /// Confidence floor: below it the recommendation is not safe to
    /// automate and gets downgraded to a human escalation.
    fn validate(&self, mut decision: Decision) -> Decision {
        if decision.confidence < self.config.low_confidence_floor {
            decision.reasoning.push(format!(
                "confidence {:.2} below {:.2}, escalating to human review",
                decision.confidence, self.config.low_confidence_floor
            ));
            decision.recommendation = RecommendedAction::EscalateToHuman;
            decision.risk.level = RiskLevel::High;
            decision
                .risk
                .factors
                .push("confidence below automation floor".to_string());
            decision.required_actions = required_actions(RecommendedAction::EscalateToHuman);
        }
        decision
    }

    /// Fixed rule-based decision from raw thresholds. Used when zero
    /// models are ready or every prediction failed.
    fn fallback_decision(&self, features: &FeatureVector) -> Decision {
        let (action, confidence, reason) =
            if features.cpu_usage > 0.85 || features.memory_usage > 0.9 {
                (
                    RecommendedAction::ScaleUp,
                    0.7,
                    "resource pressure above fallback thresholds",
                )
            } else if features.error_rate > 0.1 {
                (
                    RecommendedAction::Monitor,
                    0.65,
                    "elevated error rate without model coverage",
                )
            } else if features.cpu_usage < 0.2 && features.memory_usage < 0.3 {
                (
                    RecommendedAction::ScaleDown,
                    0.6,
                    "sustained low utilisation",
                )
            } else {
                (RecommendedAction::Maintain, 0.5, "metrics within bounds")
            };

        let mut decision = Decision::new(action, confidence);
        decision
            .reasoning
            .push("no ready models, rule-based fallback".to_string());
        decision.reasoning.push(reason.to_string());
        decision.risk = assess_risk(features, confidence);
        decision.expected_outcome = expected_outcome(features, confidence, action);
        decision.required_actions = required_actions(action);
        self.validate(decision)
    }
}

/// Rule-based risk assessment: one factor is medium, two or more high.
fn assess_risk(features: &FeatureVector, confidence: f64) -> RiskAssessment {
    let mut factors = Vec::new();
    let mut mitigations = Vec::new();

    if features.cpu_usage > 0.8 {
        factors.push(format!("cpu usage high ({:.0}%)", features.cpu_usage * 100.0));
        mitigations.push("pre-provision burst capacity before acting".to_string());
    }
    if features.memory_usage > 0.85 {
        factors.push(format!(
            "memory usage high ({:.0}%)",
            features.memory_usage * 100.0
        ));
        mitigations.push("watch for OOM kills during the change".to_string());
    }
    if features.error_rate > 0.05 {
        factors.push(format!(
            "error rate elevated ({:.1}%)",
            features.error_rate * 100.0
        ));
        mitigations.push("roll out behind a canary".to_string());
    }
    if confidence < 0.5 {
        factors.push("model confidence is low".to_string());
        mitigations.push("keep an operator in the loop".to_string());
    }

    let level = match factors.len() {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        _ => RiskLevel::High,
    };

    RiskAssessment {
        level,
        factors,
        mitigations,
    }
}

fn expected_outcome(
    features: &FeatureVector,
    confidence: f64,
    action: RecommendedAction,
) -> ExpectedOutcome {
    let performance = (confidence * 0.6 + (1.0 - features.system_load) * 0.4).clamp(0.0, 1.0);
    ExpectedOutcome {
        performance,
        description: format!("{action} expected to hold performance near {performance:.2}"),
    }
}

fn required_actions(action: RecommendedAction) -> Vec<String> {
    match action {
        RecommendedAction::ScaleUp => vec![
            "provision additional capacity".to_string(),
            "verify autoscaling limits".to_string(),
        ],
        RecommendedAction::ScaleDown => vec![
            "drain surplus instances".to_string(),
            "confirm headroom after shrink".to_string(),
        ],
        RecommendedAction::OptimizeCache => vec![
            "review cache hit rates".to_string(),
            "adjust TTLs and eviction policy".to_string(),
        ],
        RecommendedAction::Monitor => vec!["tighten alerting on the flagged metrics".to_string()],
        RecommendedAction::Maintain => Vec::new(),
        RecommendedAction::EscalateToHuman => {
            vec!["page the on-call operator for review".to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryDecisionCache;
    use adaptix_core::{
        FeatureVector, Model, ModelStatus, ModelType, NullEventSink,
    };
    use adaptix_registry::{BackendError, InMemoryModelStore, TrainReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts predict calls and answers with a fixed vote.
    struct CountingBackend {
        calls: AtomicUsize,
        action: RecommendedAction,
        confidence: f64,
        fail: bool,
    }

    impl CountingBackend {
        fn voting(action: RecommendedAction, confidence: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                action,
                confidence,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                action: RecommendedAction::Maintain,
                confidence: 0.5,
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ModelBackend for CountingBackend {
        async fn train(&self, _model: &Model) -> Result<TrainReport, BackendError> {
            Ok(TrainReport {
                accuracy: 0.9,
                duration_ms: 0,
            })
        }

        async fn evaluate(&self, _model: &Model) -> Result<f64, BackendError> {
            Ok(0.9)
        }

        async fn predict(
            &self,
            _model: &Model,
            _features: &FeatureVector,
        ) -> Result<PredictionResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::PredictionFailed("boom".to_string()));
            }
            Ok(PredictionResult {
                action: self.action,
                confidence: self.confidence,
                reasoning: "test vote".to_string(),
            })
        }
    }

    async fn engine_with(
        backend: Arc<CountingBackend>,
        ready_models: usize,
    ) -> (FusionEngine, Arc<InMemoryModelStore>) {
        let store = Arc::new(InMemoryModelStore::new());
        for _ in 0..ready_models {
            store
                .insert(
                    Model::new(ModelType::Classification, "infrastructure")
                        .with_accuracy(0.9)
                        .with_status(ModelStatus::Ready),
                )
                .await
                .unwrap();
        }
        let engine = FusionEngine::new(
            store.clone(),
            backend,
            Arc::new(InMemoryDecisionCache::new()),
            Arc::new(NullEventSink),
            Arc::new(DecisionHistory::new(16)),
            EngineConfig::default(),
        );
        (engine, store)
    }

    fn request() -> DecisionRequest {
        let mut request = DecisionRequest::default();
        request
            .real_time_metrics
            .insert("cpu_usage".to_string(), 0.5);
        request
            .real_time_metrics
            .insert("memory_usage".to_string(), 0.5);
        request.priority = 3;
        request
    }

    #[tokio::test]
    async fn decision_confidence_and_risk_are_bounded() {
        let backend = Arc::new(CountingBackend::voting(RecommendedAction::ScaleUp, 0.9));
        let (engine, _) = engine_with(backend, 3).await;

        let decision = engine.decide(&request()).await;
        assert!(decision.confidence >= 0.0 && decision.confidence <= 1.0);
        assert!(matches!(
            decision.risk.level,
            RiskLevel::Low | RiskLevel::Medium | RiskLevel::High
        ));
    }

    #[tokio::test]
    async fn repeated_request_hits_cache_without_model_calls() {
        let backend = Arc::new(CountingBackend::voting(RecommendedAction::Monitor, 0.7));
        let (engine, _) = engine_with(backend.clone(), 2).await;

        let first = engine.decide(&request()).await;
        let calls_after_first = backend.calls.load(Ordering::SeqCst);
        assert_eq!(calls_after_first, 2);

        let second = engine.decide(&request()).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(second.id, first.id);
        assert_eq!(second.recommendation, first.recommendation);
    }

    #[tokio::test]
    async fn empty_registry_falls_back_to_rules() {
        let backend = Arc::new(CountingBackend::voting(RecommendedAction::ScaleUp, 0.9));
        let (engine, _) = engine_with(backend.clone(), 0).await;

        let mut req = request();
        req.real_time_metrics.insert("cpu_usage".to_string(), 0.95);
        let decision = engine.decide(&req).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(decision.recommendation, RecommendedAction::ScaleUp);
        assert!(decision
            .reasoning
            .iter()
            .any(|r| r.contains("rule-based fallback")));
    }

    #[tokio::test]
    async fn all_models_failing_falls_back_to_rules() {
        let backend = Arc::new(CountingBackend::failing());
        let (engine, _) = engine_with(backend, 3).await;

        let decision = engine.decide(&request()).await;
        assert!(decision
            .reasoning
            .iter()
            .any(|r| r.contains("rule-based fallback")));
    }

    #[tokio::test]
    async fn low_confidence_escalates_to_human() {
        let backend = Arc::new(CountingBackend::voting(RecommendedAction::Maintain, 0.2));
        let (engine, _) = engine_with(backend, 1).await;

        let decision = engine.decide(&request()).await;
        assert_eq!(decision.recommendation, RecommendedAction::EscalateToHuman);
        assert_eq!(decision.risk.level, RiskLevel::High);
    }
}
