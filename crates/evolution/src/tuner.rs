//! Hyperparameter tuner - multi-strategy search, validated before
//! commit.

use adaptix_core::{EngineConfig, EngineEvent, EventSink, Model, ModelId, ModelStatus};
use adaptix_registry::{BackendError, ModelBackend, ModelMutation, ModelStore, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Epsilon guarding the improvement-score denominator.
const IMPROVEMENT_EPS: f64 = 1e-6;

/// Error type for tuning runs.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    /// No ready model to tune
    #[error("no ready model available for tuning")]
    NoReadyModel,

    /// Model store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Backend evaluation failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One tunable parameter: a continuous range or a discrete choice set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,

    /// Lower bound (ignored when `choices` is set)
    pub min: f64,

    /// Upper bound (ignored when `choices` is set)
    pub max: f64,

    /// Discrete values, if the parameter is categorical
    pub choices: Option<Vec<f64>>,
}

/// The declared search space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Parameters under search
    pub parameters: Vec<ParameterSpec>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            parameters: vec![
                ParameterSpec {
                    name: "learning_rate".to_string(),
                    min: 1e-4,
                    max: 0.5,
                    choices: None,
                },
                ParameterSpec {
                    name: "batch_size".to_string(),
                    min: 16.0,
                    max: 256.0,
                    choices: Some(vec![16.0, 32.0, 64.0, 128.0, 256.0]),
                },
                ParameterSpec {
                    name: "regularization".to_string(),
                    min: 1e-5,
                    max: 0.1,
                    choices: None,
                },
            ],
        }
    }
}

impl SearchSpace {
    fn sample<R: Rng>(&self, rng: &mut R) -> HashMap<String, f64> {
        self.parameters
            .iter()
            .map(|p| {
                let value = match &p.choices {
                    Some(choices) => choices[rng.gen_range(0..choices.len())],
                    None => rng.gen_range(p.min..=p.max),
                };
                (p.name.clone(), value)
            })
            .collect()
    }

    fn clamp(&self, name: &str, value: f64) -> f64 {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| value.clamp(p.min, p.max))
            .unwrap_or(value)
    }
}

/// Which strategy produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStrategy {
    /// Iterative sample-and-score loop
    Guided,
    /// Local +/-10% perturbation around a guided candidate
    Perturbation,
    /// Pure random sampling
    Random,
}

/// One scored parameter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningSample {
    /// Parameter values tried
    pub parameters: HashMap<String, f64>,

    /// Measured score
    pub score: f64,

    /// Strategy that produced the sample
    pub strategy: TuningStrategy,
}

/// Result of an auto-tune run.
#[derive(Debug, Clone)]
pub struct TuningReport {
    /// Model that was tuned
    pub model_id: ModelId,

    /// Best parameter set found
    pub optimized_parameters: HashMap<String, f64>,

    /// `max(0, (after-before)/max(before, eps))`
    pub improvement_score: f64,

    /// Every sample scored, across all strategies
    pub tuning_history: Vec<TuningSample>,

    /// What to do with the result
    pub recommendations: Vec<String>,
}

/// Multi-strategy hyperparameter tuner.
pub struct HyperparameterTuner {
    store: Arc<dyn ModelStore>,
    backend: Arc<dyn ModelBackend>,
    sink: Arc<dyn EventSink>,
    space: SearchSpace,
    config: EngineConfig,
}

impl HyperparameterTuner {
    /// Create a tuner over the default search space.
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
            space: SearchSpace::default(),
            config,
        }
    }

    /// Override the search space.
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    /// Tune the highest-accuracy ready model toward `target_metrics`.
    ///
    /// Three budgeted strategies run over the search space. Candidates
    /// are scored by attainment against the targets (the evaluation
    /// score stands in for accuracy, the model's offline metrics for
    /// precision/recall/f1/auc; an empty map scores by the raw
    /// evaluation). The globally best parameter set is validated by
    /// applying it, re-measuring and restoring the prior configuration
    /// unless `commit` is set and the measurement improved.
    pub async fn auto_tune(
        &self,
        target_metrics: &HashMap<String, f64>,
        commit: bool,
    ) -> Result<TuningReport, TuningError> {
        let mut ready = self.store.list_by_status(ModelStatus::Ready).await?;
        ready.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        let model = ready.into_iter().next().ok_or(TuningError::NoReadyModel)?;

        let before = self.backend.evaluate(&model).await?;
        let mut rng = StdRng::from_entropy();
        let mut history = Vec::new();

        // (a) iterative sample-and-score.
        let mut guided_candidates = Vec::new();
        for _ in 0..self.config.tuning_iterations {
            let params = self.space.sample(&mut rng);
            let score = self.score(&model, &params, target_metrics).await?;
            guided_candidates.push(params.clone());
            history.push(TuningSample {
                parameters: params,
                score,
                strategy: TuningStrategy::Guided,
            });
        }

        // (b) local perturbation of each guided candidate.
        for candidate in &guided_candidates {
            let params: HashMap<String, f64> = candidate
                .iter()
                .map(|(name, value)| {
                    let factor = rng.gen_range(0.9..=1.1);
                    (name.clone(), self.space.clamp(name, value * factor))
                })
                .collect();
            let score = self.score(&model, &params, target_metrics).await?;
            history.push(TuningSample {
                parameters: params,
                score,
                strategy: TuningStrategy::Perturbation,
            });
        }

        // (c) pure random sampling.
        for _ in 0..self.config.tuning_random_samples {
            let params = self.space.sample(&mut rng);
            let score = self.score(&model, &params, target_metrics).await?;
            history.push(TuningSample {
                parameters: params,
                score,
                strategy: TuningStrategy::Random,
            });
        }

        let best = history
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .cloned()
            .ok_or(TuningError::NoReadyModel)?;

        // Validate: apply temporarily, re-measure, restore unless committed.
        let prior = model.hyperparameters.clone();
        let applied = self
            .store
            .update(
                model.id,
                ModelMutation::SetHyperparameters(best.parameters.clone()),
            )
            .await?;
        let after = self.backend.evaluate(&applied).await?;
        let improvement = ((after - before) / before.max(IMPROVEMENT_EPS)).max(0.0);

        let keep = commit && after > before;
        if !keep {
            self.store
                .update(model.id, ModelMutation::SetHyperparameters(prior))
                .await?;
        }

        let mut recommendations = Vec::new();
        if improvement > 0.0 {
            recommendations.push(format!(
                "best parameters improve the measured score by {:.1}%",
                improvement * 100.0
            ));
            recommendations.push(if keep {
                "parameters committed".to_string()
            } else {
                "re-run with commit to apply the parameters".to_string()
            });
        } else {
            recommendations.push("no improvement found, keeping current parameters".to_string());
        }
        for (name, target) in target_metrics {
            match observed_metric(&applied, after, name) {
                Some(observed) if observed < *target => recommendations.push(format!(
                    "{name} {observed:.3} is short of the {target:.3} target"
                )),
                Some(_) => {}
                None => recommendations.push(format!(
                    "target metric '{name}' is not produced by evaluation, ignored"
                )),
            }
        }
        if improvement == 0.0 {
            warn!(model_id = %model.id, "tuning found no improvement");
        } else {
            info!(model_id = %model.id, improvement, committed = keep, "tuning complete");
        }

        self.sink.emit(EngineEvent::HyperparametersTuned {
            improvement_score: improvement,
            samples_evaluated: history.len(),
            timestamp: chrono::Utc::now(),
        });

        Ok(TuningReport {
            model_id: model.id,
            optimized_parameters: best.parameters,
            improvement_score: improvement,
            tuning_history: history,
            recommendations,
        })
    }

    /// Score a candidate by evaluating a trial copy of the model, then
    /// weighing the measurement against the requested targets.
    async fn score(
        &self,
        model: &Model,
        params: &HashMap<String, f64>,
        targets: &HashMap<String, f64>,
    ) -> Result<f64, TuningError> {
        let mut trial = model.clone();
        trial.hyperparameters = params.clone();
        let measured = self.backend.evaluate(&trial).await?;

        let mut attainment = 0.0;
        let mut counted = 0usize;
        for (name, target) in targets {
            if let Some(observed) = observed_metric(model, measured, name) {
                attainment += observed / target.max(IMPROVEMENT_EPS);
                counted += 1;
            }
        }
        if counted == 0 {
            Ok(measured)
        } else {
            Ok(attainment / counted as f64)
        }
    }
}

/// Measured value standing in for a named target metric. The evaluation
/// score covers accuracy; the rest come from the model's offline
/// metrics.
fn observed_metric(model: &Model, measured: f64, name: &str) -> Option<f64> {
    match name {
        "accuracy" => Some(measured),
        "precision" => Some(model.metrics.precision),
        "recall" => Some(model.metrics.recall),
        "f1" => Some(model.metrics.f1),
        "auc" => model.metrics.auc,
        _ => None,
    }
}
