//! Engine events - structured payloads for the external notification
//! collaborator.

use crate::decision::RecommendedAction;
use crate::health::MaintenanceRisk;
use crate::id::{DecisionId, ModelId, ScheduleId};
use crate::Time;
use serde::{Deserialize, Serialize};

/// Everything the engine reports to the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A decision was produced (cache hits do not re-emit)
    DecisionMade {
        /// Decision identifier
        decision_id: DecisionId,
        /// Winning action
        recommendation: RecommendedAction,
        /// Fused confidence
        confidence: f64,
        /// Emission time
        timestamp: Time,
    },
    /// An outcome was recorded against a decision
    LearningRecorded {
        /// Decision the outcome belongs to
        decision_id: DecisionId,
        /// Computed event accuracy
        accuracy: f64,
        /// Computed learning value
        learning_value: f64,
        /// Emission time
        timestamp: Time,
    },
    /// A model finished retraining
    ModelRetrained {
        /// Model identifier
        model_id: ModelId,
        /// New version after the patch bump
        version: String,
        /// Accuracy after retrain
        accuracy: f64,
        /// Emission time
        timestamp: Time,
    },
    /// A model was deprecated after a failed retrain
    ModelDeprecated {
        /// Model identifier
        model_id: ModelId,
        /// Why the retrain failed
        reason: String,
        /// Emission time
        timestamp: Time,
    },
    /// An evolution cycle finished
    EvolutionCompleted {
        /// Generation number reached
        generation: u64,
        /// Best fitness in the surviving population
        best_fitness: f64,
        /// Mean pairwise diversity
        diversity_index: f64,
        /// Relative fitness change across recent generations
        convergence_rate: f64,
        /// Emission time
        timestamp: Time,
    },
    /// A tuning run committed or reported new parameters
    HyperparametersTuned {
        /// Relative improvement achieved
        improvement_score: f64,
        /// Samples evaluated across all strategies
        samples_evaluated: usize,
        /// Emission time
        timestamp: Time,
    },
    /// A failure prediction crossed into high or critical risk
    FailurePredicted {
        /// Component at risk
        component_id: String,
        /// Failure probability in [0, 100]
        failure_probability: f64,
        /// Risk classification
        risk_level: MaintenanceRisk,
        /// Emission time
        timestamp: Time,
    },
    /// The maintenance plan was rebuilt
    ScheduleOptimized {
        /// Schedules in the new plan
        scheduled: usize,
        /// Schedules postponed by resource contention
        postponed: usize,
        /// Estimated savings over reactive maintenance
        estimated_savings: f64,
        /// Emission time
        timestamp: Time,
    },
    /// Component health dropped below the critical threshold
    HealthCritical {
        /// Component identifier
        component_id: String,
        /// Health score at emission
        overall_health: f64,
        /// Emission time
        timestamp: Time,
    },
    /// Component health is degraded but not critical
    HealthWarning {
        /// Component identifier
        component_id: String,
        /// Health score at emission
        overall_health: f64,
        /// Emission time
        timestamp: Time,
    },
    /// A maintenance schedule was created for a component
    MaintenanceScheduled {
        /// Schedule identifier
        schedule_id: ScheduleId,
        /// Component being maintained
        component_id: String,
        /// Scheduler priority
        priority: f64,
        /// Emission time
        timestamp: Time,
    },
}

/// Destination for engine events.
///
/// The real collaborator is out of process; in this crate it is a plain
/// sink so subsystems can emit without knowing the transport. Emission is
/// fire-and-forget: a sink must never fail the caller.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: EngineEvent);
}

/// Sink that drops everything. Useful in tests.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: EngineEvent) {}
}
