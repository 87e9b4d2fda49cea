//! Adaptix core data models.
//!
//! This crate defines the shared data structures of the adaptive
//! decision and predictive optimization engine.

#![warn(missing_docs)]

// Core identities
mod id;

// Decision serving
mod decision;
mod features;
mod model;

// Learning and evolution
mod evolution;
mod learning;

// Predictive maintenance
mod health;

// Events and configuration
mod config;
mod event;

// Re-exports
pub use id::*;

// Models & decisions
pub use decision::{
    Alternative, Decision, DecisionRequest, ExpectedOutcome, RecommendedAction, RiskAssessment,
    RiskLevel,
};
pub use features::FeatureVector;
pub use model::{Model, ModelMetrics, ModelStatus, ModelType};

// Learning & evolution
pub use evolution::{Direction, ModelEvolution, OptimizationObjective};
pub use learning::{AdaptiveLearningState, LearningEvent, LearningPhase};

// Maintenance
pub use health::{
    ComponentHealth, FailurePrediction, HealthSample, HealthTrend, MaintenanceRisk,
    MaintenanceSchedule, OperationalData, ResourceAllocation, ScheduleStatus, TimeToFailure,
};

// Events & config
pub use config::{
    ConfigError, EngineConfig, ResourceLimits, TaskCadences, DEFAULT_ELITE_FRACTION,
    DEFAULT_EMA_ALPHA, DEFAULT_LOW_CONFIDENCE_FLOOR, DEFAULT_MUTATION_RATE, DEFAULT_RETRAIN_FLOOR,
    DEFAULT_RISK_BOUNDS,
};
pub use event::{EngineEvent, EventSink, NullEventSink};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
