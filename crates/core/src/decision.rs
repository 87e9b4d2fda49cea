//! Decision model - what the fusion engine produces.

use crate::id::DecisionId;
use crate::Time;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Action recommended by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Add capacity
    ScaleUp,
    /// Remove capacity
    ScaleDown,
    /// Tune cache configuration
    OptimizeCache,
    /// Watch without acting
    Monitor,
    /// Keep current configuration
    Maintain,
    /// Confidence too low for automation, hand off to an operator
    EscalateToHuman,
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendedAction::ScaleUp => write!(f, "scale_up"),
            RecommendedAction::ScaleDown => write!(f, "scale_down"),
            RecommendedAction::OptimizeCache => write!(f, "optimize_cache"),
            RecommendedAction::Monitor => write!(f, "monitor"),
            RecommendedAction::Maintain => write!(f, "maintain"),
            RecommendedAction::EscalateToHuman => write!(f, "escalate_to_human"),
        }
    }
}

/// Decision risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No notable risk factors
    Low,
    /// Some risk factors present
    Medium,
    /// Acting (or not acting) carries real risk
    High,
}

/// Rule-based risk assessment attached to every decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall level
    pub level: RiskLevel,

    /// Conditions that raised the level
    pub factors: Vec<String>,

    /// Suggested mitigations, one per factor where known
    pub mitigations: Vec<String>,
}

impl RiskAssessment {
    /// An assessment with no factors.
    pub fn low() -> Self {
        Self {
            level: RiskLevel::Low,
            factors: Vec::new(),
            mitigations: Vec::new(),
        }
    }
}

/// A non-winning action kept as a fallback option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    /// The action
    pub action: RecommendedAction,

    /// Average confidence of the models that proposed it
    pub confidence: f64,

    /// How many models proposed it
    pub votes: usize,
}

/// What the engine expects to happen if the recommendation is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    /// Predicted performance score in [0, 1]
    pub performance: f64,

    /// Free-form description
    pub description: String,
}

/// A fused decision.
///
/// Created once by the fusion engine, cached with a TTL, and read (never
/// mutated) by the feedback loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Unique identifier
    pub id: DecisionId,

    /// Winning action
    pub recommendation: RecommendedAction,

    /// Fused confidence in [0, 1]
    pub confidence: f64,

    /// Human-readable reasoning trail
    pub reasoning: Vec<String>,

    /// Up to three non-winning actions
    pub alternatives: Vec<Alternative>,

    /// Rule-based risk assessment
    pub risk: RiskAssessment,

    /// Expected outcome if applied
    pub expected_outcome: ExpectedOutcome,

    /// Concrete follow-up actions
    pub required_actions: Vec<String>,

    /// Creation time
    pub created_at: Time,
}

impl Decision {
    /// Create a decision with bounded confidence and low risk.
    pub fn new(recommendation: RecommendedAction, confidence: f64) -> Self {
        Self {
            id: DecisionId::new(),
            recommendation,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: Vec::new(),
            alternatives: Vec::new(),
            risk: RiskAssessment::low(),
            expected_outcome: ExpectedOutcome::default(),
            required_actions: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Inputs to a decision request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Caller-supplied context tags
    pub context: HashMap<String, String>,

    /// Recent historical samples, oldest first
    pub historical_data: Vec<HashMap<String, f64>>,

    /// Current metric readings
    pub real_time_metrics: HashMap<String, f64>,

    /// Hard constraints the recommendation must respect
    pub constraints: Vec<String>,

    /// Optimization objectives in play
    pub objectives: Vec<String>,

    /// Request priority, part of the cache fingerprint
    pub priority: u8,
}
