//! Evolutionary population members and optimization objectives.

use crate::id::ModelId;
use serde::{Deserialize, Serialize};

/// One member of the evolutionary population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvolution {
    /// Identity of this variant
    pub id: ModelId,

    /// Generation this variant was produced in
    pub generation: u64,

    /// Parents it was bred from (empty for seeds)
    pub parent_models: Vec<ModelId>,

    /// Architecture tweaks applied by mutation
    pub mutations: Vec<String>,

    /// Multi-objective fitness score
    pub fitness: f64,

    /// Estimated accuracy in [0, 1]
    pub accuracy: f64,

    /// Structural complexity in [0, 1], penalized by fitness
    pub complexity: f64,

    /// Runtime efficiency in [0, 1]
    pub efficiency: f64,

    /// Whether this member survived elite selection
    pub is_elite: bool,
}

impl ModelEvolution {
    /// Create a seed member for generation zero.
    pub fn seed(accuracy: f64, complexity: f64, efficiency: f64) -> Self {
        Self {
            id: ModelId::new(),
            generation: 0,
            parent_models: Vec::new(),
            mutations: Vec::new(),
            fitness: 0.0,
            accuracy: accuracy.clamp(0.0, 1.0),
            complexity: complexity.clamp(0.0, 1.0),
            efficiency: efficiency.clamp(0.0, 1.0),
            is_elite: false,
        }
    }
}

/// Direction an objective is optimized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Larger is better
    Maximize,
    /// Smaller is better
    Minimize,
}

/// A long-lived tuning target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationObjective {
    /// Objective name (e.g. "latency_p99")
    pub name: String,

    /// Relative weight among objectives
    pub weight: f64,

    /// Optimization direction
    pub target: Direction,

    /// Last observed value
    pub current_value: f64,

    /// Desired value
    pub target_value: f64,

    /// Business importance in [0, 1]
    pub importance: f64,
}
