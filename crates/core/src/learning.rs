//! Feedback events and the adaptive learning state.

use crate::id::DecisionId;
use crate::Time;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded decision outcome, consumed in batches then drained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Decision this outcome belongs to
    pub decision_id: DecisionId,

    /// Observed performance in [0, 1]
    pub actual_outcome: f64,

    /// Performance the decision predicted
    pub expected_outcome: f64,

    /// 1 - |expected - actual|
    pub accuracy: f64,

    /// How much there is to learn from this event
    pub learning_value: f64,

    /// Optional operator feedback
    pub feedback: Option<String>,

    /// When the outcome was recorded
    pub recorded_at: Time,
}

/// Phase of the learning schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningPhase {
    /// Wide search, high exploration rate
    Exploration,
    /// Exploit what works, moderate exploration
    Exploitation,
    /// Fine-tune around a known good region
    Refinement,
    /// Performance converged, minimal exploration
    Stabilization,
}

impl std::fmt::Display for LearningPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearningPhase::Exploration => write!(f, "exploration"),
            LearningPhase::Exploitation => write!(f, "exploitation"),
            LearningPhase::Refinement => write!(f, "refinement"),
            LearningPhase::Stabilization => write!(f, "stabilization"),
        }
    }
}

/// Process-wide adaptive learning state.
///
/// `performance_window` is a fixed-size sliding buffer; the oldest sample
/// is evicted on overflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveLearningState {
    /// Current phase
    pub phase: LearningPhase,

    /// Fraction of decisions allowed to explore, in [0, 1]
    pub exploration_rate: f64,

    /// Window variance below which performance counts as converged
    pub convergence_threshold: f64,

    /// Recent performance samples, oldest first
    pub performance_window: VecDeque<f64>,

    /// Maximum window length
    pub window_capacity: usize,

    /// Named triggers that caused the last phase change
    pub adaptation_triggers: Vec<String>,

    /// Last phase transition time
    pub updated_at: Time,
}

impl AdaptiveLearningState {
    /// Create the initial state in the exploration phase.
    pub fn new(window_capacity: usize, convergence_threshold: f64) -> Self {
        Self {
            phase: LearningPhase::Exploration,
            exploration_rate: 0.3,
            convergence_threshold,
            performance_window: VecDeque::with_capacity(window_capacity),
            window_capacity,
            adaptation_triggers: Vec::new(),
            updated_at: chrono::Utc::now(),
        }
    }

    /// Push a performance sample, evicting the oldest on overflow.
    pub fn push_sample(&mut self, value: f64) {
        if self.performance_window.len() == self.window_capacity {
            self.performance_window.pop_front();
        }
        self.performance_window.push_back(value);
    }

    /// Mean of the window, 0.0 when empty.
    pub fn window_mean(&self) -> f64 {
        if self.performance_window.is_empty() {
            return 0.0;
        }
        self.performance_window.iter().sum::<f64>() / self.performance_window.len() as f64
    }

    /// Population variance of the window, 0.0 when empty.
    pub fn window_variance(&self) -> f64 {
        if self.performance_window.is_empty() {
            return 0.0;
        }
        let mean = self.window_mean();
        self.performance_window
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.performance_window.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_oldest_on_overflow() {
        let mut state = AdaptiveLearningState::new(3, 0.01);
        for v in [0.1, 0.2, 0.3, 0.4] {
            state.push_sample(v);
        }
        assert_eq!(state.performance_window.len(), 3);
        assert_eq!(state.performance_window.front(), Some(&0.2));
    }

    #[test]
    fn window_stats_on_empty_window_are_zero() {
        let state = AdaptiveLearningState::new(10, 0.01);
        assert_eq!(state.window_mean(), 0.0);
        assert_eq!(state.window_variance(), 0.0);
    }
}
