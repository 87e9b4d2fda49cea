//! Adaptive state controller - tracks the learning phase from a
//! performance-trend sliding window.

use adaptix_core::{AdaptiveLearningState, EngineConfig, LearningPhase};
use tokio::sync::Mutex;
use tracing::info;

/// Exploration rates per phase.
const PHASE_EXPLORATION_RATES: [(LearningPhase, f64); 4] = [
    (LearningPhase::Exploration, 0.30),
    (LearningPhase::Exploitation, 0.15),
    (LearningPhase::Refinement, 0.08),
    (LearningPhase::Stabilization, 0.02),
];

/// Mean drop between window halves that counts as a regression.
const REGRESSION_DROP: f64 = 0.1;

/// Owns the singleton [`AdaptiveLearningState`] and decides phase
/// transitions.
pub struct AdaptiveStateController {
    state: Mutex<AdaptiveLearningState>,
}

impl AdaptiveStateController {
    /// Create a controller starting in the exploration phase.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Mutex::new(AdaptiveLearningState::new(
                config.performance_window,
                config.convergence_threshold,
            )),
        }
    }

    /// Record one performance sample.
    pub async fn observe(&self, performance: f64) {
        let mut state = self.state.lock().await;
        state.push_sample(performance.clamp(0.0, 1.0));
    }

    /// Re-evaluate the learning phase from the current window.
    ///
    /// With less than half a window of samples the phase is left alone.
    /// Otherwise: a regression between window halves resets to
    /// exploration; variance under the convergence threshold means
    /// stabilization; an improving mean means exploitation; anything
    /// else is refinement.
    pub async fn evaluate_phase(&self) -> LearningPhase {
        let mut state = self.state.lock().await;
        if state.performance_window.len() < state.window_capacity / 2 {
            return state.phase;
        }

        let samples: Vec<f64> = state.performance_window.iter().copied().collect();
        let mid = samples.len() / 2;
        let first_half = mean(&samples[..mid]);
        let second_half = mean(&samples[mid..]);
        let variance = state.window_variance();

        let (phase, trigger) = if second_half + REGRESSION_DROP < first_half {
            (LearningPhase::Exploration, "performance regression")
        } else if variance < state.convergence_threshold
            && second_half <= first_half + state.convergence_threshold
        {
            (LearningPhase::Stabilization, "window converged")
        } else if second_half > first_half {
            (LearningPhase::Exploitation, "performance improving")
        } else {
            (LearningPhase::Refinement, "performance plateau")
        };

        if phase != state.phase {
            info!(from = %state.phase, to = %phase, trigger, "learning phase change");
            state.adaptation_triggers.push(trigger.to_string());
            state.phase = phase;
            state.updated_at = chrono::Utc::now();
        }
        state.exploration_rate = exploration_rate(phase);
        phase
    }

    /// Snapshot the current state.
    pub async fn snapshot(&self) -> AdaptiveLearningState {
        self.state.lock().await.clone()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn exploration_rate(phase: LearningPhase) -> f64 {
    PHASE_EXPLORATION_RATES
        .iter()
        .find(|(p, _)| *p == phase)
        .map(|(_, rate)| *rate)
        .unwrap_or(0.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AdaptiveStateController {
        let config = EngineConfig {
            performance_window: 10,
            convergence_threshold: 0.001,
            ..Default::default()
        };
        AdaptiveStateController::new(config)
    }

    #[tokio::test]
    async fn short_window_keeps_initial_phase() {
        let controller = controller();
        controller.observe(0.5).await;
        assert_eq!(
            controller.evaluate_phase().await,
            LearningPhase::Exploration
        );
    }

    #[tokio::test]
    async fn improving_performance_moves_to_exploitation() {
        let controller = controller();
        for v in [0.5, 0.52, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8] {
            controller.observe(v).await;
        }
        assert_eq!(
            controller.evaluate_phase().await,
            LearningPhase::Exploitation
        );
    }

    #[tokio::test]
    async fn converged_window_stabilizes_and_decays_exploration() {
        let controller = controller();
        for _ in 0..10 {
            controller.observe(0.8).await;
        }
        assert_eq!(
            controller.evaluate_phase().await,
            LearningPhase::Stabilization
        );
        let state = controller.snapshot().await;
        assert!(state.exploration_rate < 0.05);
    }

    #[tokio::test]
    async fn regression_resets_to_exploration() {
        let controller = controller();
        // Reach stabilization first.
        for _ in 0..10 {
            controller.observe(0.8).await;
        }
        controller.evaluate_phase().await;

        for _ in 0..6 {
            controller.observe(0.4).await;
        }
        assert_eq!(
            controller.evaluate_phase().await,
            LearningPhase::Exploration
        );
        let state = controller.snapshot().await;
        assert!((state.exploration_rate - 0.30).abs() < 1e-9);
    }
}
