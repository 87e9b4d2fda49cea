//! Engine configuration.
//!
//! Loaded once at startup; never hot-reloaded. Several thresholds come
//! straight from operational tuning with no deeper derivation, so they
//! are kept as named defaults here rather than buried in the code.

use serde::{Deserialize, Serialize};

/// EMA smoothing factor for accuracy updates.
pub const DEFAULT_EMA_ALPHA: f64 = 0.1;
/// Accuracy below which a ready model is sent to retraining.
pub const DEFAULT_RETRAIN_FLOOR: f64 = 0.8;
/// Confidence below which a decision is escalated to a human.
pub const DEFAULT_LOW_CONFIDENCE_FLOOR: f64 = 0.3;
/// Fraction of the population kept as elites each generation.
pub const DEFAULT_ELITE_FRACTION: f64 = 0.3;
/// Per-individual mutation probability.
pub const DEFAULT_MUTATION_RATE: f64 = 0.1;
/// Failure-risk boundaries: below the first is low, then medium, high,
/// critical.
pub const DEFAULT_RISK_BOUNDS: [f64; 3] = [40.0, 70.0, 90.0];

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Resource limits for maintenance scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Technicians available per planning window
    pub personnel: u32,

    /// Budget available per planning window
    pub budget: f64,

    /// Concurrent equipment reservations
    pub equipment_slots: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            personnel: 5,
            budget: 10_000.0,
            equipment_slots: 3,
        }
    }
}

/// Cadences for the background tasks, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCadences {
    /// Health ingestion sweep
    pub health_ingestion_secs: u64,

    /// Failure prediction refresh
    pub prediction_secs: u64,

    /// Learning effectiveness check
    pub effectiveness_secs: u64,

    /// Batch feedback processing
    pub batch_feedback_secs: u64,

    /// Evolution cycle
    pub evolution_secs: u64,

    /// Hyperparameter tuning run
    pub tuning_secs: u64,
}

impl Default for TaskCadences {
    fn default() -> Self {
        Self {
            health_ingestion_secs: 60,
            prediction_secs: 300,
            effectiveness_secs: 600,
            batch_feedback_secs: 3600,
            evolution_secs: 7200,
            tuning_secs: 86_400,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// EMA smoothing factor, in (0, 1)
    pub ema_alpha: f64,

    /// Retrain accuracy floor
    pub retrain_floor: f64,

    /// Human-escalation confidence floor
    pub low_confidence_floor: f64,

    /// Decision cache TTL, seconds
    pub cache_ttl_secs: u64,

    /// Decision history ring size
    pub decision_history_cap: usize,

    /// Learning events consumed per batch
    pub learning_batch_size: usize,

    /// Performance window length for the adaptive state
    pub performance_window: usize,

    /// Window variance under which performance counts as converged
    pub convergence_threshold: f64,

    /// Evolutionary pool size
    pub pool_size: usize,

    /// Elite fraction per generation
    pub elite_fraction: f64,

    /// Per-individual mutation probability
    pub mutation_rate: f64,

    /// Evolution history cap (trimmed to half on overflow)
    pub evolution_history_cap: usize,

    /// Iterations for the guided tuning strategy
    pub tuning_iterations: usize,

    /// Samples for the random tuning strategy
    pub tuning_random_samples: usize,

    /// Health history cap per component
    pub health_history_cap: usize,

    /// Health below this flags an anomaly
    pub health_anomaly_floor: f64,

    /// Minimum history points before predicting failures
    pub min_prediction_points: usize,

    /// Risk boundaries: [low/medium, medium/high, high/critical]
    pub risk_bounds: [f64; 3],

    /// Per-model inference timeout, milliseconds
    pub model_timeout_ms: u64,

    /// Maintenance resource limits
    pub resources: ResourceLimits,

    /// Background task cadences
    pub cadences: TaskCadences,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ema_alpha: DEFAULT_EMA_ALPHA,
            retrain_floor: DEFAULT_RETRAIN_FLOOR,
            low_confidence_floor: DEFAULT_LOW_CONFIDENCE_FLOOR,
            cache_ttl_secs: 300,
            decision_history_cap: 500,
            learning_batch_size: 100,
            performance_window: 20,
            convergence_threshold: 0.01,
            pool_size: 20,
            elite_fraction: DEFAULT_ELITE_FRACTION,
            mutation_rate: DEFAULT_MUTATION_RATE,
            evolution_history_cap: 1000,
            tuning_iterations: 20,
            tuning_random_samples: 10,
            health_history_cap: 1000,
            health_anomaly_floor: 30.0,
            min_prediction_points: 10,
            risk_bounds: DEFAULT_RISK_BOUNDS,
            model_timeout_ms: 500,
            resources: ResourceLimits::default(),
            cadences: TaskCadences::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing keys fall back to the defaults above.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.ema_alpha, DEFAULT_EMA_ALPHA);
        assert_eq!(config.retrain_floor, DEFAULT_RETRAIN_FLOOR);
        assert_eq!(config.risk_bounds, [40.0, 70.0, 90.0]);
        assert_eq!(config.learning_batch_size, 100);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: EngineConfig =
            toml::from_str("pool_size = 8\n[resources]\npersonnel = 2\n").unwrap();
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.resources.personnel, 2);
        assert_eq!(config.ema_alpha, DEFAULT_EMA_ALPHA);
        assert_eq!(config.cadences.evolution_secs, 7200);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = EngineConfig::default();
        let raw = toml::to_string(&config).unwrap();
        let back: EngineConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.pool_size, config.pool_size);
        assert_eq!(back.risk_bounds, config.risk_bounds);
    }
}
