//! Per-model-type predictors.
//!
//! One variant per model type instead of a runtime type-switch. The math
//! here is the deterministic control-plane half of inference; the
//! pluggable [`ModelBackend`](adaptix_registry::ModelBackend) decides how
//! it is invoked.

use adaptix_core::{FeatureVector, Model, ModelType, RecommendedAction};
use adaptix_registry::{BackendError, PredictionResult};

/// Classification feature weights: cpu, memory, response time, error
/// rate, system load, trend.
pub const CLASSIFICATION_WEIGHTS: [f64; 6] = [0.25, 0.20, 0.15, 0.15, 0.10, 0.15];

/// Anomaly score above which the anomaly detector recommends watching.
const ANOMALY_ALERT_SCORE: f64 = 0.5;

/// Typed predictor for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPredictor {
    /// Weighted score over the six named features, bucketed into actions
    Classification,
    /// Near-term metric trajectory projection
    Regression,
    /// Load-regime grouping
    Clustering,
    /// Deviation scoring against declared normal ranges
    AnomalyDetection,
}

impl ModelPredictor {
    /// Pick the predictor for a model.
    pub fn for_model(model: &Model) -> Self {
        match model.model_type {
            ModelType::Classification => Self::Classification,
            ModelType::Regression => Self::Regression,
            ModelType::Clustering => Self::Clustering,
            ModelType::AnomalyDetection => Self::AnomalyDetection,
        }
    }

    /// Produce a prediction from extracted features.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, BackendError> {
        match self {
            Self::Classification => Ok(classify(features)),
            Self::Regression => Ok(project(features)),
            Self::Clustering => Ok(cluster(features)),
            Self::AnomalyDetection => Ok(detect_anomalies(features)),
        }
    }
}

/// Weighted score over the named features.
pub fn classification_score(features: &FeatureVector) -> f64 {
    let values = [
        features.cpu_usage,
        features.memory_usage,
        features.response_time,
        features.error_rate,
        features.system_load,
        features.trend_direction,
    ];
    values
        .iter()
        .zip(CLASSIFICATION_WEIGHTS.iter())
        .map(|(v, w)| v * w)
        .sum()
}

fn classify(features: &FeatureVector) -> PredictionResult {
    let score = classification_score(features);
    let (action, confidence) = if score > 0.8 {
        (RecommendedAction::ScaleUp, 0.9)
    } else if score > 0.6 {
        (RecommendedAction::OptimizeCache, 0.75)
    } else if score > 0.4 {
        (RecommendedAction::Monitor, 0.6)
    } else if score < 0.2 {
        (RecommendedAction::ScaleDown, 0.8)
    } else {
        (RecommendedAction::Maintain, 0.5)
    };

    PredictionResult {
        action,
        confidence,
        reasoning: format!("classification score {score:.3} -> {action}"),
    }
}

/// Project system load a short step ahead along the current trend and
/// recommend against the projected value.
fn project(features: &FeatureVector) -> PredictionResult {
    let projected_load = (features.system_load + 0.1 * features.trend_direction).clamp(0.0, 1.0);
    let projected_response =
        (features.response_time + 0.1 * features.trend_direction).clamp(0.0, 1.0);

    let (action, confidence) = if projected_load > 0.8 || projected_response > 0.8 {
        (RecommendedAction::ScaleUp, 0.7)
    } else if projected_load < 0.2 {
        (RecommendedAction::ScaleDown, 0.65)
    } else if features.trend_direction > 0.0 {
        (RecommendedAction::Monitor, 0.6)
    } else {
        (RecommendedAction::Maintain, 0.55)
    };

    PredictionResult {
        action,
        confidence,
        reasoning: format!("projected load {projected_load:.2} -> {action}"),
    }
}

/// Bucket the context into a load regime and return the regime's
/// canonical action.
fn cluster(features: &FeatureVector) -> PredictionResult {
    let load = (features.cpu_usage + features.memory_usage + features.system_load) / 3.0;
    let (regime, action, confidence) = if load > 0.8 {
        ("saturated", RecommendedAction::ScaleUp, 0.7)
    } else if load < 0.2 {
        ("idle", RecommendedAction::ScaleDown, 0.65)
    } else {
        ("nominal", RecommendedAction::Maintain, 0.6)
    };

    PredictionResult {
        action,
        confidence,
        reasoning: format!("load regime {regime} ({load:.2}) -> {action}"),
    }
}

/// Declared normal ranges per named feature.
const NORMAL_RANGES: [(&str, f64, f64); 5] = [
    ("cpu_usage", 0.1, 0.8),
    ("memory_usage", 0.1, 0.85),
    ("response_time", 0.0, 0.5),
    ("error_rate", 0.0, 0.05),
    ("system_load", 0.05, 0.8),
];

/// Z-score-like deviation scoring: each feature contributes its distance
/// outside the declared normal range, scaled by the range width.
fn detect_anomalies(features: &FeatureVector) -> PredictionResult {
    let values = [
        features.cpu_usage,
        features.memory_usage,
        features.response_time,
        features.error_rate,
        features.system_load,
    ];

    let mut flagged = Vec::new();
    let mut total = 0.0;
    for ((name, low, high), value) in NORMAL_RANGES.iter().zip(values.iter()) {
        let width = (high - low).max(1e-6);
        let deviation = if value < low {
            (low - value) / width
        } else if value > high {
            (value - high) / width
        } else {
            0.0
        };
        if deviation > 0.0 {
            flagged.push(*name);
        }
        total += deviation;
    }
    let anomaly_score = (total / NORMAL_RANGES.len() as f64).clamp(0.0, 1.0);

    let (action, confidence) = if anomaly_score > ANOMALY_ALERT_SCORE {
        (RecommendedAction::EscalateToHuman, 0.85)
    } else if !flagged.is_empty() {
        (RecommendedAction::Monitor, 0.7)
    } else {
        (RecommendedAction::Maintain, 0.6)
    };

    PredictionResult {
        action,
        confidence,
        reasoning: if flagged.is_empty() {
            format!("anomaly score {anomaly_score:.2}, all features nominal")
        } else {
            format!(
                "anomaly score {anomaly_score:.2}, out of range: {}",
                flagged.join(", ")
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(cpu: f64, mem: f64, rt: f64, err: f64, load: f64, trend: f64) -> FeatureVector {
        FeatureVector {
            cpu_usage: cpu,
            memory_usage: mem,
            response_time: rt,
            error_rate: err,
            system_load: load,
            trend_direction: trend,
            raw: Default::default(),
        }
    }

    #[test]
    fn classification_reference_input_selects_monitor() {
        // cpu 0.85, mem 0.85, response 100ms (0.1 normalized), error 0.02,
        // load 0.5, flat trend. Weighted score is 0.4505, the monitor bucket.
        let f = features(0.85, 0.85, 0.1, 0.02, 0.5, 0.0);
        let score = classification_score(&f);
        assert!((score - 0.4505).abs() < 1e-9);

        let result = ModelPredictor::Classification.predict(&f).unwrap();
        assert_eq!(result.action, RecommendedAction::Monitor);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn classification_low_score_scales_down() {
        let f = features(0.05, 0.05, 0.01, 0.0, 0.05, 0.0);
        let result = ModelPredictor::Classification.predict(&f).unwrap();
        assert_eq!(result.action, RecommendedAction::ScaleDown);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn regression_projects_rising_load_past_threshold() {
        let f = features(0.6, 0.6, 0.3, 0.01, 0.75, 1.0);
        let result = ModelPredictor::Regression.predict(&f).unwrap();
        assert_eq!(result.action, RecommendedAction::ScaleUp);
    }

    #[test]
    fn clustering_buckets_idle_load() {
        let f = features(0.05, 0.1, 0.05, 0.0, 0.1, 0.0);
        let result = ModelPredictor::Clustering.predict(&f).unwrap();
        assert_eq!(result.action, RecommendedAction::ScaleDown);
    }

    #[test]
    fn anomaly_detector_flags_out_of_range_features() {
        let f = features(0.95, 0.5, 0.2, 0.3, 0.5, 0.0);
        let result = ModelPredictor::AnomalyDetection.predict(&f).unwrap();
        assert!(result.reasoning.contains("cpu_usage"));
        assert!(result.reasoning.contains("error_rate"));
        assert_ne!(result.action, RecommendedAction::Maintain);
    }

    #[test]
    fn anomaly_detector_is_quiet_on_nominal_features() {
        let f = features(0.4, 0.4, 0.2, 0.01, 0.4, 0.0);
        let result = ModelPredictor::AnomalyDetection.predict(&f).unwrap();
        assert_eq!(result.action, RecommendedAction::Maintain);
    }
}
