//! Feature extraction - raw metrics to normalized feature vectors.

use adaptix_core::{DecisionRequest, FeatureVector};
use std::collections::HashMap;

/// Response time ceiling used for normalization, milliseconds.
const RESPONSE_TIME_CEILING_MS: f64 = 1000.0;

/// Converts raw metric maps into normalized [`FeatureVector`]s.
#[derive(Debug, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create an extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a decision request.
    pub fn extract(&self, request: &DecisionRequest) -> FeatureVector {
        let metrics = &request.real_time_metrics;

        FeatureVector {
            cpu_usage: fraction(metrics, "cpu_usage"),
            memory_usage: fraction(metrics, "memory_usage"),
            response_time: (lookup(metrics, "response_time") / RESPONSE_TIME_CEILING_MS)
                .clamp(0.0, 1.0),
            error_rate: fraction(metrics, "error_rate"),
            system_load: fraction(metrics, "system_load"),
            trend_direction: trend_direction(&request.historical_data, metrics),
            raw: metrics.clone(),
        }
    }
}

fn lookup(metrics: &HashMap<String, f64>, name: &str) -> f64 {
    metrics.get(name).copied().unwrap_or(0.0)
}

fn fraction(metrics: &HashMap<String, f64>, name: &str) -> f64 {
    lookup(metrics, name).clamp(0.0, 1.0)
}

/// Compare the current system load against the historical average.
///
/// Returns 1.0 when load is rising, -1.0 when falling, 0.0 when flat or
/// when there is no history to compare against.
fn trend_direction(history: &[HashMap<String, f64>], current: &HashMap<String, f64>) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let past: f64 = history
        .iter()
        .map(|m| lookup(m, "system_load"))
        .sum::<f64>()
        / history.len() as f64;
    let now = lookup(current, "system_load");
    let delta = now - past;
    if delta > 0.05 {
        1.0
    } else if delta < -0.05 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn features_are_normalized_and_clamped() {
        let request = DecisionRequest {
            real_time_metrics: metrics(&[
                ("cpu_usage", 1.4),
                ("memory_usage", 0.6),
                ("response_time", 2500.0),
                ("error_rate", 0.02),
            ]),
            ..Default::default()
        };

        let features = FeatureExtractor::new().extract(&request);
        assert_eq!(features.cpu_usage, 1.0);
        assert_eq!(features.memory_usage, 0.6);
        assert_eq!(features.response_time, 1.0);
        assert_eq!(features.error_rate, 0.02);
    }

    #[test]
    fn rising_load_is_an_upward_trend() {
        let request = DecisionRequest {
            historical_data: vec![
                metrics(&[("system_load", 0.3)]),
                metrics(&[("system_load", 0.4)]),
            ],
            real_time_metrics: metrics(&[("system_load", 0.8)]),
            ..Default::default()
        };

        let features = FeatureExtractor::new().extract(&request);
        assert_eq!(features.trend_direction, 1.0);
    }

    #[test]
    fn no_history_means_flat_trend() {
        let request = DecisionRequest {
            real_time_metrics: metrics(&[("system_load", 0.8)]),
            ..Default::default()
        };
        let features = FeatureExtractor::new().extract(&request);
        assert_eq!(features.trend_direction, 0.0);
    }
}
