//! Feature vectors - ephemeral, derived per decision.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized features extracted from raw metrics.
///
/// All named features live in [0, 1] except `trend_direction`, which is
/// 1.0 (load rising), 0.0 (flat) or -1.0 (load falling). `raw` keeps the
/// original metric map for predictors that need unscaled values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// CPU utilisation fraction
    pub cpu_usage: f64,

    /// Memory utilisation fraction
    pub memory_usage: f64,

    /// Response time normalized against a 1000ms ceiling
    pub response_time: f64,

    /// Error rate fraction
    pub error_rate: f64,

    /// Aggregate system load fraction
    pub system_load: f64,

    /// Trend direction: 1.0, 0.0 or -1.0
    pub trend_direction: f64,

    /// Unscaled source metrics
    pub raw: HashMap<String, f64>,
}

impl FeatureVector {
    /// Iterate the six named features with their canonical names.
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("cpu_usage", self.cpu_usage),
            ("memory_usage", self.memory_usage),
            ("response_time", self.response_time),
            ("error_rate", self.error_rate),
            ("system_load", self.system_load),
            ("trend_direction", self.trend_direction),
        ]
    }
}
