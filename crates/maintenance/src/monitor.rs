//! Component health ingestion.

use adaptix_core::{
    ComponentHealth, EngineConfig, EngineEvent, EventSink, HealthSample, HealthTrend, Time,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Health below twice the anomaly floor raises a warning event.
const WARNING_MULTIPLIER: f64 = 2.0;

/// Samples compared on each side when estimating the trend.
const TREND_WINDOW: usize = 5;

/// Health delta (per trend window) that counts as movement.
const TREND_EPSILON: f64 = 2.0;

/// Ingests component metrics and keeps one bounded health record per
/// component.
pub struct HealthMonitor {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl HealthMonitor {
    /// Create a monitor with no known components.
    pub fn new(sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            sink,
            config,
        }
    }

    /// Ingest one metric reading for a component.
    ///
    /// The overall health is the clamped average of the latest metric
    /// values. Health under the anomaly floor flags the component and
    /// emits a critical event; under twice the floor, a warning.
    pub async fn ingest_metrics(
        &self,
        component_id: &str,
        metrics: HashMap<String, f64>,
        timestamp: Time,
    ) {
        if metrics.is_empty() {
            warn!(component_id, "ignoring empty metric ingestion");
            return;
        }

        let overall_health =
            (metrics.values().sum::<f64>() / metrics.len() as f64).clamp(0.0, 100.0);

        let mut components = self.components.write().await;
        let health = components
            .entry(component_id.to_string())
            .or_insert_with(|| ComponentHealth::new(component_id, self.config.health_history_cap));

        health.overall_health = overall_health;
        if let Some(rate) = metrics.get("error_rate") {
            health.operational.error_rate = rate.max(0.0);
        }
        if let Some(eff) = metrics.get("efficiency") {
            health.operational.efficiency = eff.clamp(0.0, 1.0);
        }
        let elapsed_hours =
            (timestamp - health.updated_at).num_milliseconds().max(0) as f64 / 3_600_000.0;
        health.operational.hours_since_maintenance += elapsed_hours;

        health.push_sample(HealthSample {
            overall_health,
            metrics,
            recorded_at: timestamp,
        });
        health.trend = estimate_trend(health);
        health.updated_at = timestamp;

        let floor = self.config.health_anomaly_floor;
        if overall_health < floor {
            let alert = "health_anomaly".to_string();
            if !health.active_alerts.contains(&alert) {
                health.active_alerts.push(alert);
            }
            self.sink.emit(EngineEvent::HealthCritical {
                component_id: component_id.to_string(),
                overall_health,
                timestamp,
            });
        } else {
            health.active_alerts.retain(|a| a != "health_anomaly");
            if overall_health < floor * WARNING_MULTIPLIER {
                self.sink.emit(EngineEvent::HealthWarning {
                    component_id: component_id.to_string(),
                    overall_health,
                    timestamp,
                });
            }
        }

        debug!(component_id, overall_health, "health sample ingested");
    }

    /// Record that maintenance completed on a component.
    pub async fn maintenance_completed(&self, component_id: &str) {
        let mut components = self.components.write().await;
        if let Some(health) = components.get_mut(component_id) {
            health.operational.hours_since_maintenance = 0.0;
            health.active_alerts.clear();
        }
    }

    /// Snapshot one component.
    pub async fn component(&self, component_id: &str) -> Option<ComponentHealth> {
        self.components.read().await.get(component_id).cloned()
    }

    /// Snapshot every component.
    pub async fn components(&self) -> Vec<ComponentHealth> {
        self.components.read().await.values().cloned().collect()
    }
}

/// Compare the mean of the newest samples against the window before
/// them.
fn estimate_trend(health: &ComponentHealth) -> HealthTrend {
    let len = health.history.len();
    if len < TREND_WINDOW * 2 {
        return HealthTrend::Stable;
    }
    let samples: Vec<f64> = health.history.iter().map(|s| s.overall_health).collect();
    let recent = mean(&samples[len - TREND_WINDOW..]);
    let prior = mean(&samples[len - TREND_WINDOW * 2..len - TREND_WINDOW]);

    if recent + TREND_EPSILON < prior {
        HealthTrend::Degrading
    } else if recent > prior + TREND_EPSILON {
        HealthTrend::Improving
    } else {
        HealthTrend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::NullEventSink;

    fn monitor() -> HealthMonitor {
        HealthMonitor::new(Arc::new(NullEventSink), EngineConfig::default())
    }

    fn metrics(value: f64) -> HashMap<String, f64> {
        HashMap::from([("availability".to_string(), value)])
    }

    #[tokio::test]
    async fn health_is_the_clamped_metric_average() {
        let monitor = monitor();
        let readings = HashMap::from([
            ("availability".to_string(), 90.0),
            ("throughput".to_string(), 70.0),
        ]);
        monitor
            .ingest_metrics("db-1", readings, chrono::Utc::now())
            .await;

        let health = monitor.component("db-1").await.unwrap();
        assert_eq!(health.overall_health, 80.0);

        monitor
            .ingest_metrics("db-1", metrics(400.0), chrono::Utc::now())
            .await;
        assert_eq!(monitor.component("db-1").await.unwrap().overall_health, 100.0);
    }

    #[tokio::test]
    async fn low_health_flags_an_anomaly_alert() {
        let monitor = monitor();
        monitor
            .ingest_metrics("db-1", metrics(20.0), chrono::Utc::now())
            .await;

        let health = monitor.component("db-1").await.unwrap();
        assert!(health
            .active_alerts
            .contains(&"health_anomaly".to_string()));
    }

    #[tokio::test]
    async fn recovery_clears_the_anomaly_alert() {
        let monitor = monitor();
        monitor
            .ingest_metrics("db-1", metrics(20.0), chrono::Utc::now())
            .await;
        monitor
            .ingest_metrics("db-1", metrics(85.0), chrono::Utc::now())
            .await;

        let health = monitor.component("db-1").await.unwrap();
        assert!(health.active_alerts.is_empty());
    }

    #[tokio::test]
    async fn falling_health_is_a_degrading_trend() {
        let monitor = monitor();
        for value in [90.0, 90.0, 90.0, 90.0, 90.0, 60.0, 58.0, 55.0, 52.0, 50.0] {
            monitor
                .ingest_metrics("db-1", metrics(value), chrono::Utc::now())
                .await;
        }

        let health = monitor.component("db-1").await.unwrap();
        assert_eq!(health.trend, HealthTrend::Degrading);
    }

    #[tokio::test]
    async fn history_respects_its_cap() {
        let config = EngineConfig {
            health_history_cap: 4,
            ..Default::default()
        };
        let monitor = HealthMonitor::new(Arc::new(NullEventSink), config);
        for i in 0..10 {
            monitor
                .ingest_metrics("db-1", metrics(80.0 + i as f64), chrono::Utc::now())
                .await;
        }
        assert_eq!(monitor.component("db-1").await.unwrap().history.len(), 4);
    }
}
