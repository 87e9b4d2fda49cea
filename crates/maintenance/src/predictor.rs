//! Failure prediction over component health records.

use crate::monitor::HealthMonitor;
use crate::scheduler::MaintenanceScheduler;
use adaptix_core::{
    ComponentHealth, EngineConfig, EngineEvent, EventSink, FailurePrediction, HealthTrend,
    MaintenanceRisk, TimeToFailure,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Weight on the health deficit (100 - health).
const HEALTH_WEIGHT: f64 = 0.7;
/// Maintenance age at which the age term saturates, days.
const AGE_SATURATION_DAYS: f64 = 30.0;
/// Error rate at which the error term saturates, errors per hour.
const ERROR_SATURATION: f64 = 5.0;
/// Ceiling for each of the age, error and efficiency terms.
const SECONDARY_TERM_CEILING: f64 = 10.0;
/// Probability added while health is degrading.
const DEGRADING_PENALTY: f64 = 20.0;
/// Probability removed while health holds or improves.
const STEADY_CREDIT: f64 = 5.0;
/// Weight on the anomaly score.
const ANOMALY_WEIGHT: f64 = 10.0;
/// Confidence attached to time-to-failure estimates.
const TTF_CONFIDENCE: f64 = 0.7;
/// Spread of the time-to-failure range around the estimate.
const TTF_RANGE_SPREAD: f64 = 0.3;

/// Predicts component failures and keeps at most one active forecast
/// per component.
pub struct FailurePredictor {
    monitor: Arc<HealthMonitor>,
    scheduler: Arc<MaintenanceScheduler>,
    sink: Arc<dyn EventSink>,
    active: Mutex<HashMap<String, FailurePrediction>>,
    config: EngineConfig,
}

impl FailurePredictor {
    /// Create a predictor over a monitor and a scheduler.
    pub fn new(
        monitor: Arc<HealthMonitor>,
        scheduler: Arc<MaintenanceScheduler>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            monitor,
            scheduler,
            sink,
            active: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Refresh forecasts for every component with enough history.
    ///
    /// High and critical forecasts emit an event and get a maintenance
    /// schedule if the component has none pending.
    pub async fn run_cycle(&self) -> Vec<FailurePrediction> {
        let components = self.monitor.components().await;
        let mut fresh = Vec::new();

        for health in &components {
            let Some(prediction) = self.predict(health) else {
                continue;
            };
            if prediction.risk_level >= MaintenanceRisk::High {
                warn!(
                    component_id = %prediction.component_id,
                    probability = prediction.failure_probability,
                    risk = %prediction.risk_level,
                    "failure risk elevated"
                );
                self.sink.emit(EngineEvent::FailurePredicted {
                    component_id: prediction.component_id.clone(),
                    failure_probability: prediction.failure_probability,
                    risk_level: prediction.risk_level,
                    timestamp: prediction.predicted_at,
                });
                self.scheduler.ensure_scheduled(&prediction, health).await;
            }
            fresh.push(prediction);
        }

        let mut active = self.active.lock().await;
        for prediction in &fresh {
            active.insert(prediction.component_id.clone(), prediction.clone());
        }
        info!(forecasts = fresh.len(), "prediction cycle complete");
        fresh
    }

    /// Latest forecast for a component, if one was produced.
    pub async fn forecast(&self, component_id: &str) -> Option<FailurePrediction> {
        self.active.lock().await.get(component_id).cloned()
    }

    /// Score one component. Returns `None` below the history minimum.
    pub fn predict(&self, health: &ComponentHealth) -> Option<FailurePrediction> {
        if health.history.len() < self.config.min_prediction_points {
            return None;
        }

        let deficit = (100.0 - health.overall_health).max(0.0);
        let age_days = health.operational.hours_since_maintenance / 24.0;
        let age_term = (age_days / AGE_SATURATION_DAYS).min(1.0) * SECONDARY_TERM_CEILING;
        let error_term =
            (health.operational.error_rate / ERROR_SATURATION).min(1.0) * SECONDARY_TERM_CEILING;
        let efficiency_term =
            (1.0 - health.operational.efficiency.clamp(0.0, 1.0)) * SECONDARY_TERM_CEILING;

        let mut probability = deficit * HEALTH_WEIGHT + age_term + error_term + efficiency_term;
        probability += match health.trend {
            HealthTrend::Degrading => DEGRADING_PENALTY,
            _ => -STEADY_CREDIT,
        };
        probability += ANOMALY_WEIGHT * self.anomaly_score(health);
        let probability = probability.clamp(0.0, 100.0);

        let risk_level = self.classify(probability);
        let estimate = health.mtbf_hours * (1.0 - probability / 100.0);
        let symptoms = symptoms(health);

        Some(FailurePrediction {
            component_id: health.component_id.clone(),
            failure_probability: probability,
            time_to_failure: TimeToFailure {
                estimate_hours: estimate,
                confidence: TTF_CONFIDENCE,
                range_hours: (
                    estimate * (1.0 - TTF_RANGE_SPREAD),
                    estimate * (1.0 + TTF_RANGE_SPREAD),
                ),
            },
            risk_level,
            root_causes: root_causes(health, &symptoms),
            recommendations: recommendations(risk_level),
            symptoms,
            predicted_at: chrono::Utc::now(),
        })
    }

    /// Fraction of the most recent history window below the anomaly
    /// floor.
    fn anomaly_score(&self, health: &ComponentHealth) -> f64 {
        let window = self.config.min_prediction_points;
        let recent: Vec<_> = health.history.iter().rev().take(window).collect();
        if recent.is_empty() {
            return 0.0;
        }
        let anomalous = recent
            .iter()
            .filter(|s| s.overall_health < self.config.health_anomaly_floor)
            .count();
        anomalous as f64 / recent.len() as f64
    }

    fn classify(&self, probability: f64) -> MaintenanceRisk {
        let [medium, high, critical] = self.config.risk_bounds;
        if probability >= critical {
            MaintenanceRisk::Critical
        } else if probability >= high {
            MaintenanceRisk::High
        } else if probability >= medium {
            MaintenanceRisk::Medium
        } else {
            MaintenanceRisk::Low
        }
    }
}

fn symptoms(health: &ComponentHealth) -> Vec<String> {
    let mut symptoms = Vec::new();
    if health.overall_health < 50.0 {
        symptoms.push("degraded health score".to_string());
    }
    if health.operational.error_rate > 1.0 {
        symptoms.push("elevated error rate".to_string());
    }
    if health.operational.efficiency < 0.6 {
        symptoms.push("throughput efficiency loss".to_string());
    }
    if health.trend == HealthTrend::Degrading {
        symptoms.push("downward health trend".to_string());
    }
    symptoms
}

fn root_causes(health: &ComponentHealth, symptoms: &[String]) -> Vec<String> {
    let mut causes = Vec::new();
    if health.operational.hours_since_maintenance > 14.0 * 24.0 {
        causes.push("wear consistent with overdue maintenance".to_string());
    }
    if symptoms.iter().any(|s| s.contains("error rate")) {
        causes.push("recurring faults raising the error rate".to_string());
    }
    if symptoms.iter().any(|s| s.contains("efficiency")) {
        causes.push("resource contention or throughput bottleneck".to_string());
    }
    if causes.is_empty() && !symptoms.is_empty() {
        causes.push("gradual performance degradation".to_string());
    }
    causes
}

fn recommendations(risk: MaintenanceRisk) -> Vec<String> {
    match risk {
        MaintenanceRisk::Critical => vec![
            "schedule corrective maintenance within 24 hours".to_string(),
            "prepare a failover for this component".to_string(),
        ],
        MaintenanceRisk::High => vec![
            "schedule preventive maintenance this week".to_string(),
            "increase monitoring frequency".to_string(),
        ],
        MaintenanceRisk::Medium => {
            vec!["review at the next planned maintenance window".to_string()]
        }
        MaintenanceRisk::Low => vec!["continue routine monitoring".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::{HealthSample, NullEventSink, ScheduleStatus};
    use std::collections::HashMap as Map;

    fn predictor() -> (FailurePredictor, Arc<MaintenanceScheduler>) {
        let config = EngineConfig::default();
        let sink: Arc<dyn EventSink> = Arc::new(NullEventSink);
        let monitor = Arc::new(HealthMonitor::new(sink.clone(), config.clone()));
        let scheduler = Arc::new(MaintenanceScheduler::new(sink.clone(), config.clone()));
        (
            FailurePredictor::new(monitor, scheduler.clone(), sink, config),
            scheduler,
        )
    }

    fn health_with(overall: f64, samples: usize) -> ComponentHealth {
        let mut health = ComponentHealth::new("db-1", 1000);
        health.overall_health = overall;
        for _ in 0..samples {
            health.push_sample(HealthSample {
                overall_health: overall,
                metrics: Map::new(),
                recorded_at: chrono::Utc::now(),
            });
        }
        health
    }

    #[tokio::test]
    async fn too_little_history_yields_no_forecast() {
        let (predictor, _) = predictor();
        let health = health_with(50.0, 5);
        assert!(predictor.predict(&health).is_none());
    }

    #[tokio::test]
    async fn probability_rises_as_health_falls() {
        let (predictor, _) = predictor();
        let weak = predictor.predict(&health_with(40.0, 12)).unwrap();
        let strong = predictor.predict(&health_with(80.0, 12)).unwrap();
        assert!(weak.failure_probability > strong.failure_probability);
    }

    #[tokio::test]
    async fn risk_bounds_are_inclusive_at_the_lower_edge() {
        let (predictor, _) = predictor();
        assert_eq!(predictor.classify(39.9), MaintenanceRisk::Low);
        assert_eq!(predictor.classify(40.0), MaintenanceRisk::Medium);
        assert_eq!(predictor.classify(69.9), MaintenanceRisk::Medium);
        assert_eq!(predictor.classify(70.0), MaintenanceRisk::High);
        assert_eq!(predictor.classify(90.0), MaintenanceRisk::Critical);
    }

    #[tokio::test]
    async fn time_to_failure_shrinks_with_probability() {
        let (predictor, _) = predictor();
        let forecast = predictor.predict(&health_with(25.0, 12)).unwrap();
        let expected = 720.0 * (1.0 - forecast.failure_probability / 100.0);
        assert!((forecast.time_to_failure.estimate_hours - expected).abs() < 1e-9);
        let (low, high) = forecast.time_to_failure.range_hours;
        assert!(low < forecast.time_to_failure.estimate_hours);
        assert!(high > forecast.time_to_failure.estimate_hours);
    }

    #[tokio::test]
    async fn failing_component_schedules_maintenance() {
        let (predictor, scheduler) = predictor();
        for _ in 0..12 {
            predictor
                .monitor
                .ingest_metrics(
                    "db-1",
                    Map::from([
                        ("availability".to_string(), 20.0),
                        ("error_rate".to_string(), 1.5),
                    ]),
                    chrono::Utc::now(),
                )
                .await;
        }

        let forecasts = predictor.run_cycle().await;
        assert_eq!(forecasts.len(), 1);
        assert!(forecasts[0].risk_level >= MaintenanceRisk::High);

        let schedules = scheduler.schedules().await;
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].component_id, "db-1");
        assert_eq!(schedules[0].status, ScheduleStatus::Scheduled);
    }

    #[tokio::test]
    async fn repeated_cycles_do_not_duplicate_schedules() {
        let (predictor, scheduler) = predictor();
        for _ in 0..12 {
            predictor
                .monitor
                .ingest_metrics(
                    "db-1",
                    Map::from([("availability".to_string(), 15.0)]),
                    chrono::Utc::now(),
                )
                .await;
        }
        predictor.run_cycle().await;
        predictor.run_cycle().await;
        assert_eq!(scheduler.schedules().await.len(), 1);
    }
}
