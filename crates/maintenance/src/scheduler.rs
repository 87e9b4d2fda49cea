//! Maintenance scheduling and plan optimization.

use adaptix_core::{
    ComponentHealth, EngineConfig, EngineEvent, EventSink, FailurePrediction, MaintenanceRisk,
    MaintenanceSchedule, ResourceAllocation, ScheduleId, ScheduleStatus,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Weight on the health deficit in the priority score.
const HEALTH_DEFICIT_WEIGHT: f64 = 0.3;
/// Priority points per active alert.
const ALERT_WEIGHT: f64 = 10.0;
/// Base cost of one maintenance window.
const BASE_WINDOW_COST: f64 = 400.0;
/// Reactive repair cost relative to planned maintenance.
const REACTIVE_COST_MULTIPLIER: f64 = 2.75;

/// Estimated cost of a plan against letting the components fail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostBenefit {
    /// Cost of executing the planned maintenance
    pub preventive_cost: f64,

    /// Estimated cost of reactive repairs without the plan
    pub reactive_cost: f64,

    /// `reactive_cost - preventive_cost`
    pub estimated_savings: f64,
}

/// Result of one plan optimization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOptimization {
    /// Schedules that fit within the resource limits
    pub scheduled: Vec<MaintenanceSchedule>,

    /// Schedules postponed by resource contention
    pub postponed: Vec<MaintenanceSchedule>,

    /// Cost assessment of the accepted plan
    pub cost_benefit: CostBenefit,
}

/// Cost estimator for a maintenance plan. Swappable so deployments can
/// plug in their own accounting.
pub trait CostModel: Send + Sync {
    /// Assess the cost and savings of the given plan.
    fn assess(&self, plan: &[MaintenanceSchedule]) -> CostBenefit;
}

/// Cost model that prices a window by its allocated budget and assumes
/// reactive repair costs a fixed multiple of planned work.
#[derive(Debug, Default)]
pub struct DefaultCostModel;

impl CostModel for DefaultCostModel {
    fn assess(&self, plan: &[MaintenanceSchedule]) -> CostBenefit {
        let preventive_cost: f64 = plan.iter().map(|s| s.resources.budget).sum();
        let reactive_cost = preventive_cost * REACTIVE_COST_MULTIPLIER;
        CostBenefit {
            preventive_cost,
            reactive_cost,
            estimated_savings: reactive_cost - preventive_cost,
        }
    }
}

/// Owns the maintenance plan and rebuilds it under resource limits.
pub struct MaintenanceScheduler {
    schedules: Mutex<Vec<MaintenanceSchedule>>,
    cost_model: Box<dyn CostModel>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl MaintenanceScheduler {
    /// Create a scheduler with the default cost model.
    pub fn new(sink: Arc<dyn EventSink>, config: EngineConfig) -> Self {
        Self::with_cost_model(Box::new(DefaultCostModel), sink, config)
    }

    /// Create a scheduler with a custom cost model.
    pub fn with_cost_model(
        cost_model: Box<dyn CostModel>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            schedules: Mutex::new(Vec::new()),
            cost_model,
            sink,
            config,
        }
    }

    /// All known schedules, any status.
    pub async fn schedules(&self) -> Vec<MaintenanceSchedule> {
        self.schedules.lock().await.clone()
    }

    /// Create a schedule for the predicted failure unless the component
    /// already has one pending. Returns the schedule id when one was
    /// created.
    pub async fn ensure_scheduled(
        &self,
        prediction: &FailurePrediction,
        health: &ComponentHealth,
    ) -> Option<ScheduleId> {
        let mut schedules = self.schedules.lock().await;
        let pending = schedules.iter().any(|s| {
            s.component_id == prediction.component_id
                && matches!(
                    s.status,
                    ScheduleStatus::Scheduled | ScheduleStatus::InProgress
                )
        });
        if pending {
            return None;
        }

        let schedule = build_schedule(prediction, health);
        let id = schedule.id;
        info!(
            component_id = %schedule.component_id,
            priority = schedule.priority,
            "maintenance scheduled"
        );
        self.sink.emit(EngineEvent::MaintenanceScheduled {
            schedule_id: id,
            component_id: schedule.component_id.clone(),
            priority: schedule.priority,
            timestamp: chrono::Utc::now(),
        });
        schedules.push(schedule);
        Some(id)
    }

    /// Mark a schedule completed.
    pub async fn complete(&self, id: ScheduleId) -> bool {
        let mut schedules = self.schedules.lock().await;
        match schedules.iter_mut().find(|s| s.id == id) {
            Some(schedule) => {
                schedule.status = ScheduleStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// Rebuild the plan: highest priority first, postponing whatever the
    /// resource limits cannot cover.
    ///
    /// Postponed schedules stay in the book and compete again on the
    /// next pass.
    pub async fn optimize(&self) -> ScheduleOptimization {
        let mut schedules = self.schedules.lock().await;
        let limits = &self.config.resources;

        let mut pending: Vec<usize> = schedules
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                matches!(s.status, ScheduleStatus::Scheduled | ScheduleStatus::Postponed)
            })
            .map(|(i, _)| i)
            .collect();
        pending.sort_by(|&a, &b| schedules[b].priority.total_cmp(&schedules[a].priority));

        let mut personnel_left = limits.personnel;
        let mut budget_left = limits.budget;
        let mut slots_left = limits.equipment_slots;
        let mut accepted = Vec::new();
        let mut postponed = Vec::new();

        for index in pending {
            let schedule = &mut schedules[index];
            let fits = schedule.resources.personnel <= personnel_left
                && schedule.resources.budget <= budget_left
                && slots_left > 0;
            if fits {
                personnel_left -= schedule.resources.personnel;
                budget_left -= schedule.resources.budget;
                slots_left -= 1;
                schedule.status = ScheduleStatus::Scheduled;
                accepted.push(schedule.clone());
            } else {
                schedule.status = ScheduleStatus::Postponed;
                postponed.push(schedule.clone());
            }
        }

        let cost_benefit = self.cost_model.assess(&accepted);
        info!(
            scheduled = accepted.len(),
            postponed = postponed.len(),
            savings = cost_benefit.estimated_savings,
            "maintenance plan optimized"
        );
        self.sink.emit(EngineEvent::ScheduleOptimized {
            scheduled: accepted.len(),
            postponed: postponed.len(),
            estimated_savings: cost_benefit.estimated_savings,
            timestamp: chrono::Utc::now(),
        });

        ScheduleOptimization {
            scheduled: accepted,
            postponed,
            cost_benefit,
        }
    }
}

/// Priority is the health deficit plus alert pressure, scaled by the
/// risk multiplier.
fn priority_score(health: &ComponentHealth, risk: MaintenanceRisk) -> f64 {
    let base = (100.0 - health.overall_health) * HEALTH_DEFICIT_WEIGHT
        + health.active_alerts.len() as f64 * ALERT_WEIGHT;
    base * risk.priority_multiplier()
}

fn build_schedule(
    prediction: &FailurePrediction,
    health: &ComponentHealth,
) -> MaintenanceSchedule {
    let lead = match prediction.risk_level {
        MaintenanceRisk::Critical => Duration::hours(4),
        MaintenanceRisk::High => Duration::hours(72),
        MaintenanceRisk::Medium => Duration::days(7),
        MaintenanceRisk::Low => Duration::days(14),
    };
    let personnel = match prediction.risk_level {
        MaintenanceRisk::Critical => 3,
        MaintenanceRisk::High => 2,
        _ => 1,
    };
    let budget = BASE_WINDOW_COST * prediction.risk_level.priority_multiplier();

    let procedures = if prediction.root_causes.is_empty() {
        vec!["full diagnostic inspection".to_string()]
    } else {
        prediction
            .root_causes
            .iter()
            .map(|cause| format!("inspect and remediate: {cause}"))
            .collect()
    };

    MaintenanceSchedule {
        id: ScheduleId::new(),
        component_id: prediction.component_id.clone(),
        priority: priority_score(health, prediction.risk_level),
        scheduled_start: chrono::Utc::now() + lead,
        procedures,
        resources: ResourceAllocation {
            personnel,
            budget,
            equipment: vec!["diagnostic-kit".to_string()],
        },
        status: ScheduleStatus::Scheduled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::{NullEventSink, ResourceLimits, TimeToFailure};

    fn scheduler(limits: ResourceLimits) -> MaintenanceScheduler {
        let config = EngineConfig {
            resources: limits,
            ..Default::default()
        };
        MaintenanceScheduler::new(Arc::new(NullEventSink), config)
    }

    fn prediction(component: &str, risk: MaintenanceRisk, probability: f64) -> FailurePrediction {
        FailurePrediction {
            component_id: component.to_string(),
            failure_probability: probability,
            time_to_failure: TimeToFailure {
                estimate_hours: 100.0,
                confidence: 0.7,
                range_hours: (70.0, 130.0),
            },
            risk_level: risk,
            symptoms: vec![],
            root_causes: vec!["recurring faults raising the error rate".to_string()],
            recommendations: vec![],
            predicted_at: chrono::Utc::now(),
        }
    }

    fn health(component: &str, overall: f64, alerts: usize) -> ComponentHealth {
        let mut health = ComponentHealth::new(component, 100);
        health.overall_health = overall;
        health.active_alerts = (0..alerts).map(|i| format!("alert-{i}")).collect();
        health
    }

    #[tokio::test]
    async fn priority_scales_with_risk_multiplier() {
        let record = health("db-1", 40.0, 2);
        let low = priority_score(&record, MaintenanceRisk::Low);
        let critical = priority_score(&record, MaintenanceRisk::Critical);
        // deficit 60 * 0.3 + 2 alerts * 10 = 38, times 1x and 4x.
        assert!((low - 38.0).abs() < 1e-9);
        assert!((critical - 152.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pending_component_is_not_scheduled_twice() {
        let scheduler = scheduler(ResourceLimits::default());
        let forecast = prediction("db-1", MaintenanceRisk::High, 75.0);
        let record = health("db-1", 25.0, 1);

        assert!(scheduler.ensure_scheduled(&forecast, &record).await.is_some());
        assert!(scheduler.ensure_scheduled(&forecast, &record).await.is_none());
        assert_eq!(scheduler.schedules().await.len(), 1);
    }

    #[tokio::test]
    async fn completed_schedule_frees_the_component() {
        let scheduler = scheduler(ResourceLimits::default());
        let forecast = prediction("db-1", MaintenanceRisk::High, 75.0);
        let record = health("db-1", 25.0, 1);

        let id = scheduler.ensure_scheduled(&forecast, &record).await.unwrap();
        assert!(scheduler.complete(id).await);
        assert!(scheduler.ensure_scheduled(&forecast, &record).await.is_some());
    }

    #[tokio::test]
    async fn optimize_postpones_past_the_personnel_limit() {
        let scheduler = scheduler(ResourceLimits {
            personnel: 3,
            budget: 100_000.0,
            equipment_slots: 10,
        });
        // One critical (3 people) and one high (2 people): only one fits.
        scheduler
            .ensure_scheduled(
                &prediction("db-1", MaintenanceRisk::Critical, 95.0),
                &health("db-1", 10.0, 3),
            )
            .await;
        scheduler
            .ensure_scheduled(
                &prediction("cache-1", MaintenanceRisk::High, 75.0),
                &health("cache-1", 30.0, 1),
            )
            .await;

        let plan = scheduler.optimize().await;
        assert_eq!(plan.scheduled.len(), 1);
        assert_eq!(plan.scheduled[0].component_id, "db-1");
        assert_eq!(plan.postponed.len(), 1);
        assert_eq!(plan.postponed[0].status, ScheduleStatus::Postponed);
    }

    #[tokio::test]
    async fn higher_priority_wins_the_last_slot() {
        let scheduler = scheduler(ResourceLimits {
            personnel: 10,
            budget: 100_000.0,
            equipment_slots: 1,
        });
        scheduler
            .ensure_scheduled(
                &prediction("cache-1", MaintenanceRisk::High, 75.0),
                &health("cache-1", 50.0, 0),
            )
            .await;
        scheduler
            .ensure_scheduled(
                &prediction("db-1", MaintenanceRisk::Critical, 95.0),
                &health("db-1", 10.0, 3),
            )
            .await;

        let plan = scheduler.optimize().await;
        assert_eq!(plan.scheduled[0].component_id, "db-1");
    }

    #[tokio::test]
    async fn savings_track_the_reactive_multiplier() {
        let scheduler = scheduler(ResourceLimits::default());
        scheduler
            .ensure_scheduled(
                &prediction("db-1", MaintenanceRisk::High, 75.0),
                &health("db-1", 25.0, 1),
            )
            .await;

        let plan = scheduler.optimize().await;
        let cost = plan.cost_benefit.preventive_cost;
        assert!(cost > 0.0);
        assert!((plan.cost_benefit.reactive_cost - cost * 2.75).abs() < 1e-9);
        assert!((plan.cost_benefit.estimated_savings - cost * 1.75).abs() < 1e-9);
    }
}
