//! Predictive maintenance: health monitoring, failure prediction and
//! resource-bounded maintenance scheduling.

mod monitor;
mod predictor;
mod scheduler;

pub use monitor::HealthMonitor;
pub use predictor::FailurePredictor;
pub use scheduler::{
    CostBenefit, CostModel, DefaultCostModel, MaintenanceScheduler, ScheduleOptimization,
};
