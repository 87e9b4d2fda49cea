//! Component health, failure predictions and maintenance schedules.

use crate::id::ScheduleId;
use crate::Time;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Direction component health is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTrend {
    /// Health is recovering
    Improving,
    /// No significant movement
    Stable,
    /// Health is falling
    Degrading,
}

/// Operational figures used by the failure predictor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationalData {
    /// Errors per hour
    pub error_rate: f64,

    /// Throughput efficiency in [0, 1]
    pub efficiency: f64,

    /// Hours since the last completed maintenance
    pub hours_since_maintenance: f64,
}

/// One health snapshot kept in the bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSample {
    /// Health score at sample time
    pub overall_health: f64,

    /// Raw metric readings
    pub metrics: HashMap<String, f64>,

    /// Sample time
    pub recorded_at: Time,
}

/// Live health record for one monitored component.
///
/// `history` is a fixed-size sliding buffer; the oldest sample is evicted
/// on overflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier (caller-assigned)
    pub component_id: String,

    /// Aggregate health in [0, 100]
    pub overall_health: f64,

    /// Current trend
    pub trend: HealthTrend,

    /// Mean time between failures, hours
    pub mtbf_hours: f64,

    /// Mean time to repair, hours
    pub mttr_hours: f64,

    /// Operational figures
    pub operational: OperationalData,

    /// Currently firing alerts
    pub active_alerts: Vec<String>,

    /// Bounded metric history, oldest first
    pub history: VecDeque<HealthSample>,

    /// Maximum history length
    pub history_capacity: usize,

    /// Last ingestion time
    pub updated_at: Time,
}

impl ComponentHealth {
    /// Create a fresh record with full health and empty history.
    pub fn new(component_id: impl Into<String>, history_capacity: usize) -> Self {
        Self {
            component_id: component_id.into(),
            overall_health: 100.0,
            trend: HealthTrend::Stable,
            mtbf_hours: 720.0,
            mttr_hours: 4.0,
            operational: OperationalData::default(),
            active_alerts: Vec::new(),
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            updated_at: chrono::Utc::now(),
        }
    }

    /// Append a sample, evicting the oldest on overflow.
    pub fn push_sample(&mut self, sample: HealthSample) {
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }
}

/// Risk classification for a failure prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceRisk {
    /// Probability below 40
    Low,
    /// Probability in [40, 70)
    Medium,
    /// Probability in [70, 90)
    High,
    /// Probability 90 or above
    Critical,
}

impl MaintenanceRisk {
    /// Priority multiplier used by the scheduler.
    pub fn priority_multiplier(&self) -> f64 {
        match self {
            MaintenanceRisk::Critical => 4.0,
            MaintenanceRisk::High => 3.0,
            MaintenanceRisk::Medium => 2.0,
            MaintenanceRisk::Low => 1.0,
        }
    }
}

impl std::fmt::Display for MaintenanceRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceRisk::Low => write!(f, "low"),
            MaintenanceRisk::Medium => write!(f, "medium"),
            MaintenanceRisk::High => write!(f, "high"),
            MaintenanceRisk::Critical => write!(f, "critical"),
        }
    }
}

/// Estimated time until failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeToFailure {
    /// Point estimate, hours
    pub estimate_hours: f64,

    /// Confidence in the estimate, [0, 1]
    pub confidence: f64,

    /// (low, high) bounds around the estimate
    pub range_hours: (f64, f64),
}

/// Failure forecast for one component.
///
/// At most one active record per component; superseded each prediction
/// cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePrediction {
    /// Component the forecast applies to
    pub component_id: String,

    /// Failure probability in [0, 100]
    pub failure_probability: f64,

    /// Time-to-failure estimate
    pub time_to_failure: TimeToFailure,

    /// Risk classification
    pub risk_level: MaintenanceRisk,

    /// Observed symptoms (threshold breaches)
    pub symptoms: Vec<String>,

    /// Likely root causes
    pub root_causes: Vec<String>,

    /// Recommendations scaled to the risk level
    pub recommendations: Vec<String>,

    /// Prediction time
    pub predicted_at: Time,
}

/// Lifecycle status of a maintenance schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Planned, not yet started
    Scheduled,
    /// Work underway
    InProgress,
    /// Work done
    Completed,
    /// Pushed back, typically by resource contention
    Postponed,
    /// Dropped
    Cancelled,
}

/// Resources allocated to a scheduled maintenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceAllocation {
    /// Technicians assigned
    pub personnel: u32,

    /// Budget assigned
    pub budget: f64,

    /// Named equipment reserved
    pub equipment: Vec<String>,
}

/// A planned maintenance window for one component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    /// Unique identifier
    pub id: ScheduleId,

    /// Component being maintained
    pub component_id: String,

    /// Scheduler priority score (higher runs earlier)
    pub priority: f64,

    /// Planned start time
    pub scheduled_start: Time,

    /// Procedures to perform
    pub procedures: Vec<String>,

    /// Allocated resources
    pub resources: ResourceAllocation,

    /// Lifecycle status
    pub status: ScheduleStatus,
}
