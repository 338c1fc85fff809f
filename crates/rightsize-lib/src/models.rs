//! Core data models for the rightsizing service
//!
//! Optional telemetry fields default once, at deserialization time, so the
//! scoring pipeline never has to reason about missing values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// GPU counters for one collection interval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuRecord {
    /// Utilization percentage, 0..=100
    pub util_pct: f64,
    /// Dedicated video memory in use, MB
    pub vram_used_mb: f64,
    /// Minutes the GPU was busy during the interval
    pub active_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuRecord {
    pub util_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RamRecord {
    pub used_pct: f64,
    /// Minutes with measurable paging pressure
    pub paging_pressure: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskRecord {
    pub latency_ms: f64,
    pub busy_pct: f64,
    pub queue_len: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalRecord {
    pub throttle_event: bool,
}

/// Session context; retained but not scored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub vdi: bool,
    /// Share of the interval with user input, 0..=1
    pub interactive_ratio: f64,
}

/// Foreground time attributed to one application category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppUsage {
    pub category: String,
    pub active_minutes: u32,
}

/// One device's telemetry for one collection interval
///
/// Every sub-record defaults to zero / false / empty when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub device_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
    #[serde(default)]
    pub gpu: GpuRecord,
    #[serde(default)]
    pub cpu: CpuRecord,
    #[serde(default)]
    pub ram: RamRecord,
    #[serde(default)]
    pub disk: DiskRecord,
    #[serde(default)]
    pub thermal: ThermalRecord,
    #[serde(default)]
    pub apps: Vec<AppUsage>,
}

impl TelemetrySample {
    /// Sample with every counter at its default
    pub fn empty(device_key: impl Into<String>) -> Self {
        Self {
            device_key: device_key.into(),
            observed_at: None,
            session: None,
            gpu: GpuRecord::default(),
            cpu: CpuRecord::default(),
            ram: RamRecord::default(),
            disk: DiskRecord::default(),
            thermal: ThermalRecord::default(),
            apps: Vec::new(),
        }
    }
}

/// Statistical summary of a device's samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalVector {
    pub gpu_util_p95: f64,
    pub vram_used_p95_pct: f64,
    pub cpu_util_p95: f64,
    pub ram_used_p95: f64,
    pub paging_pressure_minutes: f64,
    pub disk_latency_p95_ms: f64,
    pub disk_busy_minutes: f64,
    pub disk_queue_p95: f64,
    pub thermal_throttle_events: u32,
    pub active_minutes: f64,
    pub light_app_mix_factor: f64,
}

/// Composite scores derived from a [`SignalVector`]
///
/// Pressures and the thermal penalty lie in `[0, 1]`; `fit` and `overprov`
/// lie in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub gpu_pressure: f64,
    pub cpu_pressure: f64,
    pub ram_pressure: f64,
    pub disk_score: f64,
    pub thermal_penalty: f64,
    pub fit: f64,
    pub overprov: f64,
}

impl ScoreVector {
    /// Highest single-resource pressure
    pub fn critical(&self) -> f64 {
        self.gpu_pressure
            .max(self.cpu_pressure)
            .max(self.ram_pressure)
            .max(self.disk_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Underpowered,
    Overprovisioned,
    RightSized,
}

impl Classification {
    /// Each classification carries exactly one action
    pub fn recommended_action(self) -> Action {
        match self {
            Classification::Underpowered => Action::Upsize,
            Classification::Overprovisioned => Action::Downsize,
            Classification::RightSized => Action::ExtendLife,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Underpowered => "UNDERPOWERED",
            Classification::Overprovisioned => "OVERPROVISIONED",
            Classification::RightSized => "RIGHT_SIZED",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Upsize,
    Downsize,
    ExtendLife,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Upsize => "UPSIZE",
            Action::Downsize => "DOWNSIZE",
            Action::ExtendLife => "EXTEND_LIFE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationStatus {
    Pending,
    NoAction,
    Approved,
    Overridden,
}

impl RecommendationStatus {
    /// Only pending recommendations can be decided, and only once
    pub fn can_transition_to(self, next: RecommendationStatus) -> bool {
        matches!(
            (self, next),
            (
                RecommendationStatus::Pending,
                RecommendationStatus::Approved | RecommendationStatus::Overridden
            )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "PENDING",
            RecommendationStatus::NoAction => "NO_ACTION",
            RecommendationStatus::Approved => "APPROVED",
            RecommendationStatus::Overridden => "OVERRIDDEN",
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    Thermal,
}

impl RiskFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskFlag::Thermal => "THERMAL",
        }
    }
}

/// Rightsizing recommendation for one device from one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: String,
    pub tenant_id: String,
    pub device_key: String,
    pub run_date: NaiveDate,
    pub classification: Classification,
    pub action: Action,
    pub confidence: f64,
    pub workload_fit_score: f64,
    pub overprovision_score: f64,
    pub expected_savings_usd_annual: f64,
    pub risk_flags: BTreeSet<RiskFlag>,
    pub top_reasons: [String; 3],
    pub status: RecommendationStatus,
}
