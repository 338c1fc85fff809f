//! Ingestion payloads and boundary validation
//!
//! Payloads are checked here before any sample reaches the store or the
//! scoring pipeline, so scoring never sees out-of-range counters.

use crate::error::{Result, RightsizeError};
use crate::models::TelemetrySample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    DEFAULT_SCHEMA_VERSION.to_string()
}

/// Batch of telemetry samples pushed by a collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub tenant_id: String,
    pub source: String,
    pub batch_id: String,
    pub sent_at: DateTime<Utc>,
    pub records: Vec<TelemetrySample>,
}

/// Dedup key for the ingestion ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub tenant_id: String,
    pub source: String,
    pub batch_id: String,
}

impl TelemetryBatch {
    pub fn key(&self) -> BatchKey {
        BatchKey {
            tenant_id: self.tenant_id.clone(),
            source: self.source.clone(),
            batch_id: self.batch_id.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("tenant_id", &self.tenant_id)?;
        require_non_empty("source", &self.source)?;
        require_non_empty("batch_id", &self.batch_id)?;

        for (i, r) in self.records.iter().enumerate() {
            let at = |field: &str| format!("records[{}].{}", i, field);
            require_non_empty(&at("device_key"), &r.device_key)?;
            require_pct(&at("gpu.util_pct"), r.gpu.util_pct)?;
            require_non_negative(&at("gpu.vram_used_mb"), r.gpu.vram_used_mb)?;
            require_pct(&at("cpu.util_pct"), r.cpu.util_pct)?;
            require_pct(&at("ram.used_pct"), r.ram.used_pct)?;
            require_non_negative(&at("disk.latency_ms"), r.disk.latency_ms)?;
            require_pct(&at("disk.busy_pct"), r.disk.busy_pct)?;
            require_non_negative(&at("disk.queue_len"), r.disk.queue_len)?;
            if let Some(session) = &r.session {
                require_ratio(&at("session.interactive_ratio"), session.interactive_ratio)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCpu {
    pub model: String,
    pub cores: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityStorage {
    #[serde(rename = "type")]
    pub kind: String,
    pub total_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityGpu {
    pub vendor: String,
    pub model: String,
    pub vram_gb: u32,
    pub driver: String,
}

/// Installed hardware of one device at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub device_key: String,
    pub captured_at: DateTime<Utc>,
    pub cpu: CapabilityCpu,
    pub ram_gb: u32,
    pub storage: CapabilityStorage,
    pub gpu: CapabilityGpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityBatch {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub tenant_id: String,
    pub source: String,
    pub snapshots: Vec<CapabilitySnapshot>,
}

impl CapabilityBatch {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("tenant_id", &self.tenant_id)?;
        require_non_empty("source", &self.source)?;

        for (i, s) in self.snapshots.iter().enumerate() {
            let at = |field: &str| format!("snapshots[{}].{}", i, field);
            require_non_empty(&at("device_key"), &s.device_key)?;
            require_positive(&at("cpu.cores"), s.cpu.cores)?;
            require_positive(&at("ram_gb"), s.ram_gb)?;
            require_positive(&at("storage.total_gb"), s.storage.total_gb)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Accepted,
    Duplicate,
}

/// Acknowledgement returned for every ingestion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionAck {
    pub status: AckStatus,
    pub tenant_id: String,
    pub accepted_records: usize,
    #[serde(default)]
    pub deduped: bool,
}

impl IngestionAck {
    pub fn accepted(tenant_id: impl Into<String>, accepted_records: usize) -> Self {
        Self {
            status: AckStatus::Accepted,
            tenant_id: tenant_id.into(),
            accepted_records,
            deduped: false,
        }
    }

    pub fn duplicate(tenant_id: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Duplicate,
            tenant_id: tenant_id.into(),
            accepted_records: 0,
            deduped: true,
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RightsizeError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(RightsizeError::Validation(format!(
            "{} must be a finite value >= 0, got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_pct(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(RightsizeError::Validation(format!(
            "{} must be within [0, 100], got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_ratio(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(RightsizeError::Validation(format!(
            "{} must be within [0, 1], got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(RightsizeError::Validation(format!("{} must be > 0", field)));
    }
    Ok(())
}
