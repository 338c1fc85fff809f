//! Observability infrastructure for the rightsizing service
//!
//! Provides:
//! - Prometheus metrics (evaluation latency, ingestion volume, recommendation counts)
//! - Structured JSON logging with tracing

use crate::models::{Recommendation, RecommendationStatus};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for evaluation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    evaluation_latency_seconds: Histogram,
    telemetry_records_ingested: IntCounter,
    duplicate_batches: IntCounter,
    ingestion_rejections: IntCounter,
    recommendations_generated: IntCounterVec,
    devices_evaluated: IntGauge,
    status_transitions: IntCounterVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            evaluation_latency_seconds: register_histogram!(
                "rightsize_evaluation_latency_seconds",
                "Time spent evaluating a tenant's telemetry into recommendations",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register evaluation_latency_seconds"),

            telemetry_records_ingested: register_int_counter!(
                "rightsize_telemetry_records_ingested_total",
                "Telemetry samples accepted by the ingestion endpoint"
            )
            .expect("Failed to register telemetry_records_ingested"),

            duplicate_batches: register_int_counter!(
                "rightsize_duplicate_batches_total",
                "Telemetry batches dropped by the dedup ledger"
            )
            .expect("Failed to register duplicate_batches"),

            ingestion_rejections: register_int_counter!(
                "rightsize_ingestion_rejections_total",
                "Ingestion payloads rejected by boundary validation"
            )
            .expect("Failed to register ingestion_rejections"),

            recommendations_generated: register_int_counter_vec!(
                "rightsize_recommendations_generated_total",
                "Recommendations produced, by classification",
                &["classification"]
            )
            .expect("Failed to register recommendations_generated"),

            devices_evaluated: register_int_gauge!(
                "rightsize_devices_evaluated",
                "Devices covered by the most recent evaluation run"
            )
            .expect("Failed to register devices_evaluated"),

            status_transitions: register_int_counter_vec!(
                "rightsize_status_transitions_total",
                "Recommendation status changes, by target status",
                &["status"]
            )
            .expect("Failed to register status_transitions"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner().evaluation_latency_seconds.observe(duration_secs);
    }

    pub fn add_telemetry_records(&self, count: usize) {
        self.inner().telemetry_records_ingested.inc_by(count as u64);
    }

    pub fn inc_duplicate_batches(&self) {
        self.inner().duplicate_batches.inc();
    }

    pub fn inc_ingestion_rejections(&self) {
        self.inner().ingestion_rejections.inc();
    }

    /// Payloads rejected at the ingestion boundary so far
    pub fn ingestion_rejections(&self) -> u64 {
        self.inner().ingestion_rejections.get()
    }

    pub fn inc_recommendations(&self, classification: &str) {
        self.inner()
            .recommendations_generated
            .with_label_values(&[classification])
            .inc();
    }

    pub fn set_devices_evaluated(&self, count: i64) {
        self.inner().devices_evaluated.set(count);
    }

    pub fn inc_status_transitions(&self, status: RecommendationStatus) {
        self.inner()
            .status_transitions
            .with_label_values(&[status.as_str()])
            .inc();
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_telemetry_ingested(&self, tenant_id: &str, source: &str, batch_id: &str, records: usize) {
        info!(
            event = "telemetry_ingested",
            service = %self.service,
            tenant_id = %tenant_id,
            source = %source,
            batch_id = %batch_id,
            records = records,
            "Accepted telemetry batch"
        );
    }

    pub fn log_duplicate_batch(&self, tenant_id: &str, source: &str, batch_id: &str) {
        info!(
            event = "telemetry_batch_duplicate",
            service = %self.service,
            tenant_id = %tenant_id,
            source = %source,
            batch_id = %batch_id,
            "Dropped duplicate telemetry batch"
        );
    }

    pub fn log_ingestion_rejected(&self, tenant_id: &str, reason: &str) {
        warn!(
            event = "ingestion_rejected",
            service = %self.service,
            tenant_id = %tenant_id,
            reason = %reason,
            "Rejected ingestion payload"
        );
    }

    pub fn log_capabilities_ingested(&self, tenant_id: &str, source: &str, snapshots: usize) {
        info!(
            event = "capabilities_ingested",
            service = %self.service,
            tenant_id = %tenant_id,
            source = %source,
            snapshots = snapshots,
            "Accepted capability snapshots"
        );
    }

    pub fn log_recommendation(&self, rec: &Recommendation) {
        info!(
            event = "recommendation_generated",
            service = %self.service,
            tenant_id = %rec.tenant_id,
            device_key = %rec.device_key,
            recommendation_id = %rec.recommendation_id,
            classification = %rec.classification,
            action = %rec.action,
            confidence = rec.confidence,
            workload_fit_score = rec.workload_fit_score,
            overprovision_score = rec.overprovision_score,
            thermal_risk = !rec.risk_flags.is_empty(),
            "Generated rightsizing recommendation"
        );
    }

    pub fn log_evaluation(&self, tenant_id: &str, policy_id: Option<&str>, devices: usize, duration_secs: f64) {
        info!(
            event = "evaluation_completed",
            service = %self.service,
            tenant_id = %tenant_id,
            policy_id = ?policy_id,
            devices = devices,
            duration_secs = duration_secs,
            "Evaluation run completed"
        );
    }

    pub fn log_status_change(
        &self,
        recommendation_id: &str,
        from: RecommendationStatus,
        to: RecommendationStatus,
    ) {
        info!(
            event = "recommendation_status_changed",
            service = %self.service,
            recommendation_id = %recommendation_id,
            from = %from,
            to = %to,
            "Recommendation status changed"
        );
    }

    pub fn log_status_change_rejected(&self, recommendation_id: &str, to: RecommendationStatus, reason: &str) {
        warn!(
            event = "recommendation_status_rejected",
            service = %self.service,
            recommendation_id = %recommendation_id,
            to = %to,
            reason = %reason,
            "Rejected recommendation status change"
        );
    }

    pub fn log_policy_created(&self, policy_id: &str, tenant_id: &str, name: &str) {
        info!(
            event = "policy_created",
            service = %self.service,
            policy_id = %policy_id,
            tenant_id = %tenant_id,
            name = %name,
            "Policy created"
        );
    }

    pub fn log_policy_updated(&self, policy_id: &str) {
        info!(
            event = "policy_updated",
            service = %self.service,
            policy_id = %policy_id,
            "Policy updated"
        );
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            port = port,
            "Rightsizing service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Rightsizing service shutting down"
        );
    }
}
