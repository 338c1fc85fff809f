//! Evaluation entry point
//!
//! Fetches a tenant's telemetry from a [`TelemetrySource`], runs the scoring
//! pipeline once per device, and publishes each recommendation to a
//! [`RecommendationSink`]. Identity generation is injected through
//! [`IdGenerator`] so a run is reproducible under test.

use crate::error::Result;
use crate::models::{Recommendation, TelemetrySample};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::policy::PolicyProfile;
use crate::scoring::{Assessor, RecommendationBuilder};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Supplies a tenant's telemetry in arrival order
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch_telemetry(&self, tenant_id: &str) -> Result<Vec<TelemetrySample>>;
}

/// Accepts produced recommendations; inserts are keyed by recommendation id
#[async_trait]
pub trait RecommendationSink: Send + Sync {
    async fn publish(&self, recommendation: Recommendation) -> Result<()>;
}

/// Source of fresh, unique record identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix>-<n>` identifiers starting at 1
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Inputs that identify one evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    pub tenant_id: String,
    pub run_date: NaiveDate,
    pub policy_id: Option<String>,
}

impl EvaluationContext {
    pub fn new(tenant_id: impl Into<String>, run_date: NaiveDate) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            run_date,
            policy_id: None,
        }
    }

    /// Run dated today (UTC)
    pub fn today(tenant_id: impl Into<String>) -> Self {
        Self::new(tenant_id, Utc::now().date_naive())
    }

    pub fn with_policy(mut self, policy: &PolicyProfile) -> Self {
        self.policy_id = Some(policy.policy_id.clone());
        self
    }
}

/// Group samples by device key, keeping first-appearance order of devices
/// and arrival order of samples within a device
pub fn group_by_device(samples: &[TelemetrySample]) -> Vec<(&str, Vec<&TelemetrySample>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&TelemetrySample>)> = Vec::new();
    for sample in samples {
        let key = sample.device_key.as_str();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(sample);
    }
    groups
}

/// Runs the rightsizing pipeline for a tenant
pub struct Evaluator {
    assessor: Assessor,
    builder: RecommendationBuilder,
    ids: Arc<dyn IdGenerator>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl Evaluator {
    pub fn new(ids: Arc<dyn IdGenerator>, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            assessor: Assessor::default(),
            builder: RecommendationBuilder::new(),
            ids,
            metrics,
            logger,
        }
    }

    /// One recommendation per distinct device in `samples`
    ///
    /// Synchronous and free of shared state; identical input and id sequence
    /// give identical output.
    pub fn recommend(&self, ctx: &EvaluationContext, samples: &[TelemetrySample]) -> Vec<Recommendation> {
        group_by_device(samples)
            .into_iter()
            .map(|(device_key, device_samples)| {
                let assessment = self.assessor.assess(device_key, device_samples);
                self.builder
                    .build(&ctx.tenant_id, ctx.run_date, &assessment, self.ids.next_id())
            })
            .collect()
    }

    /// Fetch, evaluate and publish one tenant's recommendations
    pub async fn run(
        &self,
        ctx: &EvaluationContext,
        source: &dyn TelemetrySource,
        sink: &dyn RecommendationSink,
    ) -> Result<Vec<Recommendation>> {
        let started = Instant::now();
        let samples = source.fetch_telemetry(&ctx.tenant_id).await?;
        let recommendations = self.recommend(ctx, &samples);
        let elapsed = started.elapsed().as_secs_f64();

        for rec in &recommendations {
            self.logger.log_recommendation(rec);
            self.metrics.inc_recommendations(rec.classification.as_str());
            sink.publish(rec.clone()).await?;
        }

        self.metrics.observe_evaluation_latency(elapsed);
        self.metrics.set_devices_evaluated(recommendations.len() as i64);
        self.logger.log_evaluation(
            &ctx.tenant_id,
            ctx.policy_id.as_deref(),
            recommendations.len(),
            elapsed,
        );

        Ok(recommendations)
    }
}
