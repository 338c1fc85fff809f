//! Storage abstractions
//!
//! Repositories are injected into the evaluation entry point and the HTTP
//! layer; the scoring pipeline never touches them directly.

mod memory;

pub use memory::InMemoryStore;

use crate::error::Result;
use crate::ingest::{CapabilityBatch, IngestionAck, TelemetryBatch};
use crate::models::{Recommendation, RecommendationStatus};
use crate::policy::PolicyProfile;
use serde::{Deserialize, Serialize};

/// Telemetry intake with the batch dedup ledger
pub trait TelemetryRepository: Send + Sync {
    /// Append a batch unless `(tenant_id, source, batch_id)` was already seen
    fn ingest_telemetry(&self, batch: TelemetryBatch) -> IngestionAck;

    fn ingest_capabilities(&self, batch: CapabilityBatch) -> IngestionAck;
}

pub trait PolicyRepository: Send + Sync {
    fn get_policy(&self, policy_id: &str) -> Option<PolicyProfile>;

    fn put_policy(&self, policy: PolicyProfile);
}

pub trait RecommendationRepository: Send + Sync {
    fn get_recommendation(&self, recommendation_id: &str) -> Option<Recommendation>;

    fn put_recommendation(&self, recommendation: Recommendation);

    /// Matching recommendations in insertion order
    fn list_recommendations(&self, filter: &RecommendationFilter) -> Vec<Recommendation>;

    /// Apply a lifecycle transition, returning the previous status and the
    /// updated record
    fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
    ) -> Result<(RecommendationStatus, Recommendation)>;
}

/// Query over a tenant's recommendations
///
/// `action` and `classification` compare against the wire literals, so an
/// unknown value simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFilter {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

impl RecommendationFilter {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, rec: &Recommendation) -> bool {
        rec.tenant_id == self.tenant_id
            && self
                .action
                .as_deref()
                .map_or(true, |a| a.is_empty() || rec.action.as_str() == a)
            && self
                .classification
                .as_deref()
                .map_or(true, |c| c.is_empty() || rec.classification.as_str() == c)
            && self.min_confidence.map_or(true, |min| rec.confidence >= min)
    }
}
