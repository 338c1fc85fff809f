//! Process-local repositories backed by concurrent maps
//!
//! Nothing here survives a restart.

use super::{PolicyRepository, RecommendationFilter, RecommendationRepository, TelemetryRepository};
use crate::engine::{RecommendationSink, TelemetrySource};
use crate::error::{Result, RightsizeError};
use crate::ingest::{BatchKey, CapabilityBatch, IngestionAck, TelemetryBatch};
use crate::models::{Recommendation, RecommendationStatus, TelemetrySample};
use crate::policy::PolicyProfile;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredRecommendation {
    seq: u64,
    recommendation: Recommendation,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    ledger: DashSet<BatchKey>,
    telemetry: DashMap<String, Vec<TelemetryBatch>>,
    capabilities: DashMap<String, Vec<CapabilityBatch>>,
    policies: DashMap<String, PolicyProfile>,
    recommendations: DashMap<String, StoredRecommendation>,
    next_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sample stored for a tenant, in batch arrival order
    pub fn telemetry_for(&self, tenant_id: &str) -> Vec<TelemetrySample> {
        self.telemetry
            .get(tenant_id)
            .map(|batches| {
                batches
                    .iter()
                    .flat_map(|b| b.records.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn capabilities_for(&self, tenant_id: &str) -> Vec<CapabilityBatch> {
        self.capabilities
            .get(tenant_id)
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }
}

impl TelemetryRepository for InMemoryStore {
    fn ingest_telemetry(&self, batch: TelemetryBatch) -> IngestionAck {
        if !self.ledger.insert(batch.key()) {
            debug!(
                tenant_id = %batch.tenant_id,
                batch_id = %batch.batch_id,
                "Batch already in ledger"
            );
            return IngestionAck::duplicate(batch.tenant_id);
        }
        let ack = IngestionAck::accepted(batch.tenant_id.clone(), batch.records.len());
        self.telemetry
            .entry(batch.tenant_id.clone())
            .or_default()
            .push(batch);
        ack
    }

    fn ingest_capabilities(&self, batch: CapabilityBatch) -> IngestionAck {
        let ack = IngestionAck::accepted(batch.tenant_id.clone(), batch.snapshots.len());
        self.capabilities
            .entry(batch.tenant_id.clone())
            .or_default()
            .push(batch);
        ack
    }
}

impl PolicyRepository for InMemoryStore {
    fn get_policy(&self, policy_id: &str) -> Option<PolicyProfile> {
        self.policies.get(policy_id).map(|p| p.clone())
    }

    fn put_policy(&self, policy: PolicyProfile) {
        self.policies.insert(policy.policy_id.clone(), policy);
    }
}

impl RecommendationRepository for InMemoryStore {
    fn get_recommendation(&self, recommendation_id: &str) -> Option<Recommendation> {
        self.recommendations
            .get(recommendation_id)
            .map(|r| r.recommendation.clone())
    }

    fn put_recommendation(&self, recommendation: Recommendation) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.recommendations.insert(
            recommendation.recommendation_id.clone(),
            StoredRecommendation {
                seq,
                recommendation,
            },
        );
    }

    fn list_recommendations(&self, filter: &RecommendationFilter) -> Vec<Recommendation> {
        let mut matched: Vec<(u64, Recommendation)> = self
            .recommendations
            .iter()
            .filter(|r| filter.matches(&r.recommendation))
            .map(|r| (r.seq, r.recommendation.clone()))
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, rec)| rec).collect()
    }

    fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
    ) -> Result<(RecommendationStatus, Recommendation)> {
        let mut entry = self
            .recommendations
            .get_mut(recommendation_id)
            .ok_or_else(|| RightsizeError::recommendation_not_found(recommendation_id))?;

        let rec = &mut entry.recommendation;
        let previous = rec.status;
        if !previous.can_transition_to(status) {
            return Err(RightsizeError::InvalidTransition {
                id: recommendation_id.to_string(),
                from: previous,
                to: status,
            });
        }
        rec.status = status;
        Ok((previous, rec.clone()))
    }
}

#[async_trait]
impl TelemetrySource for InMemoryStore {
    async fn fetch_telemetry(&self, tenant_id: &str) -> Result<Vec<TelemetrySample>> {
        Ok(self.telemetry_for(tenant_id))
    }
}

#[async_trait]
impl RecommendationSink for InMemoryStore {
    async fn publish(&self, recommendation: Recommendation) -> Result<()> {
        self.put_recommendation(recommendation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Classification};
    use crate::policy::PolicyCreate;
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn batch(tenant: &str, batch_id: &str, devices: &[&str]) -> TelemetryBatch {
        TelemetryBatch {
            schema_version: "1.0".to_string(),
            tenant_id: tenant.to_string(),
            source: "windows_collector".to_string(),
            batch_id: batch_id.to_string(),
            sent_at: Utc::now(),
            records: devices.iter().map(|d| TelemetrySample::empty(*d)).collect(),
        }
    }

    fn recommendation(id: &str, tenant: &str, classification: Classification, confidence: f64) -> Recommendation {
        let action = classification.recommended_action();
        Recommendation {
            recommendation_id: id.to_string(),
            tenant_id: tenant.to_string(),
            device_key: format!("dev-{}", id),
            run_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            classification,
            action,
            confidence,
            workload_fit_score: 80.0,
            overprovision_score: 70.0,
            expected_savings_usd_annual: 0.0,
            risk_flags: BTreeSet::new(),
            top_reasons: [
                "GPU pressure=0.00".to_string(),
                "RAM pressure=0.00".to_string(),
                "Disk score=0.00".to_string(),
            ],
            status: if action == Action::ExtendLife {
                RecommendationStatus::NoAction
            } else {
                RecommendationStatus::Pending
            },
        }
    }

    #[test]
    fn test_duplicate_batches_are_ignored() {
        let store = InMemoryStore::new();
        let first = store.ingest_telemetry(batch("tenant-a", "b-1", &["WIN-1"]));
        assert_eq!(first.accepted_records, 1);
        assert!(!first.deduped);

        let second = store.ingest_telemetry(batch("tenant-a", "b-1", &["WIN-1"]));
        assert_eq!(second.accepted_records, 0);
        assert!(second.deduped);
        assert_eq!(store.telemetry_for("tenant-a").len(), 1);

        // Same batch id from another tenant is a different batch
        let other = store.ingest_telemetry(batch("tenant-b", "b-1", &["WIN-9"]));
        assert!(!other.deduped);
    }

    #[test]
    fn test_telemetry_keeps_arrival_order() {
        let store = InMemoryStore::new();
        store.ingest_telemetry(batch("tenant-a", "b-1", &["A", "B"]));
        store.ingest_telemetry(batch("tenant-a", "b-2", &["C"]));
        let keys: Vec<String> = store
            .telemetry_for("tenant-a")
            .into_iter()
            .map(|s| s.device_key)
            .collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert!(store.telemetry_for("nobody").is_empty());
    }

    #[test]
    fn test_policy_round_trip() {
        let store = InMemoryStore::new();
        let input = PolicyCreate {
            tenant_id: "tenant-a".to_string(),
            name: "default".to_string(),
            strict_mode: false,
            thresholds: Default::default(),
            auto_execute_rules: Default::default(),
        };
        let policy = PolicyProfile::create(input, "pol-1".to_string(), Utc::now());
        store.put_policy(policy.clone());
        assert_eq!(store.get_policy("pol-1"), Some(policy));
        assert!(store.get_policy("pol-2").is_none());
    }

    #[test]
    fn test_list_filters_and_order() {
        let store = InMemoryStore::new();
        store.put_recommendation(recommendation("r1", "tenant-a", Classification::Overprovisioned, 0.9));
        store.put_recommendation(recommendation("r2", "tenant-a", Classification::RightSized, 0.7));
        store.put_recommendation(recommendation("r3", "tenant-b", Classification::Overprovisioned, 0.9));
        store.put_recommendation(recommendation("r4", "tenant-a", Classification::Underpowered, 0.85));

        let all = store.list_recommendations(&RecommendationFilter::for_tenant("tenant-a"));
        let ids: Vec<&str> = all.iter().map(|r| r.recommendation_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r4"]);

        let downsize = store.list_recommendations(&RecommendationFilter {
            action: Some("DOWNSIZE".to_string()),
            ..RecommendationFilter::for_tenant("tenant-a")
        });
        assert_eq!(downsize.len(), 1);
        assert_eq!(downsize[0].recommendation_id, "r1");

        let confident = store.list_recommendations(&RecommendationFilter {
            min_confidence: Some(0.8),
            ..RecommendationFilter::for_tenant("tenant-a")
        });
        assert_eq!(confident.len(), 2);

        let unknown = store.list_recommendations(&RecommendationFilter {
            classification: Some("right_sized".to_string()),
            ..RecommendationFilter::for_tenant("tenant-a")
        });
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_status_transitions() {
        let store = InMemoryStore::new();
        store.put_recommendation(recommendation("r1", "tenant-a", Classification::Overprovisioned, 0.9));
        store.put_recommendation(recommendation("r2", "tenant-a", Classification::RightSized, 0.7));

        let (previous, updated) = store.update_status("r1", RecommendationStatus::Approved).unwrap();
        assert_eq!(previous, RecommendationStatus::Pending);
        assert_eq!(updated.status, RecommendationStatus::Approved);
        assert_eq!(
            store.get_recommendation("r1").unwrap().status,
            RecommendationStatus::Approved
        );

        let again = store.update_status("r1", RecommendationStatus::Overridden);
        assert!(matches!(again, Err(RightsizeError::InvalidTransition { .. })));

        let terminal = store.update_status("r2", RecommendationStatus::Approved);
        assert!(matches!(terminal, Err(RightsizeError::InvalidTransition { .. })));

        let missing = store.update_status("nope", RecommendationStatus::Approved);
        assert!(matches!(missing, Err(RightsizeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_publish() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("r{}", i);
                store
                    .publish(recommendation(&id, "tenant-a", Classification::Underpowered, 0.85))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let all = store.list_recommendations(&RecommendationFilter::for_tenant("tenant-a"));
        assert_eq!(all.len(), 16);
    }

    #[tokio::test]
    async fn test_source_flattens_batches() {
        let store = InMemoryStore::new();
        store.ingest_telemetry(batch("tenant-a", "b-1", &["A"]));
        store.ingest_telemetry(batch("tenant-a", "b-2", &["A", "B"]));
        let samples = store.fetch_telemetry("tenant-a").await.unwrap();
        assert_eq!(samples.len(), 3);
    }
}
