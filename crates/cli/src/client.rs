//! API client for communicating with the rightsizing service

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use rightsize_lib::{
    ingest::{CapabilityBatch, IngestionAck, TelemetryBatch},
    models::Recommendation,
    policy::{PolicyCreate, PolicyPatch, PolicyProfile},
    store::RecommendationFilter,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the rightsizing service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("Invalid path")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, detail);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.get(url)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.post(url).json(body)).await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.post(url)).await
    }

    /// Make a PATCH request with JSON body
    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.patch(url).json(body)).await
    }

    pub async fn list_recommendations(&self, filter: &RecommendationFilter) -> Result<Vec<Recommendation>> {
        let mut url = self.url("api/v1/recommendations")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("tenant_id", &filter.tenant_id);
            if let Some(action) = &filter.action {
                query.append_pair("action", action);
            }
            if let Some(classification) = &filter.classification {
                query.append_pair("classification", classification);
            }
            if let Some(min) = filter.min_confidence {
                query.append_pair("min_confidence", &min.to_string());
            }
        }
        let list: RecommendationList = self.send(self.client.get(url)).await?;
        Ok(list.items)
    }

    pub async fn get_recommendation(&self, id: &str) -> Result<Recommendation> {
        self.get(&format!("api/v1/recommendations/{}", id)).await
    }

    pub async fn approve(&self, id: &str) -> Result<Recommendation> {
        self.post_empty(&format!("api/v1/recommendations/{}/approve", id))
            .await
    }

    pub async fn override_recommendation(&self, id: &str) -> Result<Recommendation> {
        self.post_empty(&format!("api/v1/recommendations/{}/override", id))
            .await
    }

    pub async fn simulate(&self, policy_id: &str, tenant_id: &str) -> Result<Vec<Recommendation>> {
        let request = SimulateRequest {
            tenant_id: tenant_id.to_string(),
        };
        let list: RecommendationList = self
            .post(
                &format!("api/v1/admin/policies/{}/simulate", policy_id),
                &request,
            )
            .await?;
        Ok(list.items)
    }

    pub async fn ingest_telemetry(&self, batch: &TelemetryBatch) -> Result<IngestionAck> {
        self.post("api/v1/ingestion/telemetry-batch", batch).await
    }

    pub async fn ingest_capabilities(&self, batch: &CapabilityBatch) -> Result<IngestionAck> {
        self.post("api/v1/ingestion/capability-snapshots", batch)
            .await
    }

    pub async fn create_policy(&self, policy: &PolicyCreate) -> Result<PolicyProfile> {
        self.post("api/v1/admin/policies", policy).await
    }

    pub async fn get_policy(&self, policy_id: &str) -> Result<PolicyProfile> {
        self.get(&format!("api/v1/admin/policies/{}", policy_id))
            .await
    }

    pub async fn update_policy(&self, policy_id: &str, patch: &PolicyPatch) -> Result<PolicyProfile> {
        self.patch(&format!("api/v1/admin/policies/{}", policy_id), patch)
            .await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationList {
    pub items: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
