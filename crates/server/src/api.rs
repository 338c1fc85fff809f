//! HTTP API: ingestion, policy admin, recommendations, health and metrics

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prometheus::{Encoder, TextEncoder};
use rightsize_lib::{
    engine::{EvaluationContext, Evaluator, IdGenerator, UuidGenerator},
    error::RightsizeError,
    health::{ComponentStatus, HealthRegistry},
    ingest::{CapabilityBatch, IngestionAck, TelemetryBatch},
    models::{Recommendation, RecommendationStatus},
    observability::{ServiceMetrics, StructuredLogger},
    policy::{PolicyCreate, PolicyPatch, PolicyProfile},
    store::{
        InMemoryStore, PolicyRepository, RecommendationFilter, RecommendationRepository,
        TelemetryRepository,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub store: Arc<InMemoryStore>,
    ids: Arc<dyn IdGenerator>,
    evaluator: Evaluator,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self::with_ids(health_registry, metrics, logger, Arc::new(UuidGenerator))
    }

    /// State whose policy and recommendation ids come from `ids`
    pub fn with_ids(
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let evaluator = Evaluator::new(ids.clone(), metrics.clone(), logger.clone());
        Self {
            health_registry,
            metrics,
            logger,
            store: Arc::new(InMemoryStore::new()),
            ids,
            evaluator,
        }
    }
}

/// Library error rendered as `{"detail": <code>}`
pub struct ApiError(RightsizeError);

impl From<RightsizeError> for ApiError {
    fn from(err: RightsizeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RightsizeError::NotFound { .. } => StatusCode::NOT_FOUND,
            RightsizeError::InvalidTransition { .. } => StatusCode::CONFLICT,
            RightsizeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = serde_json::json!({
            "detail": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Extractor failures are validation errors with the usual error body
fn malformed(reason: String) -> RightsizeError {
    RightsizeError::Validation(format!("malformed request: {}", reason))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RightsizeError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| malformed(rejection.body_text()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationList {
    pub items: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub tenant_id: String,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

fn reject(state: &AppState, tenant_id: &str, err: RightsizeError) -> ApiError {
    state.metrics.inc_ingestion_rejections();
    state.logger.log_ingestion_rejected(tenant_id, &err.to_string());
    ApiError(err)
}

/// Tenant is unknown when the payload did not parse
const UNPARSED_TENANT: &str = "unknown";

fn ingestion_payload<T>(
    state: &AppState,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    json_body(payload).map_err(|e| reject(state, UNPARSED_TENANT, e))
}

async fn ingest_telemetry(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TelemetryBatch>, JsonRejection>,
) -> ApiResult<IngestionAck> {
    let batch = ingestion_payload(&state, payload)?;
    if let Err(e) = batch.validate() {
        return Err(reject(&state, &batch.tenant_id, e));
    }

    let key = batch.key();
    let ack = state.store.ingest_telemetry(batch);
    if ack.deduped {
        state.metrics.inc_duplicate_batches();
        state
            .logger
            .log_duplicate_batch(&key.tenant_id, &key.source, &key.batch_id);
    } else {
        state.metrics.add_telemetry_records(ack.accepted_records);
        state.logger.log_telemetry_ingested(
            &key.tenant_id,
            &key.source,
            &key.batch_id,
            ack.accepted_records,
        );
    }
    Ok(Json(ack))
}

async fn ingest_capabilities(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CapabilityBatch>, JsonRejection>,
) -> ApiResult<IngestionAck> {
    let batch = ingestion_payload(&state, payload)?;
    if let Err(e) = batch.validate() {
        return Err(reject(&state, &batch.tenant_id, e));
    }

    let (tenant_id, source) = (batch.tenant_id.clone(), batch.source.clone());
    let ack = state.store.ingest_capabilities(batch);
    state
        .logger
        .log_capabilities_ingested(&tenant_id, &source, ack.accepted_records);
    Ok(Json(ack))
}

async fn create_policy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PolicyCreate>, JsonRejection>,
) -> ApiResult<PolicyProfile> {
    let input = json_body(payload)?;
    let policy = PolicyProfile::create(input, state.ids.next_id(), Utc::now());
    state
        .logger
        .log_policy_created(&policy.policy_id, &policy.tenant_id, &policy.name);
    state.store.put_policy(policy.clone());
    Ok(Json(policy))
}

fn find_policy(state: &AppState, policy_id: &str) -> Result<PolicyProfile, ApiError> {
    state
        .store
        .get_policy(policy_id)
        .ok_or_else(|| RightsizeError::policy_not_found(policy_id).into())
}

async fn get_policy(
    State(state): State<Arc<AppState>>,
    Path(policy_id): Path<String>,
) -> ApiResult<PolicyProfile> {
    find_policy(&state, &policy_id).map(Json)
}

async fn patch_policy(
    State(state): State<Arc<AppState>>,
    Path(policy_id): Path<String>,
    payload: Result<Json<PolicyPatch>, JsonRejection>,
) -> ApiResult<PolicyProfile> {
    let patch = json_body(payload)?;
    let mut policy = find_policy(&state, &policy_id)?;
    policy.apply_patch(patch);
    state.store.put_policy(policy.clone());
    state.logger.log_policy_updated(&policy_id);
    Ok(Json(policy))
}

async fn simulate_policy(
    State(state): State<Arc<AppState>>,
    Path(policy_id): Path<String>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> ApiResult<RecommendationList> {
    let request = json_body(payload)?;
    let policy = find_policy(&state, &policy_id)?;
    let ctx = EvaluationContext::today(request.tenant_id).with_policy(&policy);

    let store = state.store.as_ref();
    let items = state.evaluator.run(&ctx, store, store).await?;
    Ok(Json(RecommendationList { items }))
}

async fn list_recommendations(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecommendationFilter>, QueryRejection>,
) -> ApiResult<RecommendationList> {
    let Query(filter) = query.map_err(|rejection| malformed(rejection.body_text()))?;
    let items = state.store.list_recommendations(&filter);
    Ok(Json(RecommendationList { items }))
}

async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(recommendation_id): Path<String>,
) -> ApiResult<Recommendation> {
    state
        .store
        .get_recommendation(&recommendation_id)
        .map(Json)
        .ok_or_else(|| RightsizeError::recommendation_not_found(recommendation_id).into())
}

fn transition(
    state: &AppState,
    recommendation_id: &str,
    to: RecommendationStatus,
) -> ApiResult<Recommendation> {
    match state.store.update_status(recommendation_id, to) {
        Ok((from, updated)) => {
            state.metrics.inc_status_transitions(to);
            state.logger.log_status_change(recommendation_id, from, to);
            Ok(Json(updated))
        }
        Err(e) => {
            state
                .logger
                .log_status_change_rejected(recommendation_id, to, &e.code());
            Err(e.into())
        }
    }
}

async fn approve_recommendation(
    State(state): State<Arc<AppState>>,
    Path(recommendation_id): Path<String>,
) -> ApiResult<Recommendation> {
    transition(&state, &recommendation_id, RecommendationStatus::Approved)
}

async fn override_recommendation(
    State(state): State<Arc<AppState>>,
    Path(recommendation_id): Path<String>,
) -> ApiResult<Recommendation> {
    transition(&state, &recommendation_id, RecommendationStatus::Overridden)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/ingestion/telemetry-batch", post(ingest_telemetry))
        .route(
            "/api/v1/ingestion/capability-snapshots",
            post(ingest_capabilities),
        )
        .route("/api/v1/admin/policies", post(create_policy))
        .route(
            "/api/v1/admin/policies/:policy_id",
            get(get_policy).patch(patch_policy),
        )
        .route(
            "/api/v1/admin/policies/:policy_id/simulate",
            post(simulate_policy),
        )
        .route("/api/v1/recommendations", get(list_recommendations))
        .route("/api/v1/recommendations/:id", get(get_recommendation))
        .route(
            "/api/v1/recommendations/:id/approve",
            post(approve_recommendation),
        )
        .route(
            "/api/v1/recommendations/:id/override",
            post(override_recommendation),
        )
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
