//! Integration tests for the rightsizing API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rightsize_lib::{
    engine::SequentialIds,
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
};
use rightsize_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    for name in components::ALL {
        health_registry.register(name).await;
    }

    let state = Arc::new(AppState::with_ids(
        health_registry,
        ServiceMetrics::new(),
        StructuredLogger::new("api-test"),
        Arc::new(SequentialIds::new("id")),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn record(device: &str, load: f64, throttle: bool) -> Value {
    json!({
        "device_key": device,
        "gpu": {"util_pct": load, "vram_used_mb": 8192.0 * load / 100.0, "active_minutes": 5},
        "cpu": {"util_pct": load},
        "ram": {"used_pct": load, "paging_pressure": 0},
        "thermal": {"throttle_event": throttle}
    })
}

/// Five intervals of a saturated, throttling workstation and an idle laptop
fn telemetry_batch(batch_id: &str) -> Value {
    let mut records = Vec::new();
    for _ in 0..5 {
        records.push(record("WS-HOT", 99.0, true));
        records.push(record("LT-IDLE", 5.0, false));
    }
    json!({
        "tenant_id": "tenant-a",
        "source": "windows_collector",
        "batch_id": batch_id,
        "sent_at": "2026-02-20T02:10:00Z",
        "records": records
    })
}

/// Ingest the fleet, create a policy and simulate; returns the recommendations
async fn seed_recommendations(app: &Router) -> Vec<Value> {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/ingestion/telemetry-batch",
        Some(telemetry_batch("batch-1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, policy) = send(
        app,
        "POST",
        "/api/v1/admin/policies",
        Some(json!({"tenant_id": "tenant-a", "name": "default"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let policy_id = policy["policy_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/admin/policies/{}/simulate", policy_id),
        Some(json!({"tenant_id": "tenant-a"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["items"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, health) = send(&app, "GET", "/healthz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["ingestion"].is_object());
    assert!(health["components"]["scoring_engine"].is_object());
    assert!(health["components"]["store"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::STORE, "Near capacity")
        .await;

    let (status, health) = send(&app, "GET", "/healthz", None).await;

    // Degraded still returns 200 (operational)
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::INGESTION, "Payloads failing")
        .await;

    let (status, health) = send(&app, "GET", "/healthz", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_ready_flag() {
    let (app, state) = setup_test_app().await;

    let (status, readiness) = send(&app, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = send(&app, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_evaluation_latency(0.001);
    state.metrics.add_telemetry_records(2);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("rightsize_evaluation_latency_seconds_bucket"));
    assert!(metrics_text.contains("rightsize_telemetry_records_ingested_total"));
    assert!(metrics_text.contains("rightsize_duplicate_batches_total"));
}

#[tokio::test]
async fn test_duplicate_batch_is_acknowledged_but_not_stored() {
    let (app, state) = setup_test_app().await;

    let (status, first) = send(
        &app,
        "POST",
        "/api/v1/ingestion/telemetry-batch",
        Some(telemetry_batch("batch-1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "accepted");
    assert_eq!(first["accepted_records"], 10);
    assert_eq!(first["deduped"], false);

    let (status, second) = send(
        &app,
        "POST",
        "/api/v1/ingestion/telemetry-batch",
        Some(telemetry_batch("batch-1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "duplicate");
    assert_eq!(second["accepted_records"], 0);
    assert_eq!(second["deduped"], true);

    assert_eq!(state.store.telemetry_for("tenant-a").len(), 10);
}

#[tokio::test]
async fn test_out_of_range_telemetry_is_rejected() {
    let (app, state) = setup_test_app().await;

    let mut batch = telemetry_batch("batch-bad");
    batch["records"][0]["cpu"]["util_pct"] = json!(140);

    let (status, body) = send(&app, "POST", "/api/v1/ingestion/telemetry-batch", Some(batch)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "validation_failed");
    assert!(state.store.telemetry_for("tenant-a").is_empty());
}

#[tokio::test]
async fn test_malformed_telemetry_gets_error_body_and_is_counted() {
    let (app, state) = setup_test_app().await;
    let before = state.metrics.ingestion_rejections();

    let mut batch = telemetry_batch("batch-malformed");
    batch["records"][0]["ram"]["paging_pressure"] = json!(-1);

    let (status, body) = send(&app, "POST", "/api/v1/ingestion/telemetry-batch", Some(batch)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "validation_failed");
    assert!(state.metrics.ingestion_rejections() > before);
    assert!(state.store.telemetry_for("tenant-a").is_empty());

    let mut missing_sent_at = telemetry_batch("batch-no-time");
    missing_sent_at.as_object_mut().unwrap().remove("sent_at");
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/ingestion/telemetry-batch",
        Some(missing_sent_at),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "validation_failed");
}

#[tokio::test]
async fn test_list_without_tenant_gets_error_body() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/recommendations", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "validation_failed");
    assert!(body["message"].as_str().unwrap().contains("tenant_id"));
}

#[tokio::test]
async fn test_capability_snapshots_are_accepted() {
    let (app, state) = setup_test_app().await;

    let payload = json!({
        "tenant_id": "tenant-a",
        "source": "intune",
        "snapshots": [{
            "device_key": "WS-HOT",
            "captured_at": "2026-02-20T02:00:00Z",
            "cpu": {"model": "i9-13900", "cores": 24},
            "ram_gb": 32,
            "storage": {"type": "NVMe", "total_gb": 1024},
            "gpu": {"vendor": "NVIDIA", "model": "RTX A2000", "vram_gb": 8, "driver": "551.23"}
        }]
    });

    let (status, ack) = send(&app, "POST", "/api/v1/ingestion/capability-snapshots", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "accepted");
    assert_eq!(ack["accepted_records"], 1);
    assert_eq!(state.store.capabilities_for("tenant-a").len(), 1);
}

#[tokio::test]
async fn test_policy_create_get_patch() {
    let (app, _state) = setup_test_app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/admin/policies",
        Some(json!({
            "tenant_id": "tenant-a",
            "name": "default",
            "thresholds": {"gpu_util_high": 85}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["policy_id"], "id-1");
    assert!(created["effective_to"].is_null());

    let (status, fetched) = send(&app, "GET", "/api/v1/admin/policies/id-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, patched) = send(
        &app,
        "PATCH",
        "/api/v1/admin/policies/id-1",
        Some(json!({"strict_mode": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["strict_mode"], true);
    assert_eq!(patched["name"], "default");
    assert_eq!(patched["thresholds"]["gpu_util_high"], 85);
}

#[tokio::test]
async fn test_unknown_policy_is_404() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/admin/policies/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "policy_not_found");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/policies/missing/simulate",
        Some(json!({"tenant_id": "tenant-a"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_produces_one_recommendation_per_device() {
    let (app, _state) = setup_test_app().await;

    let items = seed_recommendations(&app).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["device_key"], "WS-HOT");
    assert_eq!(items[0]["classification"], "UNDERPOWERED");
    assert_eq!(items[0]["action"], "UPSIZE");
    assert_eq!(items[0]["risk_flags"], json!(["THERMAL"]));
    assert_eq!(items[0]["status"], "PENDING");

    assert_eq!(items[1]["device_key"], "LT-IDLE");
    assert_eq!(items[1]["classification"], "OVERPROVISIONED");
    assert_eq!(items[1]["action"], "DOWNSIZE");
    assert_eq!(items[1]["expected_savings_usd_annual"], 1200.0);
    assert_eq!(items[1]["top_reasons"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_and_filter_recommendations() {
    let (app, _state) = setup_test_app().await;
    seed_recommendations(&app).await;

    let (status, all) = send(&app, "GET", "/api/v1/recommendations?tenant_id=tenant-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["items"].as_array().unwrap().len(), 2);

    let (_, downsize) = send(
        &app,
        "GET",
        "/api/v1/recommendations?tenant_id=tenant-a&action=DOWNSIZE",
        None,
    )
    .await;
    let items = downsize["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["device_key"], "LT-IDLE");

    let (_, other_tenant) = send(&app, "GET", "/api/v1/recommendations?tenant_id=tenant-b", None).await;
    assert!(other_tenant["items"].as_array().unwrap().is_empty());

    let (_, none) = send(
        &app,
        "GET",
        "/api/v1/recommendations?tenant_id=tenant-a&min_confidence=0.99",
        None,
    )
    .await;
    assert!(none["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_then_override_conflicts() {
    let (app, _state) = setup_test_app().await;
    let items = seed_recommendations(&app).await;
    let id = items[1]["recommendation_id"].as_str().unwrap().to_string();

    let (status, approved) = send(
        &app,
        "POST",
        &format!("/api/v1/recommendations/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");

    let (status, fetched) = send(&app, "GET", &format!("/api/v1/recommendations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "APPROVED");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/recommendations/{}/override", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "invalid_status_transition");
}

#[tokio::test]
async fn test_override_pending_recommendation() {
    let (app, _state) = setup_test_app().await;
    let items = seed_recommendations(&app).await;
    let id = items[0]["recommendation_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/recommendations/{}/override", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OVERRIDDEN");
}

#[tokio::test]
async fn test_unknown_recommendation_is_404() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/recommendations/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "recommendation_not_found");

    let (status, _) = send(&app, "POST", "/api/v1/recommendations/nope/approve", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
