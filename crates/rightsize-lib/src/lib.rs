//! Device rightsizing library
//!
//! This crate provides the core functionality for:
//! - Telemetry ingestion payloads and boundary validation
//! - Signal aggregation, pressure scoring and classification
//! - Recommendation building and lifecycle
//! - In-memory repositories for telemetry, policies and recommendations
//! - Health checks and observability

pub mod engine;
pub mod error;
pub mod health;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod policy;
pub mod scoring;
pub mod store;

pub use engine::{
    EvaluationContext, Evaluator, IdGenerator, RecommendationSink, SequentialIds, TelemetrySource,
    UuidGenerator,
};
pub use error::{Result, RightsizeError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
