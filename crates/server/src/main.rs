//! Rightsizing server
//!
//! Accepts device telemetry, evaluates it into rightsizing recommendations and
//! serves the recommendation lifecycle over HTTP.

use anyhow::{Context, Result};
use rightsize_lib::{
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
};
use rightsize_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(service = %config.service_name, addr = %config.listen_addr(), "Server configured");

    let health_registry = HealthRegistry::new();
    for name in components::ALL {
        health_registry.register(name).await;
    }

    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.service_name);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVICE_VERSION, config.api_port);

    let api_handle = tokio::spawn(api::serve(config.listen_addr(), app_state));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
        served = api_handle => {
            health_registry.set_ready(false).await;
            match served {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("API server task panicked"),
            }
        }
    }

    Ok(())
}
