//! Push telemetry or capability payloads from a file

use anyhow::{Context, Result};
use rightsize_lib::ingest::{AckStatus, CapabilityBatch, IngestionAck, TelemetryBatch};
use std::path::Path;

use crate::client::ApiClient;
use crate::output::{print_json, print_success, print_warning, OutputFormat};

fn read_payload(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse and validate a telemetry batch before it leaves the machine
pub fn load_telemetry(path: &Path) -> Result<TelemetryBatch> {
    let batch: TelemetryBatch = serde_json::from_str(&read_payload(path)?)
        .with_context(|| format!("{} is not a telemetry batch", path.display()))?;
    batch.validate()?;
    Ok(batch)
}

pub fn load_capabilities(path: &Path) -> Result<CapabilityBatch> {
    let batch: CapabilityBatch = serde_json::from_str(&read_payload(path)?)
        .with_context(|| format!("{} is not a capability batch", path.display()))?;
    batch.validate()?;
    Ok(batch)
}

fn report(ack: &IngestionAck, what: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(ack)?,
        OutputFormat::Table => match ack.status {
            AckStatus::Accepted => print_success(&format!(
                "Accepted {} {} for tenant {}",
                ack.accepted_records, what, ack.tenant_id
            )),
            AckStatus::Duplicate => {
                print_warning("Batch already ingested; nothing stored")
            }
        },
    }
    Ok(())
}

pub async fn ingest(client: &ApiClient, path: &Path, capabilities: bool, format: OutputFormat) -> Result<()> {
    if capabilities {
        let batch = load_capabilities(path)?;
        let ack = client.ingest_capabilities(&batch).await?;
        report(&ack, "snapshots", format)
    } else {
        let batch = load_telemetry(path)?;
        let ack = client.ingest_telemetry(&batch).await?;
        report(&ack, "records", format)
    }
}
