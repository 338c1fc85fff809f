//! Policy administration and simulation commands

use anyhow::{Context, Result};
use colored::Colorize;
use rightsize_lib::policy::{PolicyCreate, PolicyPatch, PolicyProfile};
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::commands::recommendations::print_recommendations;
use crate::output::{print_info, print_json, print_success, OutputFormat};

/// Parse a `--thresholds` / `--rules` argument into a JSON object
pub fn parse_object(flag: &str, raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("{} must be valid JSON", flag))?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => anyhow::bail!("{} must be a JSON object", flag),
    }
}

fn print_policy(policy: &PolicyProfile) {
    println!("{}", "Policy".bold());
    println!("{}", "=".repeat(50));
    println!("ID:               {}", policy.policy_id.cyan());
    println!("Tenant:           {}", policy.tenant_id);
    println!("Name:             {}", policy.name);
    println!("Strict mode:      {}", policy.strict_mode);
    println!(
        "Effective from:   {}",
        policy.effective_from.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(to) = policy.effective_to {
        println!("Effective to:     {}", to.format("%Y-%m-%d %H:%M:%S"));
    }
    if !policy.thresholds.is_empty() {
        println!("Thresholds:       {}", Value::Object(policy.thresholds.clone()));
    }
    if !policy.auto_execute_rules.is_empty() {
        println!(
            "Auto-execute:     {}",
            Value::Object(policy.auto_execute_rules.clone())
        );
    }
}

fn render(policy: &PolicyProfile, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(policy),
        OutputFormat::Table => {
            print_policy(policy);
            Ok(())
        }
    }
}

pub async fn create_policy(client: &ApiClient, input: PolicyCreate, format: OutputFormat) -> Result<()> {
    let policy = client.create_policy(&input).await?;
    if let OutputFormat::Table = format {
        print_success(&format!("Policy {} created", policy.policy_id));
    }
    render(&policy, format)
}

pub async fn show_policy(client: &ApiClient, policy_id: &str, format: OutputFormat) -> Result<()> {
    let policy = client.get_policy(policy_id).await?;
    render(&policy, format)
}

pub async fn update_policy(
    client: &ApiClient,
    policy_id: &str,
    patch: PolicyPatch,
    format: OutputFormat,
) -> Result<()> {
    let policy = client.update_policy(policy_id, &patch).await?;
    if let OutputFormat::Table = format {
        print_success(&format!("Policy {} updated", policy.policy_id));
    }
    render(&policy, format)
}

/// Evaluate a tenant's telemetry under a policy
pub async fn simulate(
    client: &ApiClient,
    policy_id: &str,
    tenant_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let items = client.simulate(policy_id, tenant_id).await?;
    if let OutputFormat::Table = format {
        print_info(&format!(
            "Simulated policy {} for tenant {}",
            policy_id, tenant_id
        ));
    }
    print_recommendations(&items, format)
}
