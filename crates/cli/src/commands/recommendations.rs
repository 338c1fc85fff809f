//! Recommendation-related CLI commands

use anyhow::Result;
use rightsize_lib::{models::Recommendation, store::RecommendationFilter};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_classification, color_confidence, color_status, format_usd, print_json, print_success,
    print_warning, truncate_id, OutputFormat,
};

/// Row for recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Classification")]
    classification: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Fit")]
    fit: String,
    #[tabled(rename = "Overprov")]
    overprovision: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Savings/yr")]
    savings: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(r: &Recommendation) -> Self {
        Self {
            id: truncate_id(&r.recommendation_id),
            device: r.device_key.clone(),
            classification: color_classification(r.classification),
            action: r.action.to_string(),
            fit: format!("{:.2}", r.workload_fit_score),
            overprovision: format!("{:.2}", r.overprovision_score),
            confidence: color_confidence(r.confidence),
            savings: format_usd(r.expected_savings_usd_annual),
            status: color_status(r.status),
        }
    }
}

/// Render a list of recommendations
pub fn print_recommendations(items: &[Recommendation], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(items)?,
        OutputFormat::Table => {
            if items.is_empty() {
                print_warning("No recommendations found");
                return Ok(());
            }

            let rows: Vec<RecommendationRow> = items.iter().map(RecommendationRow::from).collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} recommendations", items.len());
        }
    }
    Ok(())
}

fn print_detail(rec: &Recommendation) {
    println!("Recommendation:   {}", rec.recommendation_id);
    println!("Tenant:           {}", rec.tenant_id);
    println!("Device:           {}", rec.device_key);
    println!("Run date:         {}", rec.run_date);
    println!("Classification:   {}", color_classification(rec.classification));
    println!("Action:           {}", rec.action);
    println!("Confidence:       {}", color_confidence(rec.confidence));
    println!("Workload fit:     {:.2}", rec.workload_fit_score);
    println!("Overprovision:    {:.2}", rec.overprovision_score);
    println!(
        "Savings/yr:       {}",
        format_usd(rec.expected_savings_usd_annual)
    );
    if !rec.risk_flags.is_empty() {
        let flags: Vec<&str> = rec.risk_flags.iter().map(|f| f.as_str()).collect();
        println!("Risk flags:       {}", flags.join(", "));
    }
    println!("Status:           {}", color_status(rec.status));
    println!("Reasons:");
    for reason in &rec.top_reasons {
        println!("  - {}", reason);
    }
}

/// Get recommendations with optional filters
pub async fn get_recommendations(
    client: &ApiClient,
    filter: RecommendationFilter,
    format: OutputFormat,
) -> Result<()> {
    let items = client.list_recommendations(&filter).await?;
    print_recommendations(&items, format)
}

pub async fn get_recommendation(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let rec = client.get_recommendation(id).await?;
    match format {
        OutputFormat::Json => print_json(&rec)?,
        OutputFormat::Table => print_detail(&rec),
    }
    Ok(())
}

/// Approve a pending recommendation
pub async fn approve_recommendation(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let rec = client.approve(id).await?;
    match format {
        OutputFormat::Json => print_json(&rec)?,
        OutputFormat::Table => {
            print_success(&format!("Recommendation {} approved", id));
            println!("Status: {}", color_status(rec.status));
        }
    }
    Ok(())
}

/// Override (reject) a pending recommendation
pub async fn override_recommendation(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let rec = client.override_recommendation(id).await?;
    match format {
        OutputFormat::Json => print_json(&rec)?,
        OutputFormat::Table => {
            print_success(&format!("Recommendation {} overridden", id));
            println!("Status: {}", color_status(rec.status));
        }
    }
    Ok(())
}
