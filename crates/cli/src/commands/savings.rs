//! Savings summary over a tenant's downsize recommendations

use anyhow::Result;
use colored::Colorize;
use rightsize_lib::{
    models::{Action, Recommendation, RecommendationStatus},
    store::RecommendationFilter,
};
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, format_usd, print_json, OutputFormat};

/// Order in which statuses are reported
const STATUS_ORDER: [RecommendationStatus; 4] = [
    RecommendationStatus::Pending,
    RecommendationStatus::Approved,
    RecommendationStatus::Overridden,
    RecommendationStatus::NoAction,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSavings {
    pub status: RecommendationStatus,
    pub devices: usize,
    pub savings_usd_annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub tenant_id: String,
    pub total_usd_annual: f64,
    pub by_status: Vec<StatusSavings>,
}

/// Row for savings by status table
#[derive(Tabled)]
struct StatusSavingRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Savings/yr")]
    savings: String,
}

/// Sum expected annual savings of DOWNSIZE recommendations, split by status
pub fn summarize(tenant_id: &str, items: &[Recommendation]) -> SavingsSummary {
    let downsizes: Vec<&Recommendation> = items
        .iter()
        .filter(|r| r.action == Action::Downsize)
        .collect();

    let by_status: Vec<StatusSavings> = STATUS_ORDER
        .iter()
        .filter_map(|status| {
            let matching: Vec<&&Recommendation> =
                downsizes.iter().filter(|r| r.status == *status).collect();
            if matching.is_empty() {
                return None;
            }
            Some(StatusSavings {
                status: *status,
                devices: matching.len(),
                savings_usd_annual: matching.iter().map(|r| r.expected_savings_usd_annual).sum(),
            })
        })
        .collect();

    SavingsSummary {
        tenant_id: tenant_id.to_string(),
        total_usd_annual: by_status.iter().map(|s| s.savings_usd_annual).sum(),
        by_status,
    }
}

/// Show savings report
pub async fn show_savings(client: &ApiClient, tenant_id: &str, format: OutputFormat) -> Result<()> {
    let filter = RecommendationFilter {
        action: Some(Action::Downsize.as_str().to_string()),
        ..RecommendationFilter::for_tenant(tenant_id)
    };
    let items = client.list_recommendations(&filter).await?;
    let summary = summarize(tenant_id, &items);

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => {
            println!("{}", "Savings Report".bold());
            println!("{}", "=".repeat(50));
            println!("Tenant:                 {}", summary.tenant_id.cyan());
            println!(
                "{}  {}",
                "Total Savings/yr:".bold(),
                format_usd(summary.total_usd_annual).green().bold()
            );
            println!();

            if !summary.by_status.is_empty() {
                println!("{}", "Savings by Status".bold());
                println!("{}", "-".repeat(50));

                let rows: Vec<StatusSavingRow> = summary
                    .by_status
                    .iter()
                    .map(|s| StatusSavingRow {
                        status: color_status(s.status),
                        devices: s.devices,
                        savings: format_usd(s.savings_usd_annual),
                    })
                    .collect();

                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rightsize_lib::models::Classification;
    use std::collections::BTreeSet;

    fn rec(id: &str, classification: Classification, status: RecommendationStatus) -> Recommendation {
        let action = classification.recommended_action();
        Recommendation {
            recommendation_id: id.to_string(),
            tenant_id: "tenant-a".to_string(),
            device_key: id.to_string(),
            run_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            classification,
            action,
            confidence: 0.85,
            workload_fit_score: 80.0,
            overprovision_score: 70.0,
            expected_savings_usd_annual: if action == Action::Downsize { 1200.0 } else { 0.0 },
            risk_flags: BTreeSet::new(),
            top_reasons: Default::default(),
            status,
        }
    }

    #[test]
    fn test_summarize_splits_by_status() {
        let items = vec![
            rec("a", Classification::Overprovisioned, RecommendationStatus::Pending),
            rec("b", Classification::Overprovisioned, RecommendationStatus::Approved),
            rec("c", Classification::Overprovisioned, RecommendationStatus::Pending),
            rec("d", Classification::Underpowered, RecommendationStatus::Pending),
        ];
        let summary = summarize("tenant-a", &items);

        assert_eq!(summary.total_usd_annual, 3600.0);
        assert_eq!(summary.by_status.len(), 2);
        assert_eq!(summary.by_status[0].status, RecommendationStatus::Pending);
        assert_eq!(summary.by_status[0].devices, 2);
        assert_eq!(summary.by_status[0].savings_usd_annual, 2400.0);
        assert_eq!(summary.by_status[1].status, RecommendationStatus::Approved);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize("tenant-a", &[]);
        assert_eq!(summary.total_usd_annual, 0.0);
        assert!(summary.by_status.is_empty());
    }
}
