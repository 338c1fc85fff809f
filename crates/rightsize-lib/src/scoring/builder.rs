//! Recommendation packaging
//!
//! Turns a scored and classified device into a [`Recommendation`] with
//! confidence, savings estimate, risk flags, explanation and initial status.

use super::DeviceAssessment;
use crate::models::{Action, Classification, Recommendation, RecommendationStatus, RiskFlag};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Placeholder annual saving for a downsized device
pub const DOWNSIZE_SAVINGS_USD_ANNUAL: f64 = 1200.0;

/// Throttle events above this count raise the thermal risk flag
pub const THERMAL_RISK_EVENTS: u32 = 3;

pub const HIGH_CONFIDENCE: f64 = 0.90;
pub const DEFAULT_CONFIDENCE: f64 = 0.85;
pub const RIGHT_SIZED_CONFIDENCE: f64 = 0.70;

/// Overprovision score above which a downsize is reported with high confidence
const HIGH_CONFIDENCE_OVERPROVISION: f64 = 80.0;

/// Builds recommendation records from device assessments
#[derive(Debug, Clone, Default)]
pub struct RecommendationBuilder;

impl RecommendationBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        tenant_id: &str,
        run_date: NaiveDate,
        assessment: &DeviceAssessment,
        recommendation_id: String,
    ) -> Recommendation {
        let classification = assessment.classification;
        let action = classification.recommended_action();
        let scores = &assessment.scores;

        Recommendation {
            recommendation_id,
            tenant_id: tenant_id.to_string(),
            device_key: assessment.device_key.clone(),
            run_date,
            classification,
            action,
            confidence: confidence(classification, action, scores.overprov),
            workload_fit_score: round2(scores.fit),
            overprovision_score: round2(scores.overprov),
            expected_savings_usd_annual: expected_savings(action),
            risk_flags: risk_flags(assessment),
            top_reasons: [
                format!("GPU pressure={:.2}", scores.gpu_pressure),
                format!("RAM pressure={:.2}", scores.ram_pressure),
                format!("Disk score={:.2}", scores.disk_score),
            ],
            status: initial_status(action),
        }
    }
}

fn expected_savings(action: Action) -> f64 {
    match action {
        Action::Downsize => DOWNSIZE_SAVINGS_USD_ANNUAL,
        Action::Upsize | Action::ExtendLife => 0.0,
    }
}

fn risk_flags(assessment: &DeviceAssessment) -> BTreeSet<RiskFlag> {
    let mut flags = BTreeSet::new();
    if assessment.signals.thermal_throttle_events > THERMAL_RISK_EVENTS {
        flags.insert(RiskFlag::Thermal);
    }
    flags
}

fn confidence(classification: Classification, action: Action, overprov: f64) -> f64 {
    if action == Action::Downsize && overprov > HIGH_CONFIDENCE_OVERPROVISION {
        HIGH_CONFIDENCE
    } else if classification == Classification::RightSized {
        RIGHT_SIZED_CONFIDENCE
    } else {
        DEFAULT_CONFIDENCE
    }
}

/// Extend-life recommendations need no decision
fn initial_status(action: Action) -> RecommendationStatus {
    match action {
        Action::ExtendLife => RecommendationStatus::NoAction,
        Action::Upsize | Action::Downsize => RecommendationStatus::Pending,
    }
}

/// Round to two fractional digits
///
/// Scales the binary value by 100 and rounds that, so inputs such as 2.675
/// (stored just below the decimal) come out as 2.67.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
