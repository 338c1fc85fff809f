//! Rightsizing scoring pipeline
//!
//! samples → [`SignalAggregator`] → [`score`] → [`Classifier`] →
//! [`RecommendationBuilder`]. Every stage is pure and synchronous.

mod builder;
mod classifier;
mod normalize;
mod pressure;
mod signals;

pub use builder::{
    RecommendationBuilder, DEFAULT_CONFIDENCE, DOWNSIZE_SAVINGS_USD_ANNUAL,
    HIGH_CONFIDENCE, RIGHT_SIZED_CONFIDENCE, THERMAL_RISK_EVENTS,
};
pub use classifier::{ClassificationThresholds, Classifier};
pub use normalize::normalize;
pub use pressure::{score, Term, OVERPROVISION_WEIGHTS, STRESS_WEIGHTS};
pub use signals::{
    is_heavy_category, SignalAggregator, HEAVY_APP_CATEGORIES, SAMPLE_INTERVAL_MINUTES,
    VRAM_REFERENCE_MB,
};

use crate::models::{Classification, ScoreVector, SignalVector, TelemetrySample};
use serde::Serialize;

/// Intermediate result for one device, before packaging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceAssessment {
    pub device_key: String,
    pub signals: SignalVector,
    pub scores: ScoreVector,
    pub classification: Classification,
}

/// Aggregation, scoring and classification in one pass
#[derive(Default)]
pub struct Assessor {
    aggregator: SignalAggregator,
    classifier: Classifier,
}

impl Assessor {
    pub fn assess<'a, I>(&self, device_key: &str, samples: I) -> DeviceAssessment
    where
        I: IntoIterator<Item = &'a TelemetrySample>,
    {
        let signals = self.aggregator.aggregate(samples);
        self.assess_signals(device_key, signals)
    }

    /// Score and classify an already aggregated signal vector
    pub fn assess_signals(&self, device_key: &str, signals: SignalVector) -> DeviceAssessment {
        let scores = score(&signals);
        let classification = self.classifier.classify(&scores);
        DeviceAssessment {
            device_key: device_key.to_string(),
            signals,
            scores,
            classification,
        }
    }
}
