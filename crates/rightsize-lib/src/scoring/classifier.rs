//! Threshold classification of composite scores

use crate::models::{Classification, ScoreVector};

/// Decision thresholds applied by [`Classifier`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    /// Fit strictly below this marks a device underpowered
    pub underpowered_fit_below: f64,
    /// Any single pressure strictly above this marks a device underpowered
    pub critical_pressure_above: f64,
    /// Fit must be strictly above this to consider downsizing
    pub overprovisioned_fit_above: f64,
    /// Overprovision score must be strictly above this to consider downsizing
    pub overprovisioned_score_above: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            underpowered_fit_below: 45.0,
            critical_pressure_above: 0.90,
            overprovisioned_fit_above: 75.0,
            overprovisioned_score_above: 65.0,
        }
    }
}

/// Ordered first-match rules over a [`ScoreVector`]
///
/// The underpowered rule is always checked before the overprovisioned rule.
/// The two fit conditions are disjoint under the default thresholds, but a
/// single saturated resource can still coexist with high fit and overprovision
/// scores, and tuned fit thresholds may overlap. Upsize wins in both cases.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: ClassificationThresholds,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ClassificationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, scores: &ScoreVector) -> Classification {
        let t = &self.thresholds;

        // Rule 1 must stay ahead of rule 2
        if scores.fit < t.underpowered_fit_below || scores.critical() > t.critical_pressure_above {
            return Classification::Underpowered;
        }
        if scores.fit > t.overprovisioned_fit_above && scores.overprov > t.overprovisioned_score_above
        {
            return Classification::Overprovisioned;
        }
        Classification::RightSized
    }
}
