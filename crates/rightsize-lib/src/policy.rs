//! Policy profiles
//!
//! A policy names the evaluation a tenant runs. Thresholds and auto-execute
//! rules are stored verbatim for downstream consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyProfile {
    pub policy_id: String,
    pub tenant_id: String,
    pub name: String,
    pub strict_mode: bool,
    pub thresholds: Map<String, Value>,
    pub auto_execute_rules: Map<String, Value>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCreate {
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub thresholds: Map<String, Value>,
    #[serde(default)]
    pub auto_execute_rules: Map<String, Value>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_execute_rules: Option<Map<String, Value>>,
}

impl PolicyProfile {
    pub fn create(input: PolicyCreate, policy_id: String, now: DateTime<Utc>) -> Self {
        Self {
            policy_id,
            tenant_id: input.tenant_id,
            name: input.name,
            strict_mode: input.strict_mode,
            thresholds: input.thresholds,
            auto_execute_rules: input.auto_execute_rules,
            effective_from: now,
            effective_to: None,
        }
    }

    pub fn apply_patch(&mut self, patch: PolicyPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(strict_mode) = patch.strict_mode {
            self.strict_mode = strict_mode;
        }
        if let Some(thresholds) = patch.thresholds {
            self.thresholds = thresholds;
        }
        if let Some(rules) = patch.auto_execute_rules {
            self.auto_execute_rules = rules;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> PolicyCreate {
        serde_json::from_value(serde_json::json!({
            "tenant_id": "tenant-a",
            "name": "default",
            "strict_mode": true,
            "thresholds": {"gpu_util_high": 85},
            "auto_execute_rules": {"DOWNSIZE": {"min_confidence": 0.9}}
        }))
        .unwrap()
    }

    #[test]
    fn test_create_sets_effective_window() {
        let now = Utc::now();
        let policy = PolicyProfile::create(create_input(), "pol-1".to_string(), now);
        assert_eq!(policy.policy_id, "pol-1");
        assert_eq!(policy.effective_from, now);
        assert!(policy.effective_to.is_none());
        assert_eq!(policy.thresholds["gpu_util_high"], 85);
    }

    #[test]
    fn test_create_defaults() {
        let input: PolicyCreate =
            serde_json::from_str(r#"{"tenant_id": "t", "name": "n"}"#).unwrap();
        assert!(!input.strict_mode);
        assert!(input.thresholds.is_empty());
        assert!(input.auto_execute_rules.is_empty());
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut policy = PolicyProfile::create(create_input(), "pol-1".to_string(), Utc::now());
        let patch: PolicyPatch = serde_json::from_str(r#"{"name": "renamed"}"#).unwrap();
        policy.apply_patch(patch);

        assert_eq!(policy.name, "renamed");
        assert!(policy.strict_mode);
        assert_eq!(policy.thresholds["gpu_util_high"], 85);
        assert!(policy.auto_execute_rules.contains_key("DOWNSIZE"));
    }
}
