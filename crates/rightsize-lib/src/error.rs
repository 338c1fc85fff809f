//! Error type shared by the rightsizing library

use crate::models::RecommendationStatus;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, RightsizeError>;

#[derive(Debug, thiserror::Error)]
pub enum RightsizeError {
    /// A keyed entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A status change that the recommendation lifecycle does not allow
    #[error("recommendation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: RecommendationStatus,
        to: RecommendationStatus,
    },

    /// Payload rejected at the ingestion boundary
    #[error("validation failed: {0}")]
    Validation(String),
}

impl RightsizeError {
    pub fn policy_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "policy",
            id: id.into(),
        }
    }

    pub fn recommendation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "recommendation",
            id: id.into(),
        }
    }

    /// Short machine-readable code, e.g. `policy_not_found`
    pub fn code(&self) -> String {
        match self {
            Self::NotFound { kind, .. } => format!("{}_not_found", kind),
            Self::InvalidTransition { .. } => "invalid_status_transition".to_string(),
            Self::Validation(_) => "validation_failed".to_string(),
        }
    }
}
