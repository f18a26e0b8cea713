use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::workflow::{ClassificationType, ComplexityLevel, ModelSet, WorkflowTemplate};

/// Identifier for a held `POST /request` preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PreviewId(pub Uuid);

impl PreviewId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Short-lived record created by the NL-ingest path when a cost preview is
/// requested. Expires on confirm/cancel or after `ttl`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingCostEstimate {
    pub preview_id: PreviewId,
    pub nl_input: String,
    pub workflow_template: WorkflowTemplate,
    pub model_set: ModelSet,
    pub complexity_level: ComplexityLevel,
    pub classification_type: ClassificationType,
    pub estimated_cost_total: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingCostEstimate {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
