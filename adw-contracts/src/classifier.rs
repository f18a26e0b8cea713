use adw_model::{ClassificationType, ModelSet, WorkflowTemplate};
use async_trait::async_trait;

/// Result shape shared by both the fast deterministic extraction path and
/// the slow classifier path, so a caller never needs to know which produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub workflow_template: WorkflowTemplate,
    pub adw_id: Option<adw_model::AdwId>,
    pub model_set: ModelSet,
    pub classification_type: ClassificationType,
}

/// An LLM-backed (or otherwise pluggable) classifier invoked only when the
/// fast deterministic extraction in the ingestor fails to match.
///
/// Implementations are expected to be narrow: text in, `ClassificationOutcome`
/// out. Network and provider-SDK concerns live entirely behind this trait.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify free-form issue/comment text. Returns `Ok(None)` when the
    /// classifier declines to extract a workflow (not an error condition);
    /// returns `Err` only on a hard failure of the classifier itself.
    async fn classify(&self, text: &str) -> anyhow::Result<Option<ClassificationOutcome>>;
}
