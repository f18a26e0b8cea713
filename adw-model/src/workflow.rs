use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adw_id::AdwId;
use crate::error::{ModelError, Result};

/// Fixed enumeration of workflow templates the orchestrator knows how to dispatch.
///
/// New templates require a matching `adw_*` executable; this enum is the contract
/// between the classifier, the admission controller, and the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WorkflowTemplate {
    PlanIso,
    BuildIso,
    LightweightIso,
    TestIso,
    ReviewIso,
    PatchIso,
}

impl WorkflowTemplate {
    /// All templates the orchestrator admits, in a stable order.
    pub const ALL: [WorkflowTemplate; 6] = [
        WorkflowTemplate::PlanIso,
        WorkflowTemplate::BuildIso,
        WorkflowTemplate::LightweightIso,
        WorkflowTemplate::TestIso,
        WorkflowTemplate::ReviewIso,
        WorkflowTemplate::PatchIso,
    ];

    /// The `adw_<name>` slug used both in fast-path extraction and in the
    /// child executable's file name (`adw_plan_iso`, ...).
    pub fn slug(&self) -> &'static str {
        match self {
            WorkflowTemplate::PlanIso => "plan_iso",
            WorkflowTemplate::BuildIso => "build_iso",
            WorkflowTemplate::LightweightIso => "lightweight_iso",
            WorkflowTemplate::TestIso => "test_iso",
            WorkflowTemplate::ReviewIso => "review_iso",
            WorkflowTemplate::PatchIso => "patch_iso",
        }
    }

    /// Parse a slug (case-insensitive, as extracted from free text).
    pub fn from_slug(slug: &str) -> Result<Self> {
        let normalized = slug.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.slug() == normalized)
            .ok_or_else(|| ModelError::UnknownTemplate(slug.to_string()))
    }
}

/// Which upstream LLM configuration the child workflow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModelSet {
    #[default]
    Base,
    Advanced,
}

impl ModelSet {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "base" => Some(ModelSet::Base),
            "advanced" => Some(ModelSet::Advanced),
            _ => None,
        }
    }
}

/// Coarse complexity bucket, derived by the history indexer's complexity classifier
/// and also supplied up front by the ingest classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

/// The kind of work the natural-language input describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClassificationType {
    Feature,
    Bug,
    Chore,
}

/// Lifecycle status of a dispatched workflow.
///
/// Transitions are monotonic: `Queued -> Running -> {Completed, Failed, Stopped}`.
/// `Stopped` is reachable only via the dispatcher's stop operation; the others are
/// driven by the child process writing its state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WorkflowStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl WorkflowStatus {
    /// Whether this status is terminal (no further transitions are legal).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Stopped
        )
    }

    /// Validate a proposed transition per the state machine in the design doc.
    pub fn can_transition_to(self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Queued, Running) => true,
            (Queued, Failed) => true, // fatal-on-spawn
            (Queued, Stopped) => true, // stopped before the child ever ran
            (Running, Completed | Failed | Stopped) => true,
            _ => false,
        }
    }
}

/// One category/message pair describing a failure encountered during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorEntry {
    pub category: String,
    pub message: String,
}

/// Error categories the orchestrator considers routine; anything outside this set
/// trips the "unexpected error category" anomaly (see `adw-core::anomaly`).
pub const COMMON_ERROR_CATEGORIES: &[&str] = &[
    "timeout",
    "rate_limit",
    "tool_error",
    "validation",
    "network",
    "git_conflict",
];

/// Duration and cost spent in one named phase of a workflow run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseMetric {
    pub phase_name: String,
    pub duration_seconds: f64,
    pub cost: f64,
}

/// One dispatched workflow, spanning its identity, classification, execution
/// state, outcome metrics, and the indexer's derived analytics.
///
/// `WorkflowRecord` is jointly owned: the child process is the authoritative
/// writer of the on-disk state file; the history indexer re-derives the
/// analytics fields on every sync and treats them as always-recomputable,
/// never authoritative.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkflowRecord {
    // Identity
    pub adw_id: AdwId,
    pub issue_id: String,
    pub created_at: DateTime<Utc>,

    // Classification
    pub workflow_template: WorkflowTemplate,
    pub model_set: ModelSet,
    pub complexity_level: ComplexityLevel,
    pub classification_type: ClassificationType,

    // Execution
    pub status: WorkflowStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub pid: Option<u32>,

    // Inputs
    pub nl_input: String,
    pub structured_input: Option<HashMap<String, serde_json::Value>>,

    // Outcome metrics
    pub actual_cost_total: f64,
    pub estimated_cost_total: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
    pub retry_count: u32,
    pub total_duration_seconds: f64,
    pub steps_completed: u32,
    pub errors: Vec<ErrorEntry>,
    pub phase_metrics: Vec<PhaseMetric>,

    // Derived analytics — recomputed by the indexer, never authoritative.
    pub nl_input_clarity_score: f64,
    pub cost_efficiency_score: f64,
    pub performance_score: f64,
    pub quality_score: f64,
    pub anomaly_flags: Vec<String>,
    pub optimization_recommendations: Vec<String>,
    pub similar_workflow_ids: Vec<AdwId>,
}

impl WorkflowRecord {
    /// Construct a freshly admitted record in the `queued` state.
    pub fn new_queued(
        adw_id: AdwId,
        issue_id: impl Into<String>,
        workflow_template: WorkflowTemplate,
        model_set: ModelSet,
        classification_type: ClassificationType,
        nl_input: impl Into<String>,
    ) -> Self {
        Self {
            adw_id,
            issue_id: issue_id.into(),
            created_at: Utc::now(),
            workflow_template,
            model_set,
            complexity_level: ComplexityLevel::Medium,
            classification_type,
            status: WorkflowStatus::Queued,
            start_time: None,
            completed_at: None,
            pid: None,
            nl_input: nl_input.into(),
            structured_input: None,
            actual_cost_total: 0.0,
            estimated_cost_total: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            cache_read_tokens: 0,
            cache_creation_tokens: 0,
            retry_count: 0,
            total_duration_seconds: 0.0,
            steps_completed: 0,
            errors: Vec::new(),
            phase_metrics: Vec::new(),
            nl_input_clarity_score: 0.0,
            cost_efficiency_score: 0.0,
            performance_score: 0.0,
            quality_score: 0.0,
            anomaly_flags: Vec::new(),
            optimization_recommendations: Vec::new(),
            similar_workflow_ids: Vec::new(),
        }
    }

    /// Apply a status transition, validating it against the state machine.
    pub fn transition_to(&mut self, next: WorkflowStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        if next == WorkflowStatus::Running && self.start_time.is_none() {
            self.start_time = Some(Utc::now());
        }
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }

    /// `adw_id`/`issue_id` plus the classification fields used as a raw correlation id
    /// for deduplicating webhook bot comments.
    pub fn correlation_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.adw_id.as_hex().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_slug_round_trips() {
        for t in WorkflowTemplate::ALL {
            assert_eq!(WorkflowTemplate::from_slug(t.slug()).unwrap(), t);
            assert_eq!(
                WorkflowTemplate::from_slug(&t.slug().to_ascii_uppercase()).unwrap(),
                t
            );
        }
    }

    #[test]
    fn status_transitions_are_monotonic() {
        use WorkflowStatus::*;
        assert!(Queued.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Queued));
        assert!(!Stopped.can_transition_to(Completed));
    }

    #[test]
    fn record_transition_sets_timestamps() {
        let adw_id = AdwId::generate();
        let mut record = WorkflowRecord::new_queued(
            adw_id,
            "13",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            "implement auth",
        );
        assert!(record.start_time.is_none());
        record.transition_to(WorkflowStatus::Running).unwrap();
        assert!(record.start_time.is_some());
        record.transition_to(WorkflowStatus::Completed).unwrap();
        assert!(record.completed_at.is_some());
        assert!(record.transition_to(WorkflowStatus::Running).is_err());
    }
}
