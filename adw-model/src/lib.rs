//! Core data model definitions shared across the ADW orchestrator crates.

pub mod adw_id;
pub mod error;
pub mod preview;
pub mod subscriber;
pub mod workflow;

pub use adw_id::AdwId;
pub use error::{ModelError, Result as ModelResult};
pub use preview::{PendingCostEstimate, PreviewId};
pub use subscriber::Topic;
pub use workflow::{
    ClassificationType, ComplexityLevel, ErrorEntry, ModelSet, PhaseMetric,
    WorkflowRecord, WorkflowStatus, WorkflowTemplate,
};
