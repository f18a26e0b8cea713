//! Trait surfaces that decouple the orchestration plane from its external
//! collaborators: the LLM classifier, the issue tracker, and the host's
//! resource oracles.

pub mod admission;
pub mod classifier;
pub mod issue_tracker;
pub mod state_store;
pub mod supervisor;

pub use admission::{DiskUsageProbe, QuotaOracle, QuotaStatus, WorktreeCounter};
pub use classifier::{ClassificationOutcome, Classifier};
pub use issue_tracker::IssueTracker;
pub use state_store::StateStore;
pub use supervisor::{ProcessHandle, ProcessSupervisor, SpawnSpec};
