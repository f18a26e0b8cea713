use adw_model::{AdwId, WorkflowRecord};
use async_trait::async_trait;

/// Read/write access to the on-disk `adw_state.json` layout described in the
/// design: one directory per workflow under a well-known root.
///
/// The child process is the sole authoritative writer; the dispatcher only
/// writes the *initial* record at admission, and the indexer only reads.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Write the initial state record at admission time.
    async fn write_initial(&self, record: &WorkflowRecord) -> anyhow::Result<()>;

    /// Read one workflow's current state file. Tolerates a partial write by
    /// retrying once before surfacing an error.
    async fn read(&self, adw_id: AdwId) -> anyhow::Result<Option<WorkflowRecord>>;

    /// Enumerate all workflow directories under the state root, skipping
    /// (and logging) entries that fail to parse.
    async fn scan(&self) -> anyhow::Result<Vec<WorkflowRecord>>;
}
