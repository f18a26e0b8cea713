use async_trait::async_trait;

/// Live disk-usage percentage for the partition backing workflow state and
/// worktrees, as read from `statfs`.
#[async_trait]
pub trait DiskUsageProbe: Send + Sync {
    /// Percentage of disk used, in `[0, 100]`.
    async fn used_percent(&self) -> anyhow::Result<f64>;
}

/// Count of currently checked-out worktrees under the configured worktree root.
#[async_trait]
pub trait WorktreeCounter: Send + Sync {
    async fn count(&self) -> anyhow::Result<usize>;
}

/// Whether the upstream LLM provider's quota has headroom for another workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStatus {
    Available,
    Exhausted,
}

#[async_trait]
pub trait QuotaOracle: Send + Sync {
    async fn status(&self) -> anyhow::Result<QuotaStatus>;
}
