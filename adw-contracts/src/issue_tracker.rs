use async_trait::async_trait;

/// The source-control issue tracker the orchestrator posts user-visible
/// diagnostics back to. One trait keeps the webhook ingestor and the
/// dispatcher's fatal-on-spawn path from depending on a concrete SCM client.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Post a comment to `issue_id`. `body` is expected to already carry the
    /// stable bot-identifier prefix used for comment deduplication.
    async fn post_comment(&self, issue_id: &str, body: &str) -> anyhow::Result<()>;

    /// Re-deliver a previously received webhook payload (used by the
    /// `/github-webhook/redeliver` helper).
    async fn redeliver(&self, delivery_id: &str) -> anyhow::Result<()>;
}

/// Stable prefix every diagnostic comment carries, so repeated failures on
/// the same issue can be deduplicated by the tracker or by humans skimming it.
pub const BOT_COMMENT_PREFIX: &str = "<!-- adw-orchestrator:bot -->";
