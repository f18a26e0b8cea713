//! Posts diagnostic comments back to the originating issue via the GitHub
//! REST API. Re-delivery is left to the tracker's own webhook redelivery
//! endpoint, invoked through the same client.

use adw_contracts::issue_tracker::IssueTracker;
use async_trait::async_trait;
use reqwest::Client;

pub struct GithubIssueTracker {
    client: Client,
    repo: String,
    token: String,
}

impl GithubIssueTracker {
    pub fn new(client: Client, repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            repo: repo.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl IssueTracker for GithubIssueTracker {
    async fn post_comment(&self, issue_id: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/issues/{}/comments",
            self.repo, issue_id
        );
        self.client
            .post(url)
            .bearer_auth(&self.token)
            .header("User-Agent", "adw-orchestrator")
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn redeliver(&self, delivery_id: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.github.com/repos/{}/hooks/deliveries/{}/attempts",
            self.repo, delivery_id
        );
        self.client
            .post(url)
            .bearer_auth(&self.token)
            .header("User-Agent", "adw-orchestrator")
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
