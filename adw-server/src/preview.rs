//! Short-lived Pending Cost Estimate store (§3): created by the NL-ingest
//! preview path, keyed by a request UUID, expiring on confirm/cancel or a
//! bounded TTL.

use adw_model::{PendingCostEstimate, PreviewId};
use dashmap::DashMap;

const PREVIEW_TTL: chrono::Duration = chrono::Duration::minutes(15);

#[derive(Default)]
pub struct PreviewStore {
    previews: DashMap<PreviewId, PendingCostEstimate>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&self, mut estimate: PendingCostEstimate) -> PendingCostEstimate {
        estimate.expires_at = estimate.created_at + PREVIEW_TTL;
        self.previews.insert(estimate.preview_id, estimate.clone());
        estimate
    }

    /// Fetches a held estimate, evicting it if its TTL has lapsed.
    pub fn get(&self, id: PreviewId) -> Option<PendingCostEstimate> {
        let now = chrono::Utc::now();
        let estimate = self.previews.get(&id).map(|e| e.clone())?;
        if estimate.is_expired(now) {
            self.previews.remove(&id);
            return None;
        }
        Some(estimate)
    }

    pub fn remove(&self, id: PreviewId) {
        self.previews.remove(&id);
    }
}
