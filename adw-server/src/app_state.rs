//! Single process-wide application context (§9 re-architecture guidance: no
//! module-level globals, one struct attached to handlers via axum's state
//! extractor).

use std::fmt;
use std::sync::Arc;

use adw_config::Config;
use adw_contracts::classifier::Classifier;
use adw_contracts::issue_tracker::IssueTracker;
use adw_contracts::supervisor::ProcessSupervisor;
use adw_core::admission::AdmissionController;
use adw_core::dispatcher::{Dispatcher, SidecarService};
use adw_core::hub::BroadcastHub;
use adw_core::indexer::Indexer;
use adw_core::store::HistoryStore;

use crate::preview::PreviewStore;
use crate::stats::WebhookStats;

#[derive(Clone)]
pub struct AppState(Arc<AppStateInner>);

pub struct AppStateInner {
    pub config: Config,
    pub admission: AdmissionController,
    pub dispatcher: Dispatcher,
    pub hub: Arc<BroadcastHub>,
    pub history: Arc<HistoryStore>,
    pub indexer: Indexer,
    pub classifier: Arc<dyn Classifier>,
    pub issue_tracker: Arc<dyn IssueTracker>,
    pub supervisor: Arc<dyn ProcessSupervisor>,
    pub webhook_stats: WebhookStats,
    pub previews: PreviewStore,
    pub webhook_sidecar: SidecarService,
    pub tunnel_sidecar: SidecarService,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl fmt::Debug for AppStateInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppStateInner").finish_non_exhaustive()
    }
}

impl std::ops::Deref for AppState {
    type Target = AppStateInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AppState {
    pub fn new(inner: AppStateInner) -> Self {
        Self(Arc::new(inner))
    }
}
