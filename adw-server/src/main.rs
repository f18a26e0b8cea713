//! # ADW Orchestrator
//!
//! Ingests GitHub webhooks, admits and dispatches agentic workflow
//! executions, fans out their live state over WebSocket, and indexes
//! completed runs into a queryable history (see module docs in `adw-core`).

mod adapters;
mod app_state;
mod cost_estimate;
mod error;
mod preview;
mod routes;
mod stats;
mod ws;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use adw_core::admission::AdmissionController;
use adw_core::dispatcher::{Dispatcher, ExecutableResolver, SidecarService};
use adw_core::hub::BroadcastHub;
use adw_core::indexer::Indexer;
use adw_core::store::HistoryStore;

use crate::adapters::admission_probes::{AlwaysAvailableQuota, DirWorktreeCounter, StatvfsDiskProbe};
use crate::adapters::classifier::NoopClassifier;
use crate::adapters::issue_tracker::GithubIssueTracker;
use crate::adapters::state_store::FsStateStore;
use crate::adapters::supervisor::TokioProcessSupervisor;
use crate::app_state::{AppState, AppStateInner};
use crate::preview::PreviewStore;
use crate::stats::WebhookStats;

const REAP_INTERVAL: Duration = Duration::from_secs(5);
const SYNC_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adw_orchestrator=debug,adw_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = adw_config::load().context("loading configuration")?;
    adw_config::ensure_directories(&config).context("creating state/worktree directories")?;
    tracing::info!(http_addr = %config.http_addr, "configuration loaded");

    let state_store: Arc<dyn adw_contracts::state_store::StateStore> =
        Arc::new(FsStateStore::new(config.state_root.join("adw_state")));
    let supervisor: Arc<dyn adw_contracts::supervisor::ProcessSupervisor> =
        Arc::new(TokioProcessSupervisor);

    let admission = AdmissionController::new(
        Arc::new(AlwaysAvailableQuota),
        Arc::new(StatvfsDiskProbe {
            path: config.state_root.clone(),
        }),
        Arc::new(DirWorktreeCounter {
            root: config.worktree_root.clone(),
        }),
        config.max_worktrees,
        config.disk_usage_threshold_percent,
    );

    let dispatcher = Dispatcher::new(
        supervisor.clone(),
        state_store.clone(),
        ExecutableResolver {
            bin_dir: config.state_root.join("bin"),
        },
        config.state_root.join("logs"),
    );

    let hub = Arc::new(BroadcastHub::new());
    let history = Arc::new(
        HistoryStore::connect(&config.db_url())
            .await
            .context("connecting to history store")?,
    );
    let indexer = Indexer::new(state_store.clone(), history.clone(), Some(hub.clone()));

    let http_client = reqwest::Client::builder()
        .user_agent("adw-orchestrator")
        .build()
        .context("building HTTP client")?;
    let issue_tracker: Arc<dyn adw_contracts::issue_tracker::IssueTracker> =
        Arc::new(GithubIssueTracker::new(
            http_client,
            std::env::var("ADW_GITHUB_REPO").unwrap_or_default(),
            config.tunnel_token.clone().unwrap_or_default(),
        ));
    let classifier: Arc<dyn adw_contracts::classifier::Classifier> = Arc::new(NoopClassifier);

    let state = AppState::new(AppStateInner {
        config,
        admission,
        dispatcher,
        hub,
        history,
        indexer,
        classifier,
        issue_tracker,
        supervisor,
        webhook_stats: WebhookStats::new(),
        previews: PreviewStore::new(),
        webhook_sidecar: SidecarService::new("webhook"),
        tunnel_sidecar: SidecarService::new("tunnel"),
        started_at: chrono::Utc::now(),
    });

    spawn_reap_loop(state.clone());
    spawn_sync_loop(state.clone());

    let http_addr = state.config.http_addr;
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("binding {http_addr}"))?;
    tracing::info!(%http_addr, "adw-orchestrator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("adw-orchestrator shut down gracefully");
    Ok(())
}

fn spawn_reap_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_INTERVAL);
        loop {
            interval.tick().await;
            state.dispatcher.reap().await;
        }
    });
}

fn spawn_sync_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SYNC_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(err) = state.indexer.sync().await {
                tracing::warn!(%err, "history sync failed");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
