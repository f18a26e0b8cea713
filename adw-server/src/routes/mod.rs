pub mod preview;
pub mod services;
pub mod webhook;
pub mod workflows;

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;
use crate::ws;

/// Assemble the full HTTP surface (§6).
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(create_webhook_routes())
        .merge(create_workflow_routes())
        .merge(create_preview_routes())
        .merge(create_service_routes())
        .route("/ws/{*topic}", get(ws::upgrade))
        .with_state(state)
}

fn create_webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::handle_webhook))
        .route("/github-webhook/redeliver", post(webhook::redeliver))
        .route("/webhook-status", get(webhook::webhook_status))
}

fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(workflows::list_live))
        .route("/workflows/batch", post(workflows::batch))
        .route("/workflow-history", get(workflows::history))
        .route("/health", get(workflows::health))
}

fn create_preview_routes() -> Router<AppState> {
    Router::new()
        .route("/request", post(preview::request_preview))
        .route("/preview/{id}/cost", get(preview::preview_cost))
}

fn create_service_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(services::list))
        .route("/services/{name}/start", post(services::start))
        .route("/services/{name}/stop", post(services::stop))
        .route("/services/{name}/restart", post(services::restart))
}
