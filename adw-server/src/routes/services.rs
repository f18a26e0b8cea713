//! Sidecar lifecycle endpoints (§4, §6): the webhook listener and tunnel
//! process are managed the same way as workflow children, just long-lived
//! and named rather than per-`AdwId`.

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::Value;

use adw_contracts::supervisor::SpawnSpec;
use adw_core::dispatcher::SidecarService;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

fn sidecar<'a>(state: &'a AppState, name: &str) -> AppResult<&'a SidecarService> {
    match name {
        "webhook" => Ok(&state.webhook_sidecar),
        "tunnel" => Ok(&state.tunnel_sidecar),
        other => Err(AppError::not_found(format!("unknown service \"{other}\""))),
    }
}

fn spawn_spec(state: &AppState, name: &str) -> SpawnSpec {
    let log_path = state.config.state_root.join(format!("{name}.log"));
    SpawnSpec {
        program: state.config.state_root.join(format!("bin/{name}_listener")),
        args: Vec::new(),
        log_path,
        working_dir: None,
    }
}

/// `POST /services/{name}/start`
pub async fn start(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Json<Value>> {
    let service = sidecar(&state, &name)?;
    service
        .start(state.supervisor.as_ref(), spawn_spec(&state, &name))
        .await
        .map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "service": name, "running": service.is_running() })))
}

/// `POST /services/{name}/stop`
pub async fn stop(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Json<Value>> {
    let service = sidecar(&state, &name)?;
    service.stop().await.map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "service": name, "running": service.is_running() })))
}

/// `POST /services/{name}/restart`
pub async fn restart(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Json<Value>> {
    let service = sidecar(&state, &name)?;
    service
        .restart(state.supervisor.as_ref(), spawn_spec(&state, &name))
        .await
        .map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "service": name, "running": service.is_running() })))
}

/// `GET /services` — current run state of both sidecars.
pub async fn list(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "webhook": { "running": state.webhook_sidecar.is_running() },
        "tunnel": { "running": state.tunnel_sidecar.is_running() },
    }))
}
