//! Live and historical workflow query endpoints (§6).

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use adw_core::store::HistoryQuery;
use adw_model::{AdwId, WorkflowStatus};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

const MAX_BATCH_IDS: usize = 20;
const DEFAULT_LIMIT: i64 = 50;

/// `GET /workflows` — live workflows, combining the in-memory process
/// registry with their on-disk state.
pub async fn list_live(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let tracked = state.dispatcher.registry().tracked_ids();
    let mut live = Vec::with_capacity(tracked.len());
    for adw_id in tracked {
        if let Some(record) = state.history.get(adw_id).await? {
            live.push(record);
        }
    }
    Ok(Json(serde_json::json!({ "workflows": live })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// `GET /workflow-history?limit&offset&status&search` (§6).
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<Value>> {
    let status = params
        .status
        .as_deref()
        .map(parse_status)
        .transpose()
        .map_err(AppError::bad_request)?;

    let query = HistoryQuery {
        status,
        search: params.search,
        limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200),
        offset: params.offset.unwrap_or(0).max(0),
    };

    let records = state.history.query(&query).await?;
    Ok(Json(serde_json::json!({ "workflows": records })))
}

fn parse_status(raw: &str) -> Result<WorkflowStatus, String> {
    match raw {
        "queued" => Ok(WorkflowStatus::Queued),
        "running" => Ok(WorkflowStatus::Running),
        "completed" => Ok(WorkflowStatus::Completed),
        "failed" => Ok(WorkflowStatus::Failed),
        "stopped" => Ok(WorkflowStatus::Stopped),
        other => Err(format!("unknown status \"{other}\"")),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub adw_ids: Vec<String>,
}

/// `POST /workflows/batch` — up to 20 IDs.
pub async fn batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> AppResult<Json<Value>> {
    if request.adw_ids.len() > MAX_BATCH_IDS {
        return Err(AppError::bad_request(format!(
            "at most {MAX_BATCH_IDS} ids per batch request"
        )));
    }

    let ids: Vec<AdwId> = request
        .adw_ids
        .iter()
        .filter_map(|raw| AdwId::parse(raw))
        .collect();

    let records = state.history.get_batch(&ids).await?;
    Ok(Json(serde_json::json!({ "workflows": records })))
}

/// `GET /health` (§6, §5): each sub-check bounded to 5 seconds.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    const HEALTH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    let db_ok = tokio::time::timeout(HEALTH_TIMEOUT, state.history.analytics())
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

    let admission_ok = tokio::time::timeout(HEALTH_TIMEOUT, state.admission.check(None))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

    let healthy = db_ok && admission_ok;
    Json(serde_json::json!({
        "healthy": healthy,
        "checks": {
            "history_store": db_ok,
            "admission_signals": admission_ok,
        }
    }))
}

