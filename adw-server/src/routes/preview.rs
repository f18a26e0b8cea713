//! NL-ingest cost preview endpoints (§3, §6).

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use adw_model::{ClassificationType, ComplexityLevel, ModelSet, PendingCostEstimate, PreviewId, WorkflowTemplate};

use crate::app_state::AppState;
use crate::cost_estimate::estimate_cost;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub nl_input: String,
    pub workflow_template: String,
    #[serde(default)]
    pub model_set: Option<String>,
    #[serde(default)]
    pub classification_type: Option<String>,
}

/// `POST /request` — returns a preview UUID holding a Pending Cost Estimate.
pub async fn request_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> AppResult<Json<Value>> {
    let workflow_template = WorkflowTemplate::from_slug(&request.workflow_template)
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    let model_set = request
        .model_set
        .as_deref()
        .and_then(ModelSet::parse)
        .unwrap_or_default();
    let classification_type = match request.classification_type.as_deref() {
        Some("bug") => ClassificationType::Bug,
        Some("chore") => ClassificationType::Chore,
        _ => ClassificationType::Feature,
    };

    let complexity_level = adw_core::complexity::classify(adw_core::complexity::ComplexitySignals {
        word_count: adw_core::complexity::word_count(&request.nl_input),
        duration_seconds: 0.0,
        error_count: 0,
    });

    let now = chrono::Utc::now();
    let estimate = PendingCostEstimate {
        preview_id: PreviewId::generate(),
        nl_input: request.nl_input,
        workflow_template,
        model_set,
        complexity_level,
        classification_type,
        estimated_cost_total: estimate_cost(workflow_template, model_set, complexity_level),
        created_at: now,
        expires_at: now,
    };

    let estimate = state.previews.hold(estimate);
    Ok(Json(serde_json::json!({
        "preview_id": estimate.preview_id.0,
        "estimated_cost_total": estimate.estimated_cost_total,
        "expires_at": estimate.expires_at,
    })))
}

fn parse_preview_id(raw: &str) -> Result<PreviewId, AppError> {
    uuid::Uuid::parse_str(raw)
        .map(PreviewId)
        .map_err(|_| AppError::bad_request("invalid preview id"))
}

/// `GET /preview/{id}/cost` — fetch the held estimate, or a fresh one if it expired.
pub async fn preview_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_preview_id(&id)?;
    let estimate = state
        .previews
        .get(id)
        .ok_or_else(|| AppError::not_found("preview not found or expired"))?;

    Ok(Json(serde_json::json!({
        "preview_id": estimate.preview_id.0,
        "nl_input": estimate.nl_input,
        "workflow_template": estimate.workflow_template.slug(),
        "estimated_cost_total": estimate.estimated_cost_total,
        "expires_at": estimate.expires_at,
    })))
}
