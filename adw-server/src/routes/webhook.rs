//! Webhook Ingestor HTTP surface (§4.1, §6).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use adw_contracts::issue_tracker::BOT_COMMENT_PREFIX;
use adw_core::extraction;
use adw_model::{AdwId, ClassificationType, Topic, WorkflowRecord};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct FormWrapper {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    issue_id: String,
    body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum WebhookStatus {
    Ok,
    Ignored,
    Error,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    status: WebhookStatus,
}

/// Accepts both `application/json` and `application/x-www-form-urlencoded`
/// (the latter wrapping JSON under `payload=`) with identical resulting
/// behavior (§8 content-type boundary property).
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> AppResult<Json<WebhookResponse>> {
    state.webhook_stats.record_received();

    let event = match parse_event(&headers, &body) {
        Ok(event) => event,
        Err(err) => {
            warn!(%err, "malformed webhook payload");
            state.webhook_stats.record_failure(&err.to_string());
            return Ok(Json(WebhookResponse {
                status: WebhookStatus::Ignored,
            }));
        }
    };

    match process_event(&state, event).await {
        Ok(()) => {
            state.webhook_stats.record_success();
            Ok(Json(WebhookResponse {
                status: WebhookStatus::Ok,
            }))
        }
        Err(IngestOutcome::Ignored) => Ok(Json(WebhookResponse {
            status: WebhookStatus::Ignored,
        })),
        Err(IngestOutcome::Failed) => Ok(Json(WebhookResponse {
            status: WebhookStatus::Error,
        })),
    }
}

fn parse_event(headers: &HeaderMap, body: &[u8]) -> anyhow::Result<WebhookEvent> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let json_text: String = if content_type.starts_with("application/x-www-form-urlencoded") {
        let form: FormWrapper = serde_urlencoded::from_bytes(body)?;
        form.payload
    } else {
        String::from_utf8(body.to_vec())?
    };

    Ok(serde_json::from_str(&json_text)?)
}

enum IngestOutcome {
    Ignored,
    Failed,
}

async fn process_event(state: &AppState, event: WebhookEvent) -> Result<(), IngestOutcome> {
    let extracted = match extraction::extract(&event.body) {
        Some(extracted) => Some(extracted),
        None => slow_path_classify(state, &event.body).await,
    };

    let Some(extracted) = extracted else {
        info!(issue_id = %event.issue_id, "no workflow command recognized, ignoring");
        return Ok(());
    };

    admit_and_dispatch(state, &event, extracted).await
}

async fn slow_path_classify(
    state: &AppState,
    text: &str,
) -> Option<extraction::ExtractedCommand> {
    match state.classifier.classify(text).await {
        Ok(Some(outcome)) => Some(extraction::ExtractedCommand {
            workflow_template: outcome.workflow_template,
            adw_id: outcome.adw_id,
            model_set: outcome.model_set,
        }),
        Ok(None) => None,
        Err(err) => {
            warn!(%err, "slow-path classifier failed, ignoring (non-fatal)");
            None
        }
    }
}

async fn admit_and_dispatch(
    state: &AppState,
    event: &WebhookEvent,
    extracted: extraction::ExtractedCommand,
) -> Result<(), IngestOutcome> {
    let admission = state
        .admission
        .check(Some(extracted.workflow_template))
        .await
        .map_err(|_| IngestOutcome::Failed)?;

    let status = match admission {
        Ok(status) => status,
        Err(denial) => {
            post_diagnostic(
                state,
                &event.issue_id,
                &format!(
                    "Cannot start workflow: {}. quota={:?} disk={:.1}% worktrees={}/{}",
                    denial.reason,
                    denial.status.quota,
                    denial.status.disk_used_percent,
                    denial.status.active_worktrees,
                    denial.status.max_worktrees,
                ),
            )
            .await;
            return Err(IngestOutcome::Ignored);
        }
    };
    let _ = status;

    let adw_id = extracted.adw_id.unwrap_or_else(AdwId::generate);
    let record = WorkflowRecord::new_queued(
        adw_id,
        event.issue_id.clone(),
        extracted.workflow_template,
        extracted.model_set,
        ClassificationType::Feature,
        event.body.clone(),
    );

    let record = state
        .dispatcher
        .dispatch(record)
        .await
        .map_err(|_| IngestOutcome::Failed)?;

    if record.status == adw_model::WorkflowStatus::Failed {
        post_diagnostic(
            state,
            &event.issue_id,
            "Dispatch failed after admission passed; see server logs.",
        )
        .await;
        return Err(IngestOutcome::Failed);
    }

    state.hub.publish(
        Topic::Workflows,
        serde_json::json!({ "adw_id": record.adw_id.as_hex(), "status": "queued" }),
    );

    post_acknowledgement(state, &event.issue_id, &record).await;
    Ok(())
}

async fn post_acknowledgement(state: &AppState, issue_id: &str, record: &WorkflowRecord) {
    let body = format!(
        "{BOT_COMMENT_PREFIX}\nStarted `{}` as `{}`.",
        record.workflow_template.slug(),
        record.adw_id
    );
    if let Err(err) = state.issue_tracker.post_comment(issue_id, &body).await {
        warn!(%err, "failed to post acknowledgement comment");
    }
}

async fn post_diagnostic(state: &AppState, issue_id: &str, message: &str) {
    let body = format!("{BOT_COMMENT_PREFIX}\n{message}");
    if let Err(err) = state.issue_tracker.post_comment(issue_id, &body).await {
        warn!(%err, "failed to post diagnostic comment");
    }
}

#[derive(Debug, Deserialize)]
pub struct RedeliverRequest {
    delivery_id: String,
}

/// `POST /github-webhook/redeliver` (§6): asks the issue tracker to replay a
/// delivery GitHub reports as failed.
pub async fn redeliver(
    State(state): State<AppState>,
    Json(request): Json<RedeliverRequest>,
) -> AppResult<Json<Value>> {
    state
        .issue_tracker
        .redeliver(&request.delivery_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(serde_json::json!({ "redelivered": request.delivery_id })))
}

/// `GET /webhook-status` (§6): uptime, totals, recent failures, last success.
pub async fn webhook_status(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.webhook_stats.snapshot();
    Json(serde_json::json!({
        "uptime_seconds": (chrono::Utc::now() - state.started_at).num_seconds(),
        "received": snapshot.received,
        "succeeded": snapshot.succeeded,
        "failed": snapshot.failed,
        "recent_failures": snapshot.recent_failures,
        "last_successful_at": snapshot.last_successful_at,
    }))
}

