//! `/ws/{topic}` real-time transport (§4.4, §9 design notes).
//!
//! The accept loop must never block its send path on a client read: each
//! connection gets its own forwarding task that only drains the hub's
//! broadcast receiver, plus a liveness loop that reads incoming frames
//! purely to detect disconnects (ping/pong/close), never application data.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;
use uuid::Uuid;

use adw_model::Topic;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

const STALE_AFTER: Duration = Duration::from_secs(60);
const LIVENESS_SWEEP: Duration = Duration::from_secs(20);

pub async fn upgrade(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let topic = Topic::parse(&topic).ok_or_else(|| AppError::not_found("unknown topic"))?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, topic)))
}

async fn handle_socket(socket: WebSocket, state: AppState, topic: Topic) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    let snapshot = initial_snapshot(&state, &topic).await;
    if sender
        .send(Message::Text(
            serde_json::to_string(&serde_json::json!({
                "type": topic.frame_type(),
                "data": snapshot,
            }))
            .unwrap_or_default()
            .into(),
        ))
        .await
        .is_err()
    {
        return;
    }

    let mut rx = state.hub.subscribe(conn_id, topic.clone());

    let forward_topic = topic.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) if frame.topic == forward_topic => {
                    let text = serde_json::to_string(&frame.to_json()).unwrap_or_default();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let hub = state.hub.clone();
    let mut liveness_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                            hub.touch_liveness(conn_id);
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {
                            // application data on a server-push-only socket; ignore
                        }
                        Some(Err(_)) => break,
                    }
                }
                _ = tokio::time::sleep(LIVENESS_SWEEP) => {
                    if hub.is_stale(conn_id, STALE_AFTER) {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => liveness_task.abort(),
        _ = &mut liveness_task => send_task.abort(),
    }

    state.hub.remove_subscriber(conn_id);
    debug!(subscriber = %conn_id, %topic, "websocket connection closed");
}

async fn initial_snapshot(state: &AppState, topic: &Topic) -> serde_json::Value {
    match topic {
        Topic::Workflows => {
            let tracked = state.dispatcher.registry().tracked_ids();
            let mut live = Vec::with_capacity(tracked.len());
            for adw_id in tracked {
                if let Ok(Some(record)) = state.history.get(adw_id).await {
                    live.push(record);
                }
            }
            serde_json::json!({ "workflows": live })
        }
        Topic::WorkflowHistory => match state.history.all().await {
            Ok(records) => serde_json::json!({ "workflows": records }),
            Err(_) => serde_json::json!({ "workflows": [] }),
        },
        Topic::WebhookStatus => {
            let snapshot = state.webhook_stats.snapshot();
            serde_json::json!({
                "received": snapshot.received,
                "succeeded": snapshot.succeeded,
                "failed": snapshot.failed,
            })
        }
        Topic::AdwState(adw_id) => match state.history.get(*adw_id).await {
            Ok(Some(record)) => serde_json::json!(record),
            _ => serde_json::json!(null),
        },
        Topic::Queue | Topic::Routes | Topic::AdwMonitor | Topic::SystemStatus | Topic::PlannedFeatures => {
            serde_json::json!({})
        }
    }
}
