//! Broadcast Hub (§4.4): fan-out of delta frames to per-topic subscribers,
//! plus the watcher scaffolding that detects changes and publishes them.
//!
//! The accept loop itself (the part that must never block on a client read)
//! lives at the transport layer; this module only owns the subscriber
//! registry, the broadcast channel, and the snapshot-diff watcher loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use adw_model::Topic;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 1024;

/// One update frame, framed per §4.4 as `{type: <topic>_update, data: <snapshot>}`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub topic: Topic,
    pub data: Value,
}

impl Frame {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "type": self.topic.frame_type(),
            "data": self.data,
        })
    }
}

/// Per-subscriber liveness bookkeeping. The hub never reads application data
/// from a subscriber; `touch` is called only from the transport-layer
/// liveness check (e.g. a websocket ping/pong), never from the send path.
struct SubscriberInfo {
    topic: Topic,
    last_seen: Instant,
}

/// Fan-out point for all real-time subscribers. Internally a single
/// broadcast channel carries every topic's frames; subscribers filter by
/// topic client-side (cheap, since frames are small JSON snapshots).
///
/// A lagging subscriber's oldest unread frames are silently dropped by the
/// underlying broadcast channel once its buffer fills — exactly the
/// drop-oldest discipline §4.4 and §5 require, with no extra bookkeeping.
pub struct BroadcastHub {
    sender: broadcast::Sender<Frame>,
    subscribers: Arc<DashMap<Uuid, SubscriberInfo>>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            subscribers: Arc::new(DashMap::new()),
        }
    }

    /// Publishes a delta frame. Ordering is preserved per-topic because all
    /// publishers funnel through this one channel and subscribers replay it
    /// in send order; there is no cross-topic ordering guarantee.
    pub fn publish(&self, topic: Topic, data: Value) {
        let receiver_count = self.sender.receiver_count();
        if receiver_count == 0 {
            return;
        }
        let _ = self.sender.send(Frame { topic, data });
    }

    /// Registers a new subscriber and returns a receiver filtered to its
    /// topic. The caller (transport layer) is responsible for the
    /// send/yield/liveness-read loop described in the design notes.
    pub fn subscribe(&self, id: Uuid, topic: Topic) -> broadcast::Receiver<Frame> {
        self.subscribers.insert(
            id,
            SubscriberInfo {
                topic,
                last_seen: Instant::now(),
            },
        );
        self.sender.subscribe()
    }

    pub fn touch_liveness(&self, id: Uuid) {
        if let Some(mut info) = self.subscribers.get_mut(&id) {
            info.last_seen = Instant::now();
        }
    }

    /// Removes a subscriber on disconnect or failed send/liveness check.
    /// Non-fatal: pruning one subscriber never disrupts its peers.
    pub fn remove_subscriber(&self, id: Uuid) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber removed");
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.subscribers.iter().filter(|e| &e.topic == topic).count()
    }

    /// True once a subscriber hasn't been touched within `max_idle` — the
    /// transport layer's liveness check, not the hub's own business.
    pub fn is_stale(&self, id: Uuid, max_idle: Duration) -> bool {
        self.subscribers
            .get(&id)
            .is_none_or(|info| info.last_seen.elapsed() > max_idle)
    }
}

/// A background task that periodically computes a topic's current snapshot
/// and publishes a delta only when it differs from the last one observed —
/// the snapshot-diff discipline described in §4.4.
#[async_trait::async_trait]
pub trait Watcher: Send + Sync {
    fn topic(&self) -> Topic;
    fn poll_interval(&self) -> Duration;

    /// Computes the current snapshot. Errors are logged and skipped; they
    /// never stop the watcher loop.
    async fn snapshot(&self) -> anyhow::Result<Value>;
}

/// Runs one watcher's poll loop until the hub is dropped. Intended to be
/// spawned once per watcher at startup.
pub async fn run_watcher(hub: Arc<BroadcastHub>, watcher: Arc<dyn Watcher>) {
    let mut interval = tokio::time::interval(watcher.poll_interval());
    let mut last: Option<Value> = None;
    loop {
        interval.tick().await;
        match watcher.snapshot().await {
            Ok(current) => {
                if last.as_ref() != Some(&current) {
                    hub.publish(watcher.topic(), current.clone());
                    last = Some(current);
                }
            }
            Err(err) => {
                tracing::warn!(topic = %watcher.topic(), %err, "watcher snapshot failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_does_not_error() {
        let hub = BroadcastHub::new();
        hub.publish(Topic::Workflows, serde_json::json!({}));
    }

    #[tokio::test]
    async fn subscriber_receives_published_frame() {
        let hub = BroadcastHub::new();
        let id = Uuid::new_v4();
        let mut rx = hub.subscribe(id, Topic::Workflows);
        hub.publish(Topic::Workflows, serde_json::json!({"n": 1}));
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.topic, Topic::Workflows);
        assert_eq!(frame.data, serde_json::json!({"n": 1}));
    }

    #[tokio::test]
    async fn removed_subscriber_is_not_counted() {
        let hub = BroadcastHub::new();
        let id = Uuid::new_v4();
        let _rx = hub.subscribe(id, Topic::Queue);
        assert_eq!(hub.subscriber_count(&Topic::Queue), 1);
        hub.remove_subscriber(id);
        assert_eq!(hub.subscriber_count(&Topic::Queue), 0);
    }
}
