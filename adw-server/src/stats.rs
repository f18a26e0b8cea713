//! In-memory webhook ingestion counters (§4.1). Reset on process restart is
//! acceptable; nothing here is persisted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

const MAX_RECENT_FAILURES: usize = 20;

#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub at: DateTime<Utc>,
    pub excerpt: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebhookStatusSnapshot {
    pub started_at: DateTime<Utc>,
    pub received: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub recent_failures: Vec<(DateTime<Utc>, String)>,
    pub last_successful_at: Option<DateTime<Utc>>,
}

pub struct WebhookStats {
    started_at: DateTime<Utc>,
    received: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    recent_failures: Mutex<VecDeque<FailureRecord>>,
    last_successful_at: Mutex<Option<DateTime<Utc>>>,
}

impl Default for WebhookStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            received: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            recent_failures: Mutex::new(VecDeque::with_capacity(MAX_RECENT_FAILURES)),
            last_successful_at: Mutex::new(None),
        }
    }
}

impl WebhookStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        *self.last_successful_at.lock() = Some(Utc::now());
    }

    /// `excerpt` is truncated to 200 chars, per the diagnostic-comment policy.
    pub fn record_failure(&self, excerpt: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let excerpt: String = excerpt.chars().take(200).collect();
        let mut failures = self.recent_failures.lock();
        if failures.len() == MAX_RECENT_FAILURES {
            failures.pop_front();
        }
        failures.push_back(FailureRecord {
            at: Utc::now(),
            excerpt,
        });
    }

    pub fn snapshot(&self) -> WebhookStatusSnapshot {
        WebhookStatusSnapshot {
            started_at: self.started_at,
            received: self.received.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            recent_failures: self
                .recent_failures
                .lock()
                .iter()
                .map(|f| (f.at, f.excerpt.clone()))
                .collect(),
            last_successful_at: *self.last_successful_at.lock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_caps_at_max_recent_failures() {
        let stats = WebhookStats::new();
        for i in 0..(MAX_RECENT_FAILURES + 5) {
            stats.record_failure(&format!("failure {i}"));
        }
        assert_eq!(stats.snapshot().recent_failures.len(), MAX_RECENT_FAILURES);
    }

    #[test]
    fn excerpt_truncates_to_200_chars() {
        let stats = WebhookStats::new();
        stats.record_failure(&"x".repeat(500));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.recent_failures[0].1.len(), 200);
    }
}
