//! History Indexer sync orchestration (§4.5): scan → enrich → score →
//! similarity → upsert → broadcast, plus the separate `resync` backfill.

use std::sync::Arc;

use adw_contracts::state_store::StateStore;
use adw_model::{Topic, WorkflowRecord};
use tracing::warn;

use crate::anomaly;
use crate::complexity::{self, ComplexitySignals};
use crate::enrichment;
use crate::hub::BroadcastHub;
use crate::recommendations;
use crate::scoring;
use crate::similarity;
use crate::store::HistoryStore;

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncOutcome {
    pub scanned: usize,
    pub indexed: usize,
    pub failed: usize,
}

pub struct Indexer {
    state_store: Arc<dyn StateStore>,
    history_store: Arc<HistoryStore>,
    hub: Option<Arc<BroadcastHub>>,
}

impl Indexer {
    pub fn new(
        state_store: Arc<dyn StateStore>,
        history_store: Arc<HistoryStore>,
        hub: Option<Arc<BroadcastHub>>,
    ) -> Self {
        Self {
            state_store,
            history_store,
            hub,
        }
    }

    /// Runs one full sync pass. Idempotent: re-running with no underlying
    /// state change upserts byte-identical rows. A single record's failure
    /// is counted and logged, never aborts the rest of the pass.
    pub async fn sync(&self) -> anyhow::Result<SyncOutcome> {
        let mut raw = self.state_store.scan().await?;
        for record in &mut raw {
            enrichment::enrich(record);
        }

        let peer_mean_duration = mean(raw.iter().map(|r| r.total_duration_seconds));

        for record in &mut raw {
            record.complexity_level = complexity::classify(ComplexitySignals {
                word_count: complexity::word_count(&record.nl_input),
                duration_seconds: record.total_duration_seconds,
                error_count: record.errors.len(),
            });
        }

        let snapshot = raw.clone();
        let mut outcome = SyncOutcome {
            scanned: raw.len(),
            ..Default::default()
        };

        for record in &mut raw {
            if let Err(err) = self
                .score_and_upsert(record, &snapshot, peer_mean_duration)
                .await
            {
                outcome.failed += 1;
                warn!(adw_id = %record.adw_id, %err, "failed to index workflow record");
                continue;
            }
            outcome.indexed += 1;
        }

        if let Some(hub) = &self.hub {
            hub.publish(
                Topic::WorkflowHistory,
                serde_json::json!({ "indexed": outcome.indexed, "scanned": outcome.scanned }),
            );
        }

        Ok(outcome)
    }

    async fn score_and_upsert(
        &self,
        record: &mut WorkflowRecord,
        snapshot: &[WorkflowRecord],
        peer_mean_duration: Option<f64>,
    ) -> anyhow::Result<()> {
        record.nl_input_clarity_score = scoring::clarity_score(record);
        record.cost_efficiency_score = scoring::cost_efficiency_score(record);
        record.performance_score = scoring::performance_score(record, peer_mean_duration);
        record.quality_score = scoring::quality_score(record);

        let similar_ids = similarity::find_similar(record, snapshot);
        let similar_records: Vec<WorkflowRecord> = snapshot
            .iter()
            .filter(|candidate| similar_ids.contains(&candidate.adw_id))
            .cloned()
            .collect();
        record.similar_workflow_ids = similar_ids;
        record.anomaly_flags = anomaly::detect(record, &similar_records);
        record.optimization_recommendations =
            recommendations::recommend(record, record.nl_input_clarity_score);

        self.history_store.upsert(record).await?;
        Ok(())
    }

    /// Backfills cost data for already-completed records from the
    /// filesystem, without re-running sync's upsert-insert path. Used when
    /// cost tracking was added after a workflow had already completed.
    pub async fn resync(&self) -> anyhow::Result<SyncOutcome> {
        let completed = self.history_store.completed().await?;
        let mut outcome = SyncOutcome {
            scanned: completed.len(),
            ..Default::default()
        };

        for mut record in completed {
            let Some(fresh) = self.state_store.read(record.adw_id).await? else {
                outcome.failed += 1;
                continue;
            };
            record.phase_metrics = fresh.phase_metrics;
            record.actual_cost_total = fresh.actual_cost_total;
            record.retry_count = fresh.retry_count;
            enrichment::enrich(&mut record);

            if let Err(err) = self.history_store.upsert(&record).await {
                outcome.failed += 1;
                warn!(adw_id = %record.adw_id, %err, "resync upsert failed");
                continue;
            }
            outcome.indexed += 1;
        }

        Ok(outcome)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, ModelSet, WorkflowTemplate};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeStateStore {
        records: Mutex<Vec<WorkflowRecord>>,
    }

    #[async_trait]
    impl StateStore for FakeStateStore {
        async fn write_initial(&self, record: &WorkflowRecord) -> anyhow::Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn read(&self, adw_id: AdwId) -> anyhow::Result<Option<WorkflowRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.adw_id == adw_id)
                .cloned())
        }

        async fn scan(&self) -> anyhow::Result<Vec<WorkflowRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn record(nl_input: &str) -> WorkflowRecord {
        WorkflowRecord::new_queued(
            AdwId::generate(),
            "1",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            nl_input,
        )
    }

    #[tokio::test]
    async fn sync_is_idempotent() {
        let state_store = Arc::new(FakeStateStore {
            records: Mutex::new(vec![record("implement auth"), record("implement billing")]),
        });
        let history_store = Arc::new(HistoryStore::connect("sqlite::memory:").await.unwrap());
        let indexer = Indexer::new(state_store, history_store.clone(), None);

        indexer.sync().await.unwrap();
        let first_pass = history_store.all().await.unwrap();
        indexer.sync().await.unwrap();
        let second_pass = history_store.all().await.unwrap();

        let mut first_ids: Vec<_> = first_pass.iter().map(|r| r.adw_id).collect();
        let mut second_ids: Vec<_> = second_pass.iter().map(|r| r.adw_id).collect();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first_pass.len(), second_pass.len());
    }

    #[tokio::test]
    async fn sync_never_assigns_self_as_similar() {
        let target = record("implement auth");
        let state_store = Arc::new(FakeStateStore {
            records: Mutex::new(vec![target.clone()]),
        });
        let history_store = Arc::new(HistoryStore::connect("sqlite::memory:").await.unwrap());
        let indexer = Indexer::new(state_store, history_store.clone(), None);
        indexer.sync().await.unwrap();

        let stored = history_store.get(target.adw_id).await.unwrap().unwrap();
        assert!(!stored.similar_workflow_ids.contains(&target.adw_id));
    }
}
