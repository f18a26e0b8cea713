//! Embedded relational store (§4.5, §6): one SQLite file, one row per
//! workflow, arrays serialized as JSON text. Writes are funneled through a
//! single connection pool with `max_connections(1)` so there is never more
//! than one writer in flight, eliminating `SQLITE_BUSY` without
//! application-level locking.

use std::str::FromStr;

use adw_model::{
    AdwId, ClassificationType, ComplexityLevel, ErrorEntry, ModelSet, PhaseMetric, WorkflowRecord,
    WorkflowStatus, WorkflowTemplate,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workflows (
    adw_id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    workflow_template TEXT NOT NULL,
    model_set TEXT NOT NULL,
    complexity_level TEXT NOT NULL,
    classification_type TEXT NOT NULL,
    status TEXT NOT NULL,
    start_time TEXT,
    completed_at TEXT,
    pid INTEGER,
    nl_input TEXT NOT NULL,
    structured_input TEXT,
    actual_cost_total REAL NOT NULL,
    estimated_cost_total REAL NOT NULL,
    input_tokens INTEGER NOT NULL,
    output_tokens INTEGER NOT NULL,
    cache_read_tokens INTEGER NOT NULL,
    cache_creation_tokens INTEGER NOT NULL,
    retry_count INTEGER NOT NULL,
    total_duration_seconds REAL NOT NULL,
    steps_completed INTEGER NOT NULL,
    errors TEXT NOT NULL,
    phase_metrics TEXT NOT NULL,
    nl_input_clarity_score REAL NOT NULL,
    cost_efficiency_score REAL NOT NULL,
    performance_score REAL NOT NULL,
    quality_score REAL NOT NULL,
    anomaly_flags TEXT NOT NULL,
    optimization_recommendations TEXT NOT NULL,
    similar_workflow_ids TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS workflows_created_at_idx ON workflows (created_at);
CREATE INDEX IF NOT EXISTS workflows_status_idx ON workflows (status);
"#;

/// Status filter and free-text search, plus ordering and offset/limit
/// pagination, for `GET /workflow-history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub status: Option<WorkflowStatus>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// On-demand aggregates over the whole history table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryAnalytics {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub success_rate: f64,
    pub mean_duration_seconds: f64,
}

pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub async fn connect(database_url: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> sqlx::Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert-or-replace one record. Idempotent: applying the same record
    /// twice produces byte-identical columns.
    pub async fn upsert(&self, record: &WorkflowRecord) -> sqlx::Result<()> {
        let errors = serde_json::to_string(&record.errors).unwrap_or_default();
        let phase_metrics = serde_json::to_string(&record.phase_metrics).unwrap_or_default();
        let anomaly_flags = serde_json::to_string(&record.anomaly_flags).unwrap_or_default();
        let recommendations =
            serde_json::to_string(&record.optimization_recommendations).unwrap_or_default();
        let similar_ids: Vec<String> = record
            .similar_workflow_ids
            .iter()
            .map(|id| id.as_hex())
            .collect();
        let similar_ids = serde_json::to_string(&similar_ids).unwrap_or_default();
        let structured_input = record
            .structured_input
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_default());

        sqlx::query(
            r#"
            INSERT INTO workflows (
                adw_id, issue_id, created_at, workflow_template, model_set, complexity_level,
                classification_type, status, start_time, completed_at, pid, nl_input,
                structured_input, actual_cost_total, estimated_cost_total, input_tokens,
                output_tokens, cache_read_tokens, cache_creation_tokens, retry_count,
                total_duration_seconds, steps_completed, errors, phase_metrics,
                nl_input_clarity_score, cost_efficiency_score, performance_score, quality_score,
                anomaly_flags, optimization_recommendations, similar_workflow_ids
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            )
            ON CONFLICT(adw_id) DO UPDATE SET
                issue_id = excluded.issue_id,
                workflow_template = excluded.workflow_template,
                model_set = excluded.model_set,
                complexity_level = excluded.complexity_level,
                classification_type = excluded.classification_type,
                status = excluded.status,
                start_time = excluded.start_time,
                completed_at = excluded.completed_at,
                pid = excluded.pid,
                nl_input = excluded.nl_input,
                structured_input = excluded.structured_input,
                actual_cost_total = excluded.actual_cost_total,
                estimated_cost_total = excluded.estimated_cost_total,
                input_tokens = excluded.input_tokens,
                output_tokens = excluded.output_tokens,
                cache_read_tokens = excluded.cache_read_tokens,
                cache_creation_tokens = excluded.cache_creation_tokens,
                retry_count = excluded.retry_count,
                total_duration_seconds = excluded.total_duration_seconds,
                steps_completed = excluded.steps_completed,
                errors = excluded.errors,
                phase_metrics = excluded.phase_metrics,
                nl_input_clarity_score = excluded.nl_input_clarity_score,
                cost_efficiency_score = excluded.cost_efficiency_score,
                performance_score = excluded.performance_score,
                quality_score = excluded.quality_score,
                anomaly_flags = excluded.anomaly_flags,
                optimization_recommendations = excluded.optimization_recommendations,
                similar_workflow_ids = excluded.similar_workflow_ids
            "#,
        )
        .bind(record.adw_id.as_hex())
        .bind(&record.issue_id)
        .bind(record.created_at.to_rfc3339())
        .bind(record.workflow_template.slug())
        .bind(model_set_slug(record.model_set))
        .bind(complexity_slug(record.complexity_level))
        .bind(classification_slug(record.classification_type))
        .bind(status_slug(record.status))
        .bind(record.start_time.map(|t| t.to_rfc3339()))
        .bind(record.completed_at.map(|t| t.to_rfc3339()))
        .bind(record.pid)
        .bind(&record.nl_input)
        .bind(structured_input)
        .bind(record.actual_cost_total)
        .bind(record.estimated_cost_total)
        .bind(record.input_tokens as i64)
        .bind(record.output_tokens as i64)
        .bind(record.cache_read_tokens as i64)
        .bind(record.cache_creation_tokens as i64)
        .bind(record.retry_count as i64)
        .bind(record.total_duration_seconds)
        .bind(record.steps_completed as i64)
        .bind(errors)
        .bind(phase_metrics)
        .bind(record.nl_input_clarity_score)
        .bind(record.cost_efficiency_score)
        .bind(record.performance_score)
        .bind(record.quality_score)
        .bind(anomaly_flags)
        .bind(recommendations)
        .bind(similar_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, adw_id: AdwId) -> sqlx::Result<Option<WorkflowRecord>> {
        let row = sqlx::query("SELECT * FROM workflows WHERE adw_id = ?")
            .bind(adw_id.as_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_record(&r)).transpose()
    }

    /// Up to 20 IDs at a time, per the `/workflows/batch` endpoint cap.
    pub async fn get_batch(&self, ids: &[AdwId]) -> sqlx::Result<Vec<WorkflowRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get(*id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub async fn query(&self, query: &HistoryQuery) -> sqlx::Result<Vec<WorkflowRecord>> {
        let mut sql = String::from("SELECT * FROM workflows WHERE 1 = 1");
        if query.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if query.search.is_some() {
            sql.push_str(" AND nl_input LIKE ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut built = sqlx::query(&sql);
        if let Some(status) = query.status {
            built = built.bind(status_slug(status));
        }
        if let Some(search) = &query.search {
            built = built.bind(format!("%{search}%"));
        }
        built = built.bind(query.limit).bind(query.offset);

        let rows = built.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    /// All records, used by the sync pipeline's similarity/anomaly passes,
    /// which need the full peer set rather than a page.
    pub async fn all(&self) -> sqlx::Result<Vec<WorkflowRecord>> {
        let rows = sqlx::query("SELECT * FROM workflows").fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Completed records only, the candidate set `resync` iterates.
    pub async fn completed(&self) -> sqlx::Result<Vec<WorkflowRecord>> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE status = ?")
            .bind(status_slug(WorkflowStatus::Completed))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    pub async fn analytics(&self) -> sqlx::Result<HistoryAnalytics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed,
                SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed,
                AVG(total_duration_seconds) AS mean_duration
            FROM workflows
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        let completed: i64 = row.try_get::<Option<i64>, _>("completed")?.unwrap_or(0);
        let failed: i64 = row.try_get::<Option<i64>, _>("failed")?.unwrap_or(0);
        let mean_duration: f64 = row.try_get::<Option<f64>, _>("mean_duration")?.unwrap_or(0.0);

        let success_rate = if total > 0 {
            completed as f64 / total as f64
        } else {
            0.0
        };

        Ok(HistoryAnalytics {
            total,
            completed,
            failed,
            success_rate,
            mean_duration_seconds: mean_duration,
        })
    }
}

fn model_set_slug(model_set: ModelSet) -> &'static str {
    match model_set {
        ModelSet::Base => "base",
        ModelSet::Advanced => "advanced",
    }
}

fn complexity_slug(level: ComplexityLevel) -> &'static str {
    match level {
        ComplexityLevel::Simple => "simple",
        ComplexityLevel::Medium => "medium",
        ComplexityLevel::Complex => "complex",
    }
}

fn classification_slug(kind: ClassificationType) -> &'static str {
    match kind {
        ClassificationType::Feature => "feature",
        ClassificationType::Bug => "bug",
        ClassificationType::Chore => "chore",
    }
}

fn status_slug(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Queued => "queued",
        WorkflowStatus::Running => "running",
        WorkflowStatus::Completed => "completed",
        WorkflowStatus::Failed => "failed",
        WorkflowStatus::Stopped => "stopped",
    }
}

fn parse_datetime(raw: &str) -> sqlx::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn row_to_record(row: &SqliteRow) -> sqlx::Result<WorkflowRecord> {
    let adw_id_hex: String = row.try_get("adw_id")?;
    let adw_id = AdwId::parse(&adw_id_hex)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid adw_id {adw_id_hex}").into()))?;

    let workflow_template: String = row.try_get("workflow_template")?;
    let workflow_template = WorkflowTemplate::from_slug(&workflow_template)
        .map_err(|err| sqlx::Error::Decode(err.to_string().into()))?;

    let model_set: String = row.try_get("model_set")?;
    let model_set = ModelSet::parse(&model_set)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid model_set {model_set}").into()))?;

    let complexity_level: String = row.try_get("complexity_level")?;
    let complexity_level = match complexity_level.as_str() {
        "simple" => ComplexityLevel::Simple,
        "medium" => ComplexityLevel::Medium,
        "complex" => ComplexityLevel::Complex,
        other => return Err(sqlx::Error::Decode(format!("invalid complexity_level {other}").into())),
    };

    let classification_type: String = row.try_get("classification_type")?;
    let classification_type = match classification_type.as_str() {
        "feature" => ClassificationType::Feature,
        "bug" => ClassificationType::Bug,
        "chore" => ClassificationType::Chore,
        other => {
            return Err(sqlx::Error::Decode(
                format!("invalid classification_type {other}").into(),
            ))
        }
    };

    let status: String = row.try_get("status")?;
    let status = match status.as_str() {
        "queued" => WorkflowStatus::Queued,
        "running" => WorkflowStatus::Running,
        "completed" => WorkflowStatus::Completed,
        "failed" => WorkflowStatus::Failed,
        "stopped" => WorkflowStatus::Stopped,
        other => return Err(sqlx::Error::Decode(format!("invalid status {other}").into())),
    };

    let created_at: String = row.try_get("created_at")?;
    let created_at = parse_datetime(&created_at)?;

    let start_time: Option<String> = row.try_get("start_time")?;
    let start_time = start_time.map(|s| parse_datetime(&s)).transpose()?;

    let completed_at: Option<String> = row.try_get("completed_at")?;
    let completed_at = completed_at.map(|s| parse_datetime(&s)).transpose()?;

    let structured_input: Option<String> = row.try_get("structured_input")?;
    let structured_input = structured_input
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|err: serde_json::Error| sqlx::Error::Decode(err.into()))?;

    let errors: String = row.try_get("errors")?;
    let errors: Vec<ErrorEntry> =
        serde_json::from_str(&errors).map_err(|err| sqlx::Error::Decode(err.into()))?;

    let phase_metrics: String = row.try_get("phase_metrics")?;
    let phase_metrics: Vec<PhaseMetric> =
        serde_json::from_str(&phase_metrics).map_err(|err| sqlx::Error::Decode(err.into()))?;

    let anomaly_flags: String = row.try_get("anomaly_flags")?;
    let anomaly_flags: Vec<String> =
        serde_json::from_str(&anomaly_flags).map_err(|err| sqlx::Error::Decode(err.into()))?;

    let optimization_recommendations: String = row.try_get("optimization_recommendations")?;
    let optimization_recommendations: Vec<String> =
        serde_json::from_str(&optimization_recommendations).map_err(|err| sqlx::Error::Decode(err.into()))?;

    let similar_workflow_ids: String = row.try_get("similar_workflow_ids")?;
    let similar_workflow_ids: Vec<String> =
        serde_json::from_str(&similar_workflow_ids).map_err(|err| sqlx::Error::Decode(err.into()))?;
    let similar_workflow_ids: Vec<AdwId> = similar_workflow_ids
        .iter()
        .filter_map(|hex| AdwId::parse(hex))
        .collect();

    let pid: Option<i64> = row.try_get("pid")?;

    Ok(WorkflowRecord {
        adw_id,
        issue_id: row.try_get("issue_id")?,
        created_at,
        workflow_template,
        model_set,
        complexity_level,
        classification_type,
        status,
        start_time,
        completed_at,
        pid: pid.map(|p| p as u32),
        nl_input: row.try_get("nl_input")?,
        structured_input,
        actual_cost_total: row.try_get("actual_cost_total")?,
        estimated_cost_total: row.try_get("estimated_cost_total")?,
        input_tokens: row.try_get::<i64, _>("input_tokens")? as u64,
        output_tokens: row.try_get::<i64, _>("output_tokens")? as u64,
        cache_read_tokens: row.try_get::<i64, _>("cache_read_tokens")? as u64,
        cache_creation_tokens: row.try_get::<i64, _>("cache_creation_tokens")? as u64,
        retry_count: row.try_get::<i64, _>("retry_count")? as u32,
        total_duration_seconds: row.try_get("total_duration_seconds")?,
        steps_completed: row.try_get::<i64, _>("steps_completed")? as u32,
        errors,
        phase_metrics,
        nl_input_clarity_score: row.try_get("nl_input_clarity_score")?,
        cost_efficiency_score: row.try_get("cost_efficiency_score")?,
        performance_score: row.try_get("performance_score")?,
        quality_score: row.try_get("quality_score")?,
        anomaly_flags,
        optimization_recommendations,
        similar_workflow_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_model::{AdwId, ClassificationType, ModelSet, WorkflowTemplate};

    async fn store() -> HistoryStore {
        HistoryStore::connect("sqlite::memory:").await.unwrap()
    }

    fn record() -> WorkflowRecord {
        WorkflowRecord::new_queued(
            AdwId::generate(),
            "42",
            WorkflowTemplate::PlanIso,
            ModelSet::Base,
            ClassificationType::Feature,
            "implement auth",
        )
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = store().await;
        let record = record();
        store.upsert(&record).await.unwrap();
        let fetched = store.get(record.adw_id).await.unwrap().unwrap();
        assert_eq!(fetched.adw_id, record.adw_id);
        assert_eq!(fetched.nl_input, record.nl_input);
    }

    #[tokio::test]
    async fn repeated_upsert_is_idempotent() {
        let store = store().await;
        let record = record();
        store.upsert(&record).await.unwrap();
        store.upsert(&record).await.unwrap();
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn batch_caps_to_requested_ids_only() {
        let store = store().await;
        let a = record();
        let b = record();
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();
        let fetched = store.get_batch(&[a.adw_id]).await.unwrap();
        assert_eq!(fetched.len(), 1);
    }
}
