//! Filesystem-backed [`StateStore`]: one directory per workflow under a
//! well-known root, each holding `adw_state.json` (§4.5, §6). The Indexer is
//! the sole reader; the Dispatcher is the sole writer of the initial record
//! (the child process owns every subsequent write).

use std::path::PathBuf;

use adw_contracts::state_store::StateStore;
use adw_model::{AdwId, WorkflowRecord};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub struct FsStateStore {
    root: PathBuf,
}

impl FsStateStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn state_path(&self, adw_id: AdwId) -> PathBuf {
        self.root.join(adw_id.as_hex()).join("adw_state.json")
    }

    /// Reads and parses one state file, retrying once to tolerate a racing
    /// partial write from the child process — whether the partial write
    /// shows up as a read error or as a truncated file that fails to parse.
    async fn read_with_retry(&self, path: &std::path::Path) -> anyhow::Result<WorkflowRecord> {
        match self.read_once(path).await {
            Ok(record) => Ok(record),
            Err(_) => {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                self.read_once(path).await
            }
        }
    }

    async fn read_once(&self, path: &std::path::Path) -> anyhow::Result<WorkflowRecord> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn write_initial(&self, record: &WorkflowRecord) -> anyhow::Result<()> {
        let dir = self.root.join(record.adw_id.as_hex());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("adw_state.json");
        let body = serde_json::to_vec_pretty(record)?;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&body).await?;
        Ok(())
    }

    async fn read(&self, adw_id: AdwId) -> anyhow::Result<Option<WorkflowRecord>> {
        let path = self.state_path(adw_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_with_retry(&path).await?))
    }

    async fn scan(&self) -> anyhow::Result<Vec<WorkflowRecord>> {
        let mut records = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path().join("adw_state.json");
            if !path.exists() {
                continue;
            }
            match self.read_with_retry(&path).await {
                Ok(record) => records.push(record),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable workflow state"),
            }
        }

        Ok(records)
    }
}
