//! Admission signal sources (§4.2): disk usage via `statvfs`, worktree count
//! via a directory scan, and a quota oracle. The quota oracle has no
//! universal implementation — it is an external collaborator (the upstream
//! LLM provider) — so this crate ships only the always-available stub used
//! when no provider-specific oracle is wired in.

use std::path::PathBuf;

use adw_contracts::admission::{DiskUsageProbe, QuotaOracle, QuotaStatus, WorktreeCounter};
use async_trait::async_trait;

pub struct StatvfsDiskProbe {
    pub path: PathBuf,
}

#[async_trait]
impl DiskUsageProbe for StatvfsDiskProbe {
    async fn used_percent(&self) -> anyhow::Result<f64> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let stats = nix::sys::statvfs::statvfs(&path)?;
            let total = stats.blocks() as f64;
            let available = stats.blocks_available() as f64;
            if total == 0.0 {
                return Ok(0.0);
            }
            Ok(((total - available) / total) * 100.0)
        })
        .await?
    }
}

pub struct DirWorktreeCounter {
    pub root: PathBuf,
}

#[async_trait]
impl WorktreeCounter for DirWorktreeCounter {
    async fn count(&self) -> anyhow::Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Always reports quota as available. The real oracle is the upstream LLM
/// provider's pluggable interface, deliberately out of scope here.
pub struct AlwaysAvailableQuota;

#[async_trait]
impl QuotaOracle for AlwaysAvailableQuota {
    async fn status(&self) -> anyhow::Result<QuotaStatus> {
        Ok(QuotaStatus::Available)
    }
}
