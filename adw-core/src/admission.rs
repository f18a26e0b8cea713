//! Pre-flight admission checks (§4.2): workflow validity, API quota, disk
//! usage, and worktree count. All four are evaluated and reported together,
//! even though only the first failing one is, strictly, the rejection cause —
//! the Ingestor's "cannot start" comment shows all four current values.

use std::sync::Arc;

use adw_contracts::admission::{DiskUsageProbe, QuotaOracle, QuotaStatus, WorktreeCounter};
use adw_model::WorkflowTemplate;
use thiserror::Error;

/// Snapshot of the four admission signals, always computed together so a
/// rejection can report every current value, not just the one that failed.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionStatus {
    pub workflow_known: bool,
    pub quota: QuotaStatus,
    pub disk_used_percent: f64,
    pub disk_reject_threshold_percent: f64,
    pub active_worktrees: usize,
    pub max_worktrees: usize,
}

impl AdmissionStatus {
    fn disk_ok(&self) -> bool {
        self.disk_used_percent < self.disk_reject_threshold_percent
    }

    fn worktrees_ok(&self) -> bool {
        self.active_worktrees < self.max_worktrees
    }

    fn quota_ok(&self) -> bool {
        self.quota == QuotaStatus::Available
    }

    pub fn is_admitted(&self) -> bool {
        self.workflow_known && self.quota_ok() && self.disk_ok() && self.worktrees_ok()
    }
}

/// Structured rejection reason, carrying the full status snapshot so the
/// Ingestor can render it verbatim into a "cannot start" comment.
#[derive(Debug, Error, Clone, Copy)]
#[error("admission rejected: {reason}")]
pub struct AdmissionDenial {
    pub reason: DenialReason,
    pub status: AdmissionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    UnknownWorkflow,
    QuotaExhausted,
    DiskAlmostFull,
    TooManyWorktrees,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DenialReason::UnknownWorkflow => "unknown workflow",
            DenialReason::QuotaExhausted => "API quota exhausted",
            DenialReason::DiskAlmostFull => "disk usage at or above the reject threshold",
            DenialReason::TooManyWorktrees => "too many active worktrees",
        };
        f.write_str(text)
    }
}

/// Evaluates admission for a proposed `workflow_template`. Checks are
/// deliberately not atomic with dispatch: resources may be consumed between
/// this check and spawn; that race is accepted and reported the same way on
/// a second rejection at spawn time.
pub struct AdmissionController {
    quota_oracle: Arc<dyn QuotaOracle>,
    disk_probe: Arc<dyn DiskUsageProbe>,
    worktree_counter: Arc<dyn WorktreeCounter>,
    max_worktrees: usize,
    disk_reject_threshold_percent: f64,
}

impl AdmissionController {
    pub fn new(
        quota_oracle: Arc<dyn QuotaOracle>,
        disk_probe: Arc<dyn DiskUsageProbe>,
        worktree_counter: Arc<dyn WorktreeCounter>,
        max_worktrees: usize,
        disk_reject_threshold_percent: f64,
    ) -> Self {
        Self {
            quota_oracle,
            disk_probe,
            worktree_counter,
            max_worktrees,
            disk_reject_threshold_percent,
        }
    }

    pub async fn check(
        &self,
        workflow_template: Option<WorkflowTemplate>,
    ) -> anyhow::Result<Result<AdmissionStatus, AdmissionDenial>> {
        let quota = self.quota_oracle.status().await?;
        let disk_used_percent = self.disk_probe.used_percent().await?;
        let active_worktrees = self.worktree_counter.count().await?;

        let status = AdmissionStatus {
            workflow_known: workflow_template.is_some(),
            quota,
            disk_used_percent,
            disk_reject_threshold_percent: self.disk_reject_threshold_percent,
            active_worktrees,
            max_worktrees: self.max_worktrees,
        };

        if !status.workflow_known {
            return Ok(Err(AdmissionDenial {
                reason: DenialReason::UnknownWorkflow,
                status,
            }));
        }
        if !status.quota_ok() {
            return Ok(Err(AdmissionDenial {
                reason: DenialReason::QuotaExhausted,
                status,
            }));
        }
        if !status.disk_ok() {
            return Ok(Err(AdmissionDenial {
                reason: DenialReason::DiskAlmostFull,
                status,
            }));
        }
        if !status.worktrees_ok() {
            return Ok(Err(AdmissionDenial {
                reason: DenialReason::TooManyWorktrees,
                status,
            }));
        }

        Ok(Ok(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProbes {
        quota: QuotaStatus,
        disk_percent: f64,
        worktrees: usize,
    }

    #[async_trait]
    impl QuotaOracle for FixedProbes {
        async fn status(&self) -> anyhow::Result<QuotaStatus> {
            Ok(self.quota)
        }
    }
    #[async_trait]
    impl DiskUsageProbe for FixedProbes {
        async fn used_percent(&self) -> anyhow::Result<f64> {
            Ok(self.disk_percent)
        }
    }
    #[async_trait]
    impl WorktreeCounter for FixedProbes {
        async fn count(&self) -> anyhow::Result<usize> {
            Ok(self.worktrees)
        }
    }

    fn controller(probes: FixedProbes, max_worktrees: usize) -> AdmissionController {
        let probes = Arc::new(probes);
        AdmissionController::new(probes.clone(), probes.clone(), probes, max_worktrees, 95.0)
    }

    #[tokio::test]
    async fn worktree_count_at_limit_rejects_one_below_admits() {
        let at_limit = controller(
            FixedProbes {
                quota: QuotaStatus::Available,
                disk_percent: 10.0,
                worktrees: 15,
            },
            15,
        );
        let result = at_limit.check(Some(WorkflowTemplate::PlanIso)).await.unwrap();
        assert!(result.is_err());

        let below_limit = controller(
            FixedProbes {
                quota: QuotaStatus::Available,
                disk_percent: 10.0,
                worktrees: 14,
            },
            15,
        );
        let result = below_limit.check(Some(WorkflowTemplate::PlanIso)).await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn disk_usage_rejects_at_95_percent() {
        let controller = controller(
            FixedProbes {
                quota: QuotaStatus::Available,
                disk_percent: 95.0,
                worktrees: 0,
            },
            15,
        );
        let result = controller.check(Some(WorkflowTemplate::PlanIso)).await.unwrap();
        assert_eq!(result.unwrap_err().reason, DenialReason::DiskAlmostFull);
    }

    #[tokio::test]
    async fn unknown_workflow_is_rejected_before_other_checks() {
        let controller = controller(
            FixedProbes {
                quota: QuotaStatus::Exhausted,
                disk_percent: 99.0,
                worktrees: 100,
            },
            15,
        );
        let result = controller.check(None).await.unwrap();
        assert_eq!(result.unwrap_err().reason, DenialReason::UnknownWorkflow);
    }
}
