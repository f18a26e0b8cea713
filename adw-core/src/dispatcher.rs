//! Workflow dispatch and process tracking (§4.3): spawn, track, and reap
//! workflow child processes, and run the two supervised sidecar services.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adw_contracts::state_store::StateStore;
use adw_contracts::supervisor::{ProcessHandle, ProcessSupervisor, SpawnSpec};
use adw_model::{AdwId, WorkflowRecord, WorkflowStatus, WorkflowTemplate};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{info, warn};

const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// One tracked process: dispatcher-side bookkeeping alongside the live
/// handle. Survives only for the lifetime of the orchestrator process —
/// this registry is not persisted.
struct TrackedProcess {
    handle: Arc<dyn ProcessHandle>,
    started_at: chrono::DateTime<Utc>,
    log_path: PathBuf,
}

/// In-memory registry of currently-tracked workflow child processes, keyed
/// by `adw_id`. A single-owner struct, per the re-architecture guidance:
/// no module-level global, just a value held by the application context.
#[derive(Default)]
pub struct ProcessRegistry {
    processes: RwLock<HashMap<AdwId, TrackedProcess>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, adw_id: AdwId, tracked: TrackedProcess) {
        self.processes.write().insert(adw_id, tracked);
    }

    fn remove(&self, adw_id: AdwId) -> Option<TrackedProcess> {
        self.processes.write().remove(&adw_id)
    }

    pub fn pid(&self, adw_id: AdwId) -> Option<u32> {
        self.processes.read().get(&adw_id).map(|p| p.handle.pid())
    }

    fn handle(&self, adw_id: AdwId) -> Option<Arc<dyn ProcessHandle>> {
        self.processes.read().get(&adw_id).map(|p| p.handle.clone())
    }

    pub fn log_path(&self, adw_id: AdwId) -> Option<PathBuf> {
        self.processes.read().get(&adw_id).map(|p| p.log_path.clone())
    }

    pub fn started_at(&self, adw_id: AdwId) -> Option<chrono::DateTime<Utc>> {
        self.processes.read().get(&adw_id).map(|p| p.started_at)
    }

    pub fn tracked_ids(&self) -> Vec<AdwId> {
        self.processes.read().keys().copied().collect()
    }
}

/// Resolves a workflow template to its executable path. Every `adw_*`
/// executable lives under one directory, named by its slug.
pub struct ExecutableResolver {
    pub bin_dir: PathBuf,
}

impl ExecutableResolver {
    pub fn resolve(&self, workflow_template: WorkflowTemplate) -> PathBuf {
        self.bin_dir.join(format!("adw_{}", workflow_template.slug()))
    }
}

/// Spawns, tracks, and stops workflow child processes, and mirrors the same
/// graceful-then-forceful stop semantics onto the two supervised sidecars.
pub struct Dispatcher {
    supervisor: Arc<dyn ProcessSupervisor>,
    state_store: Arc<dyn StateStore>,
    resolver: ExecutableResolver,
    log_root: PathBuf,
    registry: ProcessRegistry,
}

impl Dispatcher {
    pub fn new(
        supervisor: Arc<dyn ProcessSupervisor>,
        state_store: Arc<dyn StateStore>,
        resolver: ExecutableResolver,
        log_root: PathBuf,
    ) -> Self {
        Self {
            supervisor,
            state_store,
            resolver,
            log_root,
            registry: ProcessRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Writes the initial `queued` state record, then spawns the child.
    /// Never waits on the child; a spawn failure is written back as a
    /// terminal `failed` record (fatal-on-spawn), not propagated as an error
    /// the caller must retry.
    pub async fn dispatch(&self, mut record: WorkflowRecord) -> anyhow::Result<WorkflowRecord> {
        self.state_store.write_initial(&record).await?;

        let program = self.resolver.resolve(record.workflow_template);
        let log_path = self.log_root.join(format!("{}.log", record.adw_id));
        let spec = SpawnSpec {
            program,
            args: vec![record.adw_id.to_string(), record.nl_input.clone()],
            log_path: log_path.clone(),
            working_dir: None,
        };

        match self.supervisor.spawn(spec).await {
            Ok(handle) => {
                let handle: Arc<dyn ProcessHandle> = Arc::from(handle);
                let pid = handle.pid();
                record.pid = Some(pid);
                self.registry.insert(
                    record.adw_id,
                    TrackedProcess {
                        handle,
                        started_at: Utc::now(),
                        log_path,
                    },
                );
                info!(adw_id = %record.adw_id, pid, "dispatched workflow");
            }
            Err(err) => {
                warn!(adw_id = %record.adw_id, %err, "workflow spawn failed");
                record.transition_to(WorkflowStatus::Failed)?;
                record.errors.push(adw_model::ErrorEntry {
                    category: "tool_error".to_string(),
                    message: format!("failed to spawn workflow process: {err}"),
                });
            }
        }

        Ok(record)
    }

    /// Graceful-then-forceful stop: SIGTERM (via the supervisor), wait up to
    /// the bounded timeout, then SIGKILL. Always removes the process from
    /// the registry, even if the child had already vanished.
    pub async fn stop(&self, adw_id: AdwId) -> anyhow::Result<bool> {
        let Some(tracked) = self.registry.remove(adw_id) else {
            return Ok(false);
        };
        tracked.handle.stop(GRACEFUL_STOP_TIMEOUT).await?;
        Ok(true)
    }

    /// Sweeps the registry for processes that have exited, pruning them.
    /// Final workflow status itself comes from the state file, written by
    /// the child; this only keeps the in-memory registry honest.
    pub async fn reap(&self) {
        let candidates = self.registry.tracked_ids();
        for adw_id in candidates {
            let Some(handle) = self.registry.handle(adw_id) else {
                continue;
            };
            if matches!(handle.try_wait().await, Ok(Some(_))) {
                self.registry.remove(adw_id);
            }
        }
    }
}

/// One of the two long-lived sidecar services (the webhook listener itself,
/// or the tunnel process). Each is a named singleton with the same
/// graceful-then-forceful stop semantics as a workflow child.
pub struct SidecarService {
    name: &'static str,
    handle: RwLock<Option<Box<dyn ProcessHandle>>>,
}

impl SidecarService {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.read().is_some()
    }

    pub async fn start(
        &self,
        supervisor: &dyn ProcessSupervisor,
        spec: SpawnSpec,
    ) -> anyhow::Result<()> {
        let handle = supervisor.spawn(spec).await?;
        *self.handle.write() = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        let handle = self.handle.write().take();
        if let Some(handle) = handle {
            handle.stop(GRACEFUL_STOP_TIMEOUT).await?;
        }
        Ok(())
    }

    pub async fn restart(
        &self,
        supervisor: &dyn ProcessSupervisor,
        spec: SpawnSpec,
    ) -> anyhow::Result<()> {
        self.stop().await?;
        self.start(supervisor, spec).await
    }
}
