use std::path::PathBuf;

use async_trait::async_trait;

/// What to launch and where to send its output.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub log_path: PathBuf,
    pub working_dir: Option<PathBuf>,
}

/// A handle to a spawned child, independent of the concrete process backend.
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// Graceful-then-forceful stop: SIGTERM, wait up to `timeout`, then SIGKILL.
    async fn stop(&self, timeout: std::time::Duration) -> anyhow::Result<()>;

    /// True once the child has exited (for reaping).
    async fn try_wait(&self) -> anyhow::Result<Option<i32>>;
}

/// Spawns and supervises detached child processes: workflow executables and
/// the two long-lived sidecars (webhook listener, tunnel).
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    async fn spawn(&self, spec: SpawnSpec) -> anyhow::Result<Box<dyn ProcessHandle>>;
}
