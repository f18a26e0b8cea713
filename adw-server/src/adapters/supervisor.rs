//! Subprocess supervision (§4.3, §9): spawn via `tokio::process::Command`
//! with output redirected to a per-workflow log file, then graceful SIGTERM
//! followed by a bounded wait and SIGKILL.

use std::process::Stdio;
use std::time::Duration;

use adw_contracts::supervisor::{ProcessHandle, ProcessSupervisor, SpawnSpec};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::process::Child;
use tracing::warn;

pub struct TokioProcessSupervisor;

#[async_trait]
impl ProcessSupervisor for TokioProcessSupervisor {
    async fn spawn(&self, spec: SpawnSpec) -> anyhow::Result<Box<dyn ProcessHandle>> {
        let log_file = std::fs::File::create(&spec.log_path)?;
        let log_file_err = log_file.try_clone()?;

        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err));
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn()?;
        let pid = child
            .id()
            .ok_or_else(|| anyhow::anyhow!("child exited immediately after spawn"))?;

        Ok(Box::new(TokioProcessHandle {
            pid,
            child: Mutex::new(Some(child)),
        }))
    }
}

struct TokioProcessHandle {
    pid: u32,
    child: Mutex<Option<Child>>,
}

#[async_trait]
impl ProcessHandle for TokioProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn stop(&self, timeout: Duration) -> anyhow::Result<()> {
        if let Err(err) = kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
            warn!(pid = self.pid, %err, "SIGTERM failed, process may already be gone");
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.try_wait().await?.is_some() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if let Err(err) = kill(Pid::from_raw(self.pid as i32), Signal::SIGKILL) {
            warn!(pid = self.pid, %err, "SIGKILL failed, process may already be gone");
        }
        Ok(())
    }

    async fn try_wait(&self) -> anyhow::Result<Option<i32>> {
        let mut guard = self.child.lock();
        let Some(child) = guard.as_mut() else {
            return Ok(Some(0));
        };
        match child.try_wait()? {
            Some(status) => Ok(Some(status.code().unwrap_or(-1))),
            None => Ok(None),
        }
    }
}
