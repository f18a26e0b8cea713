use std::path::PathBuf;

use clap::Parser;

use crate::error::{ConfigError, Result};

/// Fully resolved runtime configuration for the orchestrator daemon.
///
/// Every field is backed by an environment variable with a default; there is
/// no file-based layer and no runtime reload. `Cli::into_config` is the only
/// path that produces one.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: std::net::SocketAddr,
    pub state_root: PathBuf,
    pub db_path: PathBuf,
    pub worktree_root: PathBuf,
    pub tunnel_token: Option<String>,
    pub max_worktrees: usize,
    pub disk_usage_threshold_percent: f64,
    pub log_level: String,
}

impl Config {
    pub fn db_url(&self) -> String {
        format!("sqlite://{}", self.db_path.display())
    }
}

/// Command-line surface. The orchestrator is launched as a single daemon;
/// flags select ports and paths, each falling back to an environment
/// variable and then to a hardcoded default.
#[derive(Debug, Parser)]
#[command(name = "adw-orchestrator", version, about)]
pub struct Cli {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "ADW_HTTP_ADDR", default_value = "127.0.0.1:8787")]
    pub http_addr: String,

    /// Root directory for per-workflow state (one subdirectory per adw_id).
    #[arg(long, env = "ADW_STATE_ROOT", default_value = "./adw_state")]
    pub state_root: PathBuf,

    /// SQLite file backing the workflow history index.
    #[arg(long, env = "ADW_DB_PATH", default_value = "./adw_state/history.sqlite3")]
    pub db_path: PathBuf,

    /// Root directory worktrees are checked out under.
    #[arg(long, env = "ADW_WORKTREE_ROOT", default_value = "./worktrees")]
    pub worktree_root: PathBuf,

    /// Shared secret the tunnel sidecar authenticates inbound webhooks with.
    #[arg(long, env = "ADW_TUNNEL_TOKEN")]
    pub tunnel_token: Option<String>,

    /// Admission ceiling on concurrently checked-out worktrees.
    #[arg(long, env = "ADW_MAX_WORKTREES", default_value_t = 15)]
    pub max_worktrees: usize,

    /// Admission ceiling on disk usage, as a percentage; the Admission
    /// Controller rejects dispatch once usage reaches this value.
    #[arg(long, env = "ADW_DISK_USAGE_THRESHOLD_PERCENT", default_value_t = 95.0)]
    pub disk_usage_threshold_percent: f64,

    /// Tracing filter directive, e.g. `info` or `adw_core=debug,info`.
    #[arg(long, env = "ADW_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let http_addr = self
            .http_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "http_addr",
                value: self.http_addr.clone(),
            })?;

        if self.max_worktrees == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_worktrees",
            });
        }

        if !(0.0..=100.0).contains(&self.disk_usage_threshold_percent) {
            return Err(ConfigError::InvalidValue {
                field: "disk_usage_threshold_percent",
                value: self.disk_usage_threshold_percent.to_string(),
            });
        }

        Ok(Config {
            http_addr,
            state_root: self.state_root,
            db_path: self.db_path,
            worktree_root: self.worktree_root,
            tunnel_token: self.tunnel_token,
            max_worktrees: self.max_worktrees,
            disk_usage_threshold_percent: self.disk_usage_threshold_percent,
            log_level: self.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Cli {
        Cli {
            http_addr: "127.0.0.1:8787".into(),
            state_root: "./adw_state".into(),
            db_path: "./adw_state/history.sqlite3".into(),
            worktree_root: "./worktrees".into(),
            tunnel_token: None,
            max_worktrees: 15,
            disk_usage_threshold_percent: 95.0,
            log_level: "info".into(),
        }
    }

    #[test]
    fn defaults_resolve_into_a_valid_config() {
        let config = base().into_config().expect("defaults should be valid");
        assert_eq!(config.max_worktrees, 15);
        assert_eq!(config.db_url(), "sqlite://./adw_state/history.sqlite3");
    }

    #[test]
    fn rejects_zero_worktree_ceiling() {
        let mut cli = base();
        cli.max_worktrees = 0;
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn rejects_out_of_range_disk_threshold() {
        let mut cli = base();
        cli.disk_usage_threshold_percent = 150.0;
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn rejects_unparseable_addr() {
        let mut cli = base();
        cli.http_addr = "not-an-addr".into();
        assert!(cli.into_config().is_err());
    }
}
