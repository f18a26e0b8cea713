use std::path::Path;

use clap::Parser;

use crate::error::Result;
use crate::models::{Cli, Config};

/// Loads `.env` (if present) then parses CLI flags / environment into a
/// [`Config`]. Mirrors the teacher's `dotenvy` + `clap` combination, minus
/// the TOML file layer: this daemon's surface is env vars and flags only.
pub fn load() -> Result<Config> {
    load_from(std::env::args_os())
}

/// Test/embedding entry point: parse an explicit argument list instead of
/// `std::env::args_os`, after loading `.env` from the current directory.
pub fn load_from<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    load_dotenv();
    Cli::parse_from(args).into_config()
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(dotenvy::Error::Io(_)) => {}
        Err(err) => tracing::warn!(%err, "failed to parse .env file"),
    }
}

/// Ensures the directories a [`Config`] points at exist, creating them if
/// needed. Called once at startup, before the state store or indexer touch
/// the filesystem.
pub fn ensure_directories(config: &Config) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.state_root)?;
    std::fs::create_dir_all(&config.worktree_root)?;
    if let Some(parent) = Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
