mod error;
mod loader;
mod models;

pub use error::{ConfigError, Result};
pub use loader::{ensure_directories, load, load_from};
pub use models::{Cli, Config};
