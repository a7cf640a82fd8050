use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub const WORKSPACE_VAR: &str = "CAMPUSD_WORKSPACE";
pub const LOG_VAR: &str = "CAMPUSD_LOG";

/// Startup settings read from the environment. Everything is optional; the sidecar
/// can run with none of it set and wait for `workspace.select`.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub workspace: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        let workspace = match env::var(WORKSPACE_VAR) {
            Ok(v) if !v.trim().is_empty() => {
                info!("{WORKSPACE_VAR} set, opening {v} at startup");
                Some(PathBuf::from(v.trim()))
            }
            Ok(_) => {
                warn!("{WORKSPACE_VAR} is blank, ignoring");
                None
            }
            Err(_) => None,
        };
        Self { workspace }
    }
}

/// Log filter: `CAMPUSD_LOG`, then `RUST_LOG`, then `info`.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
