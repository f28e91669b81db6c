//! File-backed tracing setup.
//!
//! The terminal is owned by the renderer, so log output only ever goes to the file named by
//! `ASK_TUI_LOG`. Without it no subscriber is installed and the `tracing` macros are no-ops.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::{Error, Result};

pub const DEFAULT_FILTER: &str = "ask_tui=debug";

/// Installs the global subscriber. Returns `Ok(false)` when logging is not configured or a
/// subscriber is already installed.
pub fn init(config: &EnvConfig) -> Result<bool> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let directives = config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let filter = EnvFilter::try_new(directives).map_err(|err| Error::Logging(err.to_string()))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();
    Ok(installed)
}
