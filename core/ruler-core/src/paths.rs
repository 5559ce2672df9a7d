//! Filesystem locations shared by the agent and the killer.
//!
//! The state file lives directly in the per-user application-data directory
//! so older installs keep finding it. Everything else we own sits under an
//! `the-ruler/` subdirectory next to it.

use std::env;
use std::path::PathBuf;

use crate::error::{Result, RulerError};

pub const STATE_FILE_NAME: &str = "timelock_state.json";
pub const APP_DIR_NAME: &str = "the-ruler";
pub const GUARD_FILE_NAME: &str = "ruler-agent.lock";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Overrides the application-data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "RULER_DATA_DIR";
/// Overrides the config file path.
pub const CONFIG_ENV: &str = "RULER_CONFIG";

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir().ok_or(RulerError::DataDirNotFound)
}

pub fn state_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(STATE_FILE_NAME))
}

pub fn app_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join(APP_DIR_NAME))
}

pub fn guard_file_path() -> Result<PathBuf> {
    Ok(app_dir()?.join(GUARD_FILE_NAME))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(app_dir()?.join("logs"))
}

/// Config path: `$RULER_CONFIG`, else `<config_dir>/the-ruler/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or(RulerError::DataDirNotFound)?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
