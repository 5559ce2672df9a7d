//! Logging setup shared by both binaries.
//!
//! Logs go to `<data_dir>/the-ruler/logs/<name>.log`. If that directory can't
//! be created we fall back to stderr rather than running blind.
//!
//! `RULER_DEBUG_LOG=1` forces debug level; otherwise `RUST_LOG` applies,
//! defaulting to `info`.

use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_ENV: &str = "RULER_DEBUG_LOG";

/// Installs the global subscriber. Keep the returned guard alive for the
/// life of the process so buffered lines are flushed.
pub fn init(name: &str) -> Option<WorkerGuard> {
    let filter = env_filter();

    let log_dir = match crate::paths::log_dir() {
        Ok(dir) => dir,
        Err(err) => {
            init_stderr(filter);
            tracing::warn!(error = %err, "Failed to resolve log directory; logging to stderr");
            return None;
        }
    };

    if let Err(err) = fs_err::create_dir_all(&log_dir) {
        init_stderr(filter);
        tracing::warn!(error = %err, "Failed to create log directory; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::never(&log_dir, format!("{}.log", name));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}

fn init_stderr(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
