//! Error types for ruler-core operations.

use std::path::PathBuf;

/// All errors that can occur in ruler-core operations.
///
/// Most of these never reach the user: the agent logs them and carries on
/// with its in-memory state. Only [`RulerError::AlreadyRunning`] and
/// [`RulerError::IncorrectPassword`] are surfaced by the binaries.
#[derive(Debug, thiserror::Error)]
pub enum RulerError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Application data directory not found")]
    DataDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Agent Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Another instance is already running{}", holder_suffix(.holder))]
    AlreadyRunning { holder: Option<u32> },

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Prompt unavailable: {0}")]
    PromptUnavailable(String),
}

fn holder_suffix(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {})", pid)).unwrap_or_default()
}

impl RulerError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RulerError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using RulerError.
pub type Result<T> = std::result::Result<T, RulerError>;

impl From<RulerError> for String {
    fn from(err: RulerError) -> String {
        err.to_string()
    }
}
