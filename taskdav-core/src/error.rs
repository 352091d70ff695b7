//! Error types for taskdav.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while reconciling the two task stores.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Taskwarrior error: {0}")]
    Local(String),

    #[error("CalDAV error: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("{0} is not supported on a projected task")]
    Unsupported(&'static str),

    #[error("Created task {key} but could not link it back: {source}")]
    LinkWriteBack {
        key: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Task {key} still differs after update (local {local}, remote {remote})")]
    Diverged {
        key: String,
        local: String,
        remote: String,
    },
}

/// Coarse grouping of [`SyncError`] used when logging per-action failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Adapter,
    Invariant,
    Unsupported,
    Verification,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Adapter => "adapter",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Unsupported => "unsupported",
            ErrorCategory::Verification => "verification",
        };
        f.write_str(label)
    }
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Config(_) => ErrorCategory::Config,
            SyncError::Invariant(_) => ErrorCategory::Invariant,
            SyncError::Unsupported(_) => ErrorCategory::Unsupported,
            SyncError::LinkWriteBack { .. } | SyncError::Diverged { .. } => {
                ErrorCategory::Verification
            }
            SyncError::Local(_)
            | SyncError::Remote(_)
            | SyncError::Http(_)
            | SyncError::Io(_)
            | SyncError::Parse(_)
            | SyncError::NotFound(_) => ErrorCategory::Adapter,
        }
    }
}

/// Result type alias for taskdav operations.
pub type SyncResult<T> = Result<T, SyncError>;
