//! Schedule errors.

use std::path::PathBuf;

use thiserror::Error;

/// Schedule error types.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The five fields do not form a legal crontab expression.
    #[error("Invalid schedule expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The crontab file could not be read or written.
    #[error("Cannot update {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scheduler service could not be restarted.
    #[error("Failed to restart {service}: {reason}")]
    ServiceRestart { service: String, reason: String },
}
