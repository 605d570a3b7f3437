//! Monitor errors.

use hostwarden_config::ConfigError;
use thiserror::Error;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The configuration cannot drive a monitoring pass.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failed to collect metrics.
    #[error("Failed to collect {metric} metrics: {reason}")]
    MetricsCollection { metric: &'static str, reason: String },
}

impl MonitorError {
    pub(crate) fn collection(metric: &'static str, reason: impl Into<String>) -> Self {
        MonitorError::MetricsCollection {
            metric,
            reason: reason.into(),
        }
    }
}
