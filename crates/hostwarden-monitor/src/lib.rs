//! # Hostwarden Monitor
//!
//! Host metric checks and the monitoring pass.
//!
//! ## Features
//!
//! - CPU, memory and process-liveness checks with inclusive limits
//! - One alert mail per pass listing every failing check
//! - Pluggable probes (`SystemProbe`, `ProcessLister`) for tests

pub mod checks;
pub mod error;
pub mod orchestrator;
pub mod probe;

pub use checks::{Check, CheckContext, CheckResult};
pub use error::MonitorError;
pub use orchestrator::{Monitor, PassOutcome, TEST_MAIL_BODY, render_alert_body};
pub use probe::{CpuSample, HostProbe, MemorySample, ProcessLister, SystemProbe};
