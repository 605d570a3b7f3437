//! # Hostwarden Protocols
//!
//! Capabilities shared by every hostwarden crate. Contains the reporting
//! interface that replaces a process-wide logger: components receive a
//! [`Reporter`] and record typed [`Event`]s through it.

pub mod reporter;

pub use reporter::{Event, RecordingReporter, Reporter, Severity, TracingReporter};
