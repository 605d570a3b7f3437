//! Event reporting capability.

use std::fmt;
use std::sync::Mutex;

use tracing::{error, info, warn};

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something the operator should look at.
    Warning,
    /// An operation failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Something that happened during a monitoring pass, a mail send or a
/// schedule change.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A check stayed under its limit.
    CheckPassed { check: String },
    /// A check breached its limit.
    CheckFailed { check: String, message: String },
    /// A check ran but its configuration looks wrong.
    CheckWarning { check: String, detail: String },
    /// Every check passed, no alert is sent.
    AlertSkipped,
    /// An alert for `failures` failing checks is about to be sent.
    AlertDispatched { failures: usize },
    /// A mail request was refused before any network I/O.
    MailInvalid { status: i32, reason: String },
    /// A cc entry could not be parsed and was left out of the headers.
    CcSkipped { address: String },
    /// The server refused one envelope recipient.
    RecipientRefused { address: String, reason: String },
    /// A mail was accepted by the server.
    MailSent { recipients: usize },
    /// Delivery failed after validation passed.
    MailFailed { status: i32, reason: String },
    /// A schedule line was written to the job table.
    ScheduleRegistered { line: String },
    /// Schedule lines matching `pattern` were removed.
    ScheduleRemoved { pattern: String, removed: usize },
}

impl Event {
    /// Severity used when the event is logged.
    pub fn severity(&self) -> Severity {
        match self {
            Event::CheckPassed { .. }
            | Event::AlertSkipped
            | Event::AlertDispatched { .. }
            | Event::MailSent { .. }
            | Event::ScheduleRegistered { .. }
            | Event::ScheduleRemoved { .. } => Severity::Info,
            Event::CheckFailed { .. }
            | Event::CheckWarning { .. }
            | Event::CcSkipped { .. }
            | Event::RecipientRefused { .. } => Severity::Warning,
            Event::MailInvalid { .. } | Event::MailFailed { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CheckPassed { check } => write!(f, "check {} passed", check),
            Event::CheckFailed { check, message } => {
                write!(f, "check {} failed: {}", check, message.replace('\n', "; "))
            }
            Event::CheckWarning { check, detail } => write!(f, "check {}: {}", check, detail),
            Event::AlertSkipped => write!(f, "all checks passed, no alert sent"),
            Event::AlertDispatched { failures } => {
                write!(f, "send warning email for {} failing check(s)", failures)
            }
            Event::MailInvalid { status, reason } => {
                write!(f, "mail rejected before sending (status {}): {}", status, reason)
            }
            Event::CcSkipped { address } => write!(f, "skipping unparsable cc address {:?}", address),
            Event::RecipientRefused { address, reason } => {
                write!(f, "server refused recipient {}: {}", address, reason)
            }
            Event::MailSent { recipients } => write!(f, "mail sent to {} recipient(s)", recipients),
            Event::MailFailed { status, reason } => {
                write!(f, "mail delivery failed (status {}): {}", status, reason)
            }
            Event::ScheduleRegistered { line } => write!(f, "registered schedule: {}", line),
            Event::ScheduleRemoved { pattern, removed } => {
                write!(f, "removed {} schedule line(s) matching {:?}", removed, pattern)
            }
        }
    }
}

/// Sink for [`Event`]s, passed explicitly to every component that reports.
pub trait Reporter: Send + Sync {
    /// Record one event.
    fn record(&self, event: Event);
}

/// Reporter that writes events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, event: Event) {
        match event.severity() {
            Severity::Info => info!("{}", event),
            Severity::Warning => warn!("{}", event),
            Severity::Error => error!("{}", event),
        }
    }
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
