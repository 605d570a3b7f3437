//! One-shot mail sending.

use std::sync::Arc;

use hostwarden_protocols::{Event, Reporter};
use tracing::info;

use crate::compose::compose;
use crate::error::MailError;
use crate::request::MailRequest;
use crate::transport::{MailTransport, SmtpsTransport};
use crate::validate::validate_request;

/// Validates, composes and delivers mail through a [`MailTransport`].
pub struct Mailer<T: MailTransport = SmtpsTransport> {
    transport: T,
    reporter: Arc<dyn Reporter>,
}

impl Mailer<SmtpsTransport> {
    /// Mailer backed by the real SMTPS transport.
    pub fn smtps(reporter: Arc<dyn Reporter>) -> Self {
        Self::new(SmtpsTransport::default(), reporter)
    }
}

impl<T: MailTransport> Mailer<T> {
    pub fn new(transport: T, reporter: Arc<dyn Reporter>) -> Self {
        Self { transport, reporter }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` now, in a single SMTP session.
    ///
    /// Validation failures never reach the transport. Every outcome is
    /// recorded on the reporter.
    pub fn send_instant_mail(&self, request: &MailRequest) -> Result<(), MailError> {
        let result = self.try_send(request);
        match &result {
            Ok(recipients) => {
                info!("Mail '{}' sent to {} recipient(s)", request.subject.trim(), recipients);
                self.reporter.record(Event::MailSent {
                    recipients: *recipients,
                });
            }
            Err(e) if e.is_validation() => self.reporter.record(Event::MailInvalid {
                status: e.code(),
                reason: e.to_string(),
            }),
            Err(e) => self.reporter.record(Event::MailFailed {
                status: e.code(),
                reason: e.to_string(),
            }),
        }
        result.map(|_| ())
    }

    fn try_send(&self, request: &MailRequest) -> Result<usize, MailError> {
        let validated = validate_request(request)?;
        let composed = compose(request, &validated, self.reporter.as_ref())?;
        self.transport.deliver(
            validated.server,
            &composed.envelope,
            &composed.formatted,
            self.reporter.as_ref(),
        )?;
        Ok(composed.envelope.to().len())
    }
}

#[cfg(test)]
#[path = "mailer_tests.rs"]
mod tests;
