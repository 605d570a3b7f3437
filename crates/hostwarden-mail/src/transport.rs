//! SMTP delivery.

use std::time::Duration;

use hostwarden_protocols::{Event, Reporter};
use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Data, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use tracing::{debug, warn};

use crate::error::MailError;
use crate::request::MailServerConfig;

/// Port used when the server section leaves it empty.
pub const DEFAULT_SMTPS_PORT: u16 = 465;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers a composed message to a mail server.
pub trait MailTransport: Send + Sync {
    /// Run one SMTP session for `envelope`.
    ///
    /// Recipients refused individually are reported through `reporter`;
    /// the send only fails when none are accepted.
    fn deliver(
        &self,
        server: &MailServerConfig,
        envelope: &Envelope,
        message: &[u8],
        reporter: &dyn Reporter,
    ) -> Result<(), MailError>;
}

/// Implicit-TLS SMTP (SMTPS) with PLAIN or LOGIN authentication.
#[derive(Debug, Clone)]
pub struct SmtpsTransport {
    timeout: Duration,
}

impl SmtpsTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SmtpsTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// The steps of one SMTP conversation. Errors carry the server's reply.
trait SmtpSteps {
    fn auth(&mut self, credentials: &Credentials) -> Result<(), String>;
    fn mail_from(&mut self, sender: Option<Address>) -> Result<(), String>;
    fn rcpt_to(&mut self, recipient: &Address) -> Result<(), String>;
    /// `DATA` followed by the message itself.
    fn data(&mut self, message: &[u8]) -> Result<(), String>;
    fn quit(&mut self) -> Result<(), String>;
    fn abort(&mut self);
}

impl SmtpSteps for SmtpConnection {
    fn auth(&mut self, credentials: &Credentials) -> Result<(), String> {
        SmtpConnection::auth(self, &[Mechanism::Plain, Mechanism::Login], credentials)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn mail_from(&mut self, sender: Option<Address>) -> Result<(), String> {
        self.command(Mail::new(sender, vec![]))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn rcpt_to(&mut self, recipient: &Address) -> Result<(), String> {
        self.command(Rcpt::new(recipient.clone(), vec![]))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn data(&mut self, message: &[u8]) -> Result<(), String> {
        self.command(Data).map_err(|e| e.to_string())?;
        self.message(message).map(|_| ()).map_err(|e| e.to_string())
    }

    fn quit(&mut self) -> Result<(), String> {
        SmtpConnection::quit(self).map(|_| ()).map_err(|e| e.to_string())
    }

    fn abort(&mut self) {
        SmtpConnection::abort(self);
    }
}

/// Closes the connection when dropped, politely if the server still listens.
struct Session<C: SmtpSteps>(C);

impl<C: SmtpSteps> Drop for Session<C> {
    fn drop(&mut self) {
        if self.0.quit().is_err() {
            self.0.abort();
        }
    }
}

impl MailTransport for SmtpsTransport {
    fn deliver(
        &self,
        server: &MailServerConfig,
        envelope: &Envelope,
        message: &[u8],
        reporter: &dyn Reporter,
    ) -> Result<(), MailError> {
        let host = server.host.trim();
        let port = parse_port(host, &server.port)?;
        let greeting_failed = |reason: String| MailError::GreetingFailed {
            host: host.to_string(),
            reason,
        };

        let tls = TlsParameters::new(host.to_string()).map_err(|e| greeting_failed(e.to_string()))?;
        debug!("Connecting to {}:{}", host, port);
        let connection = SmtpConnection::connect(
            (host, port),
            Some(self.timeout),
            &ClientId::default(),
            Some(&tls),
            None,
        )
        .map_err(|e| greeting_failed(e.to_string()))?;

        let accepted = converse(Session(connection), server, envelope, message, reporter)?;
        debug!("Message accepted by {} for {} recipient(s)", host, accepted);
        Ok(())
    }
}

/// Authenticate and send once the greeting is done. Returns the number of
/// accepted recipients; the session is closed on every path.
fn converse<C: SmtpSteps>(
    mut session: Session<C>,
    server: &MailServerConfig,
    envelope: &Envelope,
    message: &[u8],
    reporter: &dyn Reporter,
) -> Result<usize, MailError> {
    let credentials = Credentials::new(server.username.clone(), server.password.clone());
    session
        .0
        .auth(&credentials)
        .map_err(MailError::AuthenticationFailed)?;
    debug!("Authenticated as {}", server.username);

    session
        .0
        .mail_from(envelope.from().cloned())
        .map_err(MailError::SenderRefused)?;

    let mut accepted = 0usize;
    let mut last_refusal = String::new();
    for address in envelope.to() {
        match session.0.rcpt_to(address) {
            Ok(()) => accepted += 1,
            Err(reason) => {
                warn!("Recipient {} refused: {}", address, reason);
                reporter.record(Event::RecipientRefused {
                    address: address.to_string(),
                    reason: reason.clone(),
                });
                last_refusal = reason;
            }
        }
    }
    if accepted == 0 {
        return Err(MailError::AllRecipientsRejected(last_refusal));
    }

    session.0.data(message).map_err(MailError::UnexpectedReply)?;
    Ok(accepted)
}

/// Empty means [`DEFAULT_SMTPS_PORT`]; anything else must be a TCP port.
fn parse_port(host: &str, port: &str) -> Result<u16, MailError> {
    let port = port.trim();
    if port.is_empty() {
        return Ok(DEFAULT_SMTPS_PORT);
    }
    port.parse::<u16>().map_err(|_| MailError::GreetingFailed {
        host: host.to_string(),
        reason: format!("invalid port '{}'", port),
    })
}
