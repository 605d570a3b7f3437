//! # Hostwarden Mail
//!
//! Sends one alert mail per call over an implicit-TLS SMTP connection.
//!
//! ## Flow
//!
//! 1. [`validate_request`] checks the request field by field, before any I/O,
//!    and stops at the first problem.
//! 2. [`compose`] builds a `multipart/mixed` message: HTML body, inline
//!    images, base64 attachments.
//! 3. A [`MailTransport`] delivers it; [`SmtpsTransport`] is the real one.
//!
//! Every outcome is a [`MailError`] with a stable numeric [`MailError::code`],
//! or `Ok(())` for [`STATUS_SENT`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hostwarden_mail::{MailRequest, Mailer};
//! use hostwarden_protocols::TracingReporter;
//!
//! let mailer = Mailer::smtps(Arc::new(TracingReporter));
//! let request = MailRequest::new(Some(server), "me@example.com", to, "subject", "<p>body</p>");
//! let status = mailer.send_instant_mail(&request);
//! ```

mod compose;
mod error;
mod mailer;
mod request;
mod transport;
mod validate;

pub use compose::{ComposedMail, compose};
pub use error::{MailError, STATUS_SENT, status_code};
pub use mailer::Mailer;
pub use request::{MailRequest, MailServerConfig};
pub use transport::{DEFAULT_SMTPS_PORT, MailTransport, SmtpsTransport};
pub use validate::{ValidatedMail, validate_request};

pub use lettre::address::Envelope;
