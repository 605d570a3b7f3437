//! Request validation, run before any I/O.

use std::collections::HashSet;

use lettre::message::Mailbox;

use crate::error::MailError;
use crate::request::{MailRequest, MailServerConfig};

/// A request that passed validation, with its addresses parsed.
#[derive(Debug, Clone)]
pub struct ValidatedMail<'a> {
    pub server: &'a MailServerConfig,
    pub from: Mailbox,
    /// Deduplicated, first occurrence wins.
    pub to: Vec<Mailbox>,
}

/// Check the request in a fixed order: server, subject, from, to, content.
/// The first failing field decides the error.
pub fn validate_request(request: &MailRequest) -> Result<ValidatedMail<'_>, MailError> {
    let server = validate_server(request.server.as_ref())?;
    validate_subject(&request.subject)?;
    let from = validate_from(&request.from)?;
    let to = validate_to(&request.to)?;
    validate_content(&request.body)?;

    Ok(ValidatedMail { server, from, to })
}

fn validate_server(server: Option<&MailServerConfig>) -> Result<&MailServerConfig, MailError> {
    let server = server.ok_or(MailError::ServerMissing)?;
    if server.host.trim().is_empty() {
        return Err(MailError::HostMissing);
    }
    if server.username.is_empty() {
        return Err(MailError::UsernameMissing);
    }
    if server.password.is_empty() {
        return Err(MailError::PasswordMissing);
    }
    Ok(server)
}

fn validate_subject(subject: &str) -> Result<(), MailError> {
    if subject.trim().is_empty() {
        return Err(MailError::SubjectMissing);
    }
    // Header text: one line, tabs allowed.
    if subject.chars().any(|c| c.is_control() && c != '\t') {
        return Err(MailError::SubjectWrongType);
    }
    Ok(())
}

fn validate_from(from: &str) -> Result<Mailbox, MailError> {
    let from = from.trim();
    if from.is_empty() {
        return Err(MailError::FromMissing);
    }
    from.parse::<Mailbox>()
        .map_err(|_| MailError::FromWrongType(from.to_string()))
}

fn validate_to(to: &[String]) -> Result<Vec<Mailbox>, MailError> {
    if to.is_empty() {
        return Err(MailError::ToMissing);
    }

    let mut seen = HashSet::new();
    let mut mailboxes = Vec::with_capacity(to.len());
    for raw in to {
        let raw = raw.trim();
        let mailbox = raw
            .parse::<Mailbox>()
            .map_err(|_| MailError::ToWrongType(raw.to_string()))?;
        if seen.insert(mailbox.email.clone()) {
            mailboxes.push(mailbox);
        }
    }
    Ok(mailboxes)
}

fn validate_content(body: &str) -> Result<(), MailError> {
    if body.trim().is_empty() {
        return Err(MailError::ContentMissing);
    }
    if body.contains('\0') {
        return Err(MailError::ContentWrongType);
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
