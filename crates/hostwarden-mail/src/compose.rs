//! MIME message composition.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use hostwarden_protocols::{Event, Reporter};
use lettre::address::Envelope;
use lettre::message::header::{
    ContentTransferEncoding, ContentType, Header, HeaderName, HeaderValue,
};
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::error::MailError;
use crate::request::MailRequest;
use crate::validate::ValidatedMail;

/// A message ready for the wire.
#[derive(Debug, Clone)]
pub struct ComposedMail {
    /// Envelope sender and the deduplicated `to` list; cc is headers only.
    pub envelope: Envelope,
    pub formatted: Vec<u8>,
}

/// `Date` header with the host's UTC offset; lettre's own is always GMT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDate(String);

impl From<DateTime<Local>> for LocalDate {
    fn from(now: DateTime<Local>) -> Self {
        Self(now.to_rfc2822())
    }
}

impl Header for LocalDate {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Date")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        DateTime::parse_from_rfc2822(s.trim())?;
        Ok(Self(s.trim().to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Build the multipart message for a validated request.
///
/// Reads every inline image and attachment; a file that cannot be read
/// fails the whole send.
pub fn compose(
    request: &MailRequest,
    validated: &ValidatedMail<'_>,
    reporter: &dyn Reporter,
) -> Result<ComposedMail, MailError> {
    let mut builder = Message::builder()
        .from(validated.from.clone())
        .subject(request.subject.trim())
        .header(LocalDate::from(Local::now()));

    for mailbox in &validated.to {
        builder = builder.to(mailbox.clone());
    }

    for raw in &request.cc {
        match raw.trim().parse::<Mailbox>() {
            Ok(mailbox) => builder = builder.cc(mailbox),
            Err(_) => reporter.record(Event::CcSkipped {
                address: raw.clone(),
            }),
        }
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(request.body.clone()));

    for (content_id, path) in &request.inline_images {
        if path.as_os_str().is_empty() {
            continue;
        }
        let content = read_part(path)?;
        let content_type = content_type_for(path, "application/octet-stream")?;
        body = body.singlepart(Attachment::new_inline(content_id.clone()).body(content, content_type));
    }

    for path in &request.attachments {
        let content = read_part(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| MailError::AttachmentUnreadable {
                path: path.clone(),
                reason: "path has no file name".to_string(),
            })?;
        let content_type = parse_content_type("application/octet-stream")?;
        let encoded = Body::new_with_encoding(content, ContentTransferEncoding::Base64)
            .map_err(|_| MailError::Compose(format!("cannot base64-encode {}", path.display())))?;
        body = body.singlepart(Attachment::new(filename).body(encoded, content_type));
    }

    let message = builder
        .multipart(body)
        .map_err(|e| MailError::Compose(e.to_string()))?;

    let recipients = validated.to.iter().map(|m| m.email.clone()).collect();
    let envelope = Envelope::new(Some(validated.from.email.clone()), recipients)
        .map_err(|e| MailError::Compose(e.to_string()))?;

    Ok(ComposedMail {
        envelope,
        formatted: message.formatted(),
    })
}

fn read_part(path: &Path) -> Result<Vec<u8>, MailError> {
    fs::read(path).map_err(|e| MailError::AttachmentUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Image MIME type from the file extension.
fn content_type_for(path: &Path, fallback: &str) -> Result<ContentType, MailError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => fallback,
    };
    parse_content_type(mime)
}

fn parse_content_type(mime: &str) -> Result<ContentType, MailError> {
    ContentType::parse(mime).map_err(|e| MailError::Compose(format!("{}: {}", mime, e)))
}

#[cfg(test)]
#[path = "compose_tests.rs"]
mod tests;
