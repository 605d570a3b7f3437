//! Mail request types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// SMTP server and login used for one send.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MailServerConfig {
    pub host: String,
    /// Empty means the SMTPS default port.
    pub port: String,
    pub from_address: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for MailServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from_address", &self.from_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to send one mail.
#[derive(Debug, Clone, Default)]
pub struct MailRequest {
    pub server: Option<MailServerConfig>,
    pub from: String,
    /// Duplicates are dropped when the message is composed.
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// Content-ID to image file, referenced from the body as `cid:<id>`.
    pub inline_images: BTreeMap<String, PathBuf>,
    pub attachments: Vec<PathBuf>,
}

impl MailRequest {
    pub fn new(
        server: Option<MailServerConfig>,
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            server,
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_inline_image(mut self, content_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.inline_images.insert(content_id.into(), path.into());
        self
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }
}
