//! Mail outcome taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Status code of a successful send.
pub const STATUS_SENT: i32 = 1;

/// Every way a send can fail.
///
/// Variants up to [`MailError::ContentWrongType`] are validation failures,
/// detected before any file or network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("mail server configuration is missing")]
    ServerMissing,

    #[error("mail server host is empty")]
    HostMissing,

    #[error("mail server username is empty")]
    UsernameMissing,

    #[error("mail server password is empty")]
    PasswordMissing,

    #[error("subject is empty")]
    SubjectMissing,

    #[error("subject must be a single line of text")]
    SubjectWrongType,

    #[error("sender address is empty")]
    FromMissing,

    #[error("sender {0:?} is not a valid mailbox")]
    FromWrongType(String),

    #[error("recipient list is empty")]
    ToMissing,

    #[error("recipient {0:?} is not a valid mailbox")]
    ToWrongType(String),

    #[error("mail content is empty")]
    ContentMissing,

    #[error("mail content contains characters that cannot be sent as text/html")]
    ContentWrongType,

    #[error("cannot read {}: {reason}", path.display())]
    AttachmentUnreadable { path: PathBuf, reason: String },

    #[error("cannot assemble message: {0}")]
    Compose(String),

    #[error("no greeting from {host}: {reason}")]
    GreetingFailed { host: String, reason: String },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("server refused the sender: {0}")]
    SenderRefused(String),

    #[error("server rejected all recipients: {0}")]
    AllRecipientsRejected(String),

    #[error("unexpected server reply: {0}")]
    UnexpectedReply(String),
}

impl MailError {
    /// Stable numeric status for logs and exit codes.
    pub fn code(&self) -> i32 {
        match self {
            MailError::Compose(_) => -1,
            MailError::ServerMissing => 2,
            MailError::HostMissing => 3,
            MailError::UsernameMissing => 4,
            MailError::PasswordMissing => 5,
            MailError::SubjectMissing => 6,
            MailError::SubjectWrongType => 7,
            MailError::FromMissing => 8,
            MailError::FromWrongType(_) => 9,
            MailError::ToMissing => 10,
            MailError::ToWrongType(_) => 11,
            MailError::ContentMissing => 12,
            MailError::ContentWrongType => 13,
            MailError::GreetingFailed { .. } => 14,
            MailError::AllRecipientsRejected(_) => 15,
            MailError::SenderRefused(_) => 16,
            MailError::UnexpectedReply(_) => 17,
            MailError::AttachmentUnreadable { .. } => 18,
            MailError::AuthenticationFailed(_) => 19,
        }
    }

    /// True when the request was refused before any I/O.
    pub fn is_validation(&self) -> bool {
        (2..=13).contains(&self.code())
    }
}

/// Numeric status of a send result.
pub fn status_code(result: &Result<(), MailError>) -> i32 {
    match result {
        Ok(()) => STATUS_SENT,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_variants() -> Vec<MailError> {
        vec![
            MailError::ServerMissing,
            MailError::HostMissing,
            MailError::UsernameMissing,
            MailError::PasswordMissing,
            MailError::SubjectMissing,
            MailError::SubjectWrongType,
            MailError::FromMissing,
            MailError::FromWrongType("x".to_string()),
            MailError::ToMissing,
            MailError::ToWrongType("x".to_string()),
            MailError::ContentMissing,
            MailError::ContentWrongType,
            MailError::AttachmentUnreadable {
                path: PathBuf::from("/tmp/a.png"),
                reason: "gone".to_string(),
            },
            MailError::Compose("x".to_string()),
            MailError::GreetingFailed {
                host: "h".to_string(),
                reason: "r".to_string(),
            },
            MailError::AuthenticationFailed("x".to_string()),
            MailError::SenderRefused("x".to_string()),
            MailError::AllRecipientsRejected("x".to_string()),
            MailError::UnexpectedReply("x".to_string()),
        ]
    }

    #[test]
    fn test_codes_are_distinct_and_not_success() {
        let codes: Vec<i32> = all_variants().iter().map(|e| e.code()).collect();
        let unique: HashSet<i32> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        assert!(!unique.contains(&STATUS_SENT));
    }

    #[test]
    fn test_validation_partition() {
        let validation: Vec<_> = all_variants()
            .into_iter()
            .filter(|e| e.is_validation())
            .collect();
        assert_eq!(validation.len(), 12);
        assert!(!MailError::GreetingFailed {
            host: "h".to_string(),
            reason: "r".to_string(),
        }
        .is_validation());
    }

    #[test]
    fn test_status_code() {
        assert_eq!(status_code(&Ok(())), 1);
        assert_eq!(status_code(&Err(MailError::HostMissing)), 3);
        assert_eq!(status_code(&Err(MailError::SenderRefused("no".to_string()))), 16);
    }

    #[test]
    fn test_display_mentions_path() {
        let err = MailError::AttachmentUnreadable {
            path: PathBuf::from("/var/report.pdf"),
            reason: "No such file or directory".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("/var/report.pdf"));
        assert!(text.contains("No such file"));
    }
}
