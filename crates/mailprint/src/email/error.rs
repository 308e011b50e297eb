use thiserror::Error;

/// Failures talking to the mailbox. Within a tick, `FetchFailed` and
/// `ParseError` skip one message; the rest end the tick's mailbox work.
#[derive(Error, Debug)]
pub enum MailboxError {
    #[error("cannot reach mail server: {0}")]
    ConnectionFailed(String),

    #[error("TLS handshake failed: {0}")]
    TlsError(String),

    #[error("login rejected: {0}")]
    AuthenticationFailed(String),

    #[error("unexpected IMAP response: {0}")]
    ProtocolError(String),

    #[error("folder '{0}' does not exist")]
    FolderNotFound(String),

    #[error("cannot fetch message UID {uid}: {reason}")]
    FetchFailed { uid: u32, reason: String },

    #[error("undecodable message: {0}")]
    ParseError(String),

    #[error("mail server timed out: {0}")]
    Timeout(String),
}

impl From<async_native_tls::Error> for MailboxError {
    fn from(err: async_native_tls::Error) -> Self {
        MailboxError::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for MailboxError {
    fn from(err: async_imap::error::Error) -> Self {
        match err {
            async_imap::error::Error::Io(e) => MailboxError::ConnectionFailed(e.to_string()),
            other => MailboxError::ProtocolError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MailboxError>;
