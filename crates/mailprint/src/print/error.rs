//! Print service error types.

use thiserror::Error;

/// Failures of the print service itself. Routine rejections (unknown queue,
/// wrong file type) are [`super::PrintOutcome`] values instead.
#[derive(Error, Debug)]
pub enum PrintError {
    /// The client tool could not be started at all.
    #[error("Print client '{program}' unavailable: {source}")]
    ServiceUnavailable {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The print server could not be reached.
    #[error("Print server connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered but refused the request.
    #[error("'{program}' failed: {message}")]
    CommandFailed {
        program: &'static str,
        message: String,
    },

    /// Operation timed out.
    #[error("Print operation timed out: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, PrintError>;
