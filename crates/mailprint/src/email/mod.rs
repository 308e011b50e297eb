//! Mailbox access: the transport seam, its IMAP implementation, and message
//! decoding.

pub mod client;
pub mod error;
pub mod parser;
pub mod transport;

pub use client::{ImapClient, ImapSession};
pub use error::MailboxError;
pub use parser::{extract_first_attachment, ExtractedAttachment, MessagePart, ParsedMessage};
pub use transport::{MailboxTransport, MessageRef};
