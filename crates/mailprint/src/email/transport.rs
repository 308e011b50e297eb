//! The mailbox seam used by the poll cycle.

use async_trait::async_trait;

use super::error::Result;
use super::parser::ParsedMessage;

/// A message listed in a session. Only meaningful for the session that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub uid: u32,
    pub folder: String,
}

/// Operations the poll cycle needs from a mailbox server.
///
/// A session is opened once per tick and always handed back to
/// [`MailboxTransport::disconnect`], which consumes it.
#[async_trait]
pub trait MailboxTransport: Send + Sync {
    type Session: Send;

    /// Opens an authenticated session.
    async fn connect(&self) -> Result<Self::Session>;

    /// Selects the folder and lists unseen messages in server order.
    async fn list_unread(&self, session: &mut Self::Session) -> Result<Vec<MessageRef>>;

    /// Retrieves and decodes one message.
    async fn fetch(&self, session: &mut Self::Session, message: &MessageRef)
        -> Result<ParsedMessage>;

    /// Flags every message in the folder deleted and expunges.
    async fn purge_all(&self, session: &mut Self::Session) -> Result<()>;

    /// Lists folder names (diagnostics).
    async fn list_folders(&self, session: &mut Self::Session) -> Result<Vec<String>>;

    /// Logs out; failures are swallowed.
    async fn disconnect(&self, session: Self::Session);
}
