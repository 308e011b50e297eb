//! Read-only inventory of what the configured servers offer. Used to find
//! the right queue and folder names when writing a config.

use tracing::{info, warn};

use crate::email::MailboxTransport;
use crate::print::{PrintDispatcher, PrintService};

/// Queues and folders, or the reason each could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub queues: Result<Vec<String>, String>,
    pub folders: Result<Vec<String>, String>,
}

/// Queries both servers independently; a failure on one side does not hide
/// the other. Never flags, deletes or prints anything.
pub async fn collect<M, P>(mailbox: &M, dispatcher: &PrintDispatcher<P>) -> Inventory
where
    M: MailboxTransport,
    P: PrintService,
{
    let queues = dispatcher.queues().await.map_err(|e| {
        warn!("Could not list print queues: {}", e);
        e.to_string()
    });

    let folders = list_folders(mailbox).await;

    if let (Ok(queues), Ok(folders)) = (&queues, &folders) {
        info!(queues = queues.len(), folders = folders.len(), "Inventory collected");
    }

    Inventory { queues, folders }
}

async fn list_folders<M: MailboxTransport>(mailbox: &M) -> Result<Vec<String>, String> {
    let mut session = mailbox.connect().await.map_err(|e| {
        warn!("Could not connect to mailbox: {}", e);
        e.to_string()
    })?;

    let result = mailbox.list_folders(&mut session).await.map_err(|e| {
        warn!("Could not list folders: {}", e);
        e.to_string()
    });

    mailbox.disconnect(session).await;
    result
}

impl Inventory {
    /// Human-readable listing for the `list` command.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_section(&mut out, "Print queues", &self.queues);
        out.push('\n');
        render_section(&mut out, "Mail folders", &self.folders);
        out
    }
}

fn render_section(out: &mut String, title: &str, entries: &Result<Vec<String>, String>) {
    out.push_str(title);
    out.push_str(":\n");
    match entries {
        Ok(names) if names.is_empty() => out.push_str("  (none)\n"),
        Ok(names) => {
            for name in names {
                out.push_str("  ");
                out.push_str(name);
                out.push('\n');
            }
        }
        Err(reason) => {
            out.push_str("  unavailable: ");
            out.push_str(reason);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_entries_and_errors() {
        let inventory = Inventory {
            queues: Ok(vec!["Office".to_string(), "Lab".to_string()]),
            folders: Err("connection refused".to_string()),
        };

        let text = inventory.render();
        assert!(text.contains("Print queues:\n  Office\n  Lab\n"));
        assert!(text.contains("Mail folders:\n  unavailable: connection refused\n"));
    }

    #[test]
    fn test_render_empty_section() {
        let inventory = Inventory {
            queues: Ok(Vec::new()),
            folders: Ok(vec!["INBOX".to_string()]),
        };

        let text = inventory.render();
        assert!(text.contains("Print queues:\n  (none)\n"));
        assert!(text.contains("  INBOX\n"));
    }
}
