//! In-memory mailbox and print server.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mailprint::email::{MailboxError, MailboxTransport, MessageRef, ParsedMessage};
use mailprint::print::{PrintError, PrintJob, PrintService};

/// A stored message. `message: None` makes every fetch of it fail.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub uid: u32,
    pub seen: bool,
    pub message: Option<ParsedMessage>,
}

/// Calls observed by [`FakeMailbox`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxCall {
    Connect,
    ListUnread,
    Fetch(u32),
    PurgeAll,
    ListFolders,
    Disconnect,
}

#[derive(Debug, Default)]
struct MailboxState {
    messages: Vec<StoredMessage>,
    calls: Vec<MailboxCall>,
    refuse_connect: bool,
    fail_purge: bool,
    panic_on_list: bool,
}

/// Mailbox holding messages in memory. Clones share state so a test can
/// keep a handle after moving one into a cycle.
#[derive(Debug, Clone, Default)]
pub struct FakeMailbox {
    state: Arc<Mutex<MailboxState>>,
}

pub struct FakeSession;

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(self, uid: u32, message: ParsedMessage) -> Self {
        self.push(StoredMessage {
            uid,
            seen: false,
            message: Some(message),
        })
    }

    pub fn with_seen_message(self, uid: u32, message: ParsedMessage) -> Self {
        self.push(StoredMessage {
            uid,
            seen: true,
            message: Some(message),
        })
    }

    pub fn with_broken_message(self, uid: u32) -> Self {
        self.push(StoredMessage {
            uid,
            seen: false,
            message: None,
        })
    }

    pub fn refusing_connections(self) -> Self {
        self.state.lock().unwrap().refuse_connect = true;
        self
    }

    pub fn failing_purge(self) -> Self {
        self.state.lock().unwrap().fail_purge = true;
        self
    }

    pub fn panicking_on_list(self) -> Self {
        self.state.lock().unwrap().panic_on_list = true;
        self
    }

    fn push(self, message: StoredMessage) -> Self {
        self.state.lock().unwrap().messages.push(message);
        self
    }

    pub fn calls(&self) -> Vec<MailboxCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fetched(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MailboxCall::Fetch(uid) => Some(uid),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &MailboxCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn unseen(&self) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .filter(|m| !m.seen)
            .map(|m| m.uid)
            .collect()
    }

    fn record(&self, call: MailboxCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MailboxTransport for FakeMailbox {
    type Session = FakeSession;

    async fn connect(&self) -> Result<FakeSession, MailboxError> {
        self.record(MailboxCall::Connect);
        if self.state.lock().unwrap().refuse_connect {
            return Err(MailboxError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        Ok(FakeSession)
    }

    async fn list_unread(&self, _session: &mut FakeSession) -> Result<Vec<MessageRef>, MailboxError> {
        self.record(MailboxCall::ListUnread);
        let state = self.state.lock().unwrap();
        if state.panic_on_list {
            drop(state);
            panic!("mailbox exploded");
        }
        Ok(state
            .messages
            .iter()
            .filter(|m| !m.seen)
            .map(|m| MessageRef {
                uid: m.uid,
                folder: "INBOX".to_string(),
            })
            .collect())
    }

    async fn fetch(
        &self,
        _session: &mut FakeSession,
        message: &MessageRef,
    ) -> Result<ParsedMessage, MailboxError> {
        self.record(MailboxCall::Fetch(message.uid));
        let mut state = self.state.lock().unwrap();
        let stored = state
            .messages
            .iter_mut()
            .find(|m| m.uid == message.uid)
            .ok_or_else(|| MailboxError::FetchFailed {
                uid: message.uid,
                reason: "no such message".to_string(),
            })?;

        match &stored.message {
            Some(parsed) => {
                stored.seen = true;
                Ok(parsed.clone())
            }
            None => Err(MailboxError::FetchFailed {
                uid: message.uid,
                reason: "server closed the stream".to_string(),
            }),
        }
    }

    async fn purge_all(&self, _session: &mut FakeSession) -> Result<(), MailboxError> {
        self.record(MailboxCall::PurgeAll);
        let mut state = self.state.lock().unwrap();
        if state.fail_purge {
            return Err(MailboxError::ProtocolError("EXPUNGE refused".to_string()));
        }
        state.messages.clear();
        Ok(())
    }

    async fn list_folders(&self, _session: &mut FakeSession) -> Result<Vec<String>, MailboxError> {
        self.record(MailboxCall::ListFolders);
        Ok(vec!["INBOX".to_string(), "Archive".to_string()])
    }

    async fn disconnect(&self, _session: FakeSession) {
        self.record(MailboxCall::Disconnect);
    }
}

#[derive(Debug, Default)]
struct PrinterState {
    queues: Vec<String>,
    jobs: Vec<PrintJob>,
    /// Whether each submitted file existed at submission time.
    files_present: Vec<bool>,
    fail_submit: bool,
    unreachable: bool,
}

/// Print server accepting jobs into memory.
#[derive(Debug, Clone, Default)]
pub struct FakePrinter {
    state: Arc<Mutex<PrinterState>>,
}

impl FakePrinter {
    pub fn with_queues(queues: &[&str]) -> Self {
        let printer = Self::default();
        printer.state.lock().unwrap().queues = queues.iter().map(|q| q.to_string()).collect();
        printer
    }

    pub fn failing_submit(self) -> Self {
        self.state.lock().unwrap().fail_submit = true;
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    pub fn jobs(&self) -> Vec<PrintJob> {
        self.state.lock().unwrap().jobs.clone()
    }

    pub fn submitted_paths(&self) -> Vec<PathBuf> {
        self.jobs().into_iter().map(|job| job.path).collect()
    }

    pub fn files_present(&self) -> Vec<bool> {
        self.state.lock().unwrap().files_present.clone()
    }
}

#[async_trait]
impl PrintService for FakePrinter {
    async fn list_queues(&self) -> Result<Vec<String>, PrintError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(PrintError::ConnectionFailed("cups.example.com:631".to_string()));
        }
        Ok(state.queues.clone())
    }

    async fn print_file(&self, job: &PrintJob) -> Result<Option<String>, PrintError> {
        let mut state = self.state.lock().unwrap();
        state.jobs.push(job.clone());
        state.files_present.push(job.path.is_file());
        if state.fail_submit {
            return Err(PrintError::CommandFailed {
                program: "lp",
                message: "printer is on fire".to_string(),
            });
        }
        Ok(Some(format!("{}-{}", job.queue, state.jobs.len())))
    }
}
