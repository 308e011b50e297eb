pub mod config;
pub mod diagnostics;
pub mod email;
pub mod error;
pub mod logging;
pub mod poll;
pub mod print;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use config::{find_config, load_config, Config};
pub use diagnostics::Inventory;
pub use email::{ImapClient, MailboxError, MailboxTransport};
pub use error::{ConfigError, MailprintError, Result, StorageError};
pub use poll::{CycleSettings, PollCycle, TickReport, TickState};
pub use print::{CupsClient, PrintDispatcher, PrintError, PrintService};
pub use secrets::{PasswordSource, SecretError};
pub use storage::AttachmentStore;
