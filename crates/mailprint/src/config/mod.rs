pub mod loader;
pub mod schema;

pub use loader::{find_config, load_config, load_config_from_str, DEFAULT_CONFIG_PATHS};
pub use schema::{Config, LoggingConfig, MailboxConfig, PrinterConfig, StorageConfig};
