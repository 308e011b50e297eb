use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::secrets::{PasswordSource, SecretError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub storage: StorageConfig,
    pub printer: PrinterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// IMAP account polled for print jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxConfig {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    pub username: String,

    /// Direct password value. Prefer `password_file` or `password_env_var`.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env_var: Option<String>,

    #[serde(default = "default_folder")]
    pub folder: String,

    /// Only messages whose subject contains this text are considered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Purge the whole folder at the end of every tick.
    #[serde(default)]
    pub delete_after_read: bool,

    /// Seconds between ticks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds allowed for each network operation.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl MailboxConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The keyword filter, with an empty string treated as no filter.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// The configured password source, if any is set.
    pub fn password_source(&self) -> Option<PasswordSource<'_>> {
        PasswordSource::select(
            self.password.as_deref(),
            self.password_file.as_deref(),
            self.password_env_var.as_deref(),
        )
    }

    pub fn password(&self) -> Result<SecretString, ConfigError> {
        self.password_source()
            .ok_or(SecretError::Missing)
            .and_then(|source| source.resolve())
            .map_err(|source| ConfigError::Secret {
                field: "mailbox.password",
                source,
            })
    }
}

fn default_imap_port() -> u16 {
    993
}

fn default_folder() -> String {
    "INBOX".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory extracted attachments are written to before printing.
    #[serde(default = "default_attachment_directory")]
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_attachment_directory(),
        }
    }
}

fn default_attachment_directory() -> PathBuf {
    std::env::temp_dir().join("mailprint")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    /// CUPS queue name, matched exactly.
    pub name: String,

    /// CUPS server; the local default server when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default = "default_job_label")]
    pub job_label: String,
}

fn default_job_label() -> String {
    "mailprint".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
