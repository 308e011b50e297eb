use std::path::PathBuf;
use thiserror::Error;

use crate::email::MailboxError;
use crate::print::PrintError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum MailprintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Print error: {0}")]
    Print(#[from] PrintError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("No config file found (searched: {searched})")]
    NotFound { searched: String },

    #[error("Failed to resolve secret for '{field}': {source}")]
    Secret {
        field: &'static str,
        #[source]
        source: SecretError,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    RenameFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' exists but is not a directory")]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, MailprintError>;
