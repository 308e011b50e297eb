use std::path::PathBuf;

use async_trait::async_trait;

use super::error::Result;

/// A file submitted to a print queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub queue: String,
    pub path: PathBuf,
    pub label: String,
}

/// Operations needed from a print server.
#[async_trait]
pub trait PrintService: Send + Sync {
    /// Names of the queues the server currently advertises.
    async fn list_queues(&self) -> Result<Vec<String>>;

    /// Submits a job and returns the server's job id, if it reported one.
    async fn print_file(&self, job: &PrintJob) -> Result<Option<String>>;
}
