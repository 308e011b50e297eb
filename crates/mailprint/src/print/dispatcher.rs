use std::path::Path;

use tracing::{info, warn};

use crate::sanitize::redact_path;
use crate::storage::PRINTABLE_EXTENSION;

use super::error::Result;
use super::service::{PrintJob, PrintService};

/// Result of a submission attempt that reached the print service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    /// The server accepted the job.
    Submitted { job_id: Option<String> },
    /// The configured queue is not advertised by the server.
    QueueNotFound,
    /// The file does not carry the printable-document extension.
    NotPrintable,
}

impl PrintOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PrintOutcome::Submitted { .. })
    }
}

/// Validates jobs client-side and forwards them to a [`PrintService`].
pub struct PrintDispatcher<S> {
    service: S,
}

impl<S: PrintService> PrintDispatcher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submits `path` to `queue` once the queue is known to exist and the
    /// file is a PDF.
    ///
    /// Only print-service failures are errors; an unknown queue or a wrong
    /// file type are reported as [`PrintOutcome`] values.
    pub async fn submit(&self, queue: &str, path: &Path, label: &str) -> Result<PrintOutcome> {
        let queues = self.service.list_queues().await?;
        if !queues.iter().any(|q| q == queue) {
            warn!(
                queue,
                available = %queues.join(", "),
                "Print queue not found"
            );
            return Ok(PrintOutcome::QueueNotFound);
        }

        if !is_printable(path) {
            warn!(file = %redact_path(path), "Not a PDF document, not printing");
            return Ok(PrintOutcome::NotPrintable);
        }

        let job = PrintJob {
            queue: queue.to_string(),
            path: path.to_path_buf(),
            label: label.to_string(),
        };

        info!(queue, file = %redact_path(path), "Sending document to printer");
        let job_id = self.service.print_file(&job).await?;
        Ok(PrintOutcome::Submitted { job_id })
    }

    /// Queue names advertised by the service.
    pub async fn queues(&self) -> Result<Vec<String>> {
        self.service.list_queues().await
    }
}

fn is_printable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PRINTABLE_EXTENSION))
}
