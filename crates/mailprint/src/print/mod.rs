//! Print submission: the print-service seam, its CUPS implementation, and the
//! dispatcher that validates a job before handing it over.

pub mod cups;
pub mod dispatcher;
pub mod error;
pub mod service;

pub use cups::CupsClient;
pub use dispatcher::{PrintDispatcher, PrintOutcome};
pub use error::PrintError;
pub use service::{PrintJob, PrintService};
