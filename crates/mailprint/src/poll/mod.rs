//! The poll cycle: one connect-list-fetch-print-purge-disconnect pass per
//! tick, repeated on a fixed interval.

pub mod cycle;
pub mod report;

pub use cycle::{CycleSettings, PollCycle};
pub use report::{PrintAttempt, TickReport, TickState};
