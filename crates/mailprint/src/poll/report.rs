use std::fmt;

use crate::print::PrintOutcome;

/// States a tick moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    Idle,
    Connecting,
    Listing,
    FetchingAndParsing,
    Printing,
    Purging,
    Disconnecting,
}

impl fmt::Display for TickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TickState::Idle => "idle",
            TickState::Connecting => "connecting",
            TickState::Listing => "listing",
            TickState::FetchingAndParsing => "fetching",
            TickState::Printing => "printing",
            TickState::Purging => "purging",
            TickState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// How the print step of a tick ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintAttempt {
    /// The print service answered (accepted or routinely rejected).
    Completed(PrintOutcome),
    /// Saving or submitting failed.
    Failed(String),
}

/// What happened during one tick. Errors are recorded here instead of being
/// propagated.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Visited states in order, ending in [`TickState::Idle`].
    pub states: Vec<TickState>,
    /// Unseen messages listed.
    pub unread: usize,
    /// Messages fetched before one qualified (or the list ran out).
    pub fetched: usize,
    /// UID of the message whose attachment was printed.
    pub selected_uid: Option<u32>,
    pub print: Option<PrintAttempt>,
    /// Whether the saved attachment was deleted after the print attempt.
    pub attachment_removed: bool,
    pub purged: bool,
    /// Contained failures, in the order they happened.
    pub errors: Vec<String>,
}

impl TickReport {
    pub(crate) fn enter(&mut self, state: TickState) {
        tracing::debug!(%state, "tick state");
        self.states.push(state);
    }

    pub(crate) fn record_error(&mut self, error: impl fmt::Display) {
        self.errors.push(error.to_string());
    }

    pub fn visited(&self, state: TickState) -> bool {
        self.states.contains(&state)
    }

    pub fn final_state(&self) -> Option<TickState> {
        self.states.last().copied()
    }

    /// True if a job was accepted by the print service.
    pub fn printed(&self) -> bool {
        matches!(&self.print, Some(PrintAttempt::Completed(outcome)) if outcome.is_accepted())
    }
}
