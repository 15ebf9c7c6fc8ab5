//! One-shot terminal state for a broadcast source

use std::sync::OnceLock;

use crate::error::SourceFault;

/// The settled state of a source once it stops accepting emissions.
#[derive(Debug, Clone)]
pub enum Terminal {
    /// Producer finished normally.
    Completed,
    /// Producer recorded a fault; replayed to every subscriber.
    Faulted(SourceFault),
}

impl Terminal {
    /// The fault carried by this terminal state, if any.
    pub fn fault(&self) -> Option<&SourceFault> {
        match self {
            Terminal::Completed => None,
            Terminal::Faulted(fault) => Some(fault),
        }
    }
}

/// One-shot cell encoding `Open -> {Completed, Faulted}`.
///
/// Exactly one caller wins the transition; every competitor observes the
/// already-settled state. A single tagged cell means a reader can never
/// observe "terminal" with the fault still missing.
#[derive(Debug, Default)]
pub struct TerminalCell {
    cell: OnceLock<Terminal>,
}

impl TerminalCell {
    /// Create a cell in the `Open` state.
    pub fn new() -> Self {
        TerminalCell {
            cell: OnceLock::new(),
        }
    }

    /// Attempt `Open -> Completed`. Returns true for the winning caller.
    pub fn try_complete(&self) -> bool {
        self.cell.set(Terminal::Completed).is_ok()
    }

    /// Attempt `Open -> Faulted`. Returns true for the winning caller; the
    /// losing caller's fault is dropped and the stored one never changes.
    pub fn try_fault(&self, fault: SourceFault) -> bool {
        self.cell.set(Terminal::Faulted(fault)).is_ok()
    }

    /// The settled state, or `None` while still open.
    pub fn get(&self) -> Option<&Terminal> {
        self.cell.get()
    }

    /// Whether the transition has been won by anyone.
    pub fn is_terminal(&self) -> bool {
        self.cell.get().is_some()
    }
}
