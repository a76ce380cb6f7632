//! Transaction bracket state.
//!
//! A transactional batch is wrapped by a begin sentinel (`multi`) and an end sentinel (`exec`).
//! The tracker only records whether a begin sentinel was matched and not yet closed; it never
//! changes how payload commands inside the bracket are matched.

use kvmock_common::ids::Sequence;

/// Two-state bracket marker owned by one mock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxBracket {
    opened_by: Option<Sequence>,
}

impl TxBracket {
    /// Moves to the open state after the begin sentinel `sequence` matched.
    ///
    /// Returns `false` when a bracket is already open; the new sentinel then replaces it.
    pub fn open(&mut self, sequence: Sequence) -> bool {
        let was_closed = self.opened_by.is_none();
        self.opened_by = Some(sequence);
        was_closed
    }

    /// Moves to the closed state after an end sentinel matched.
    ///
    /// Returns `false` when no bracket was open.
    pub fn close(&mut self) -> bool {
        self.opened_by.take().is_some()
    }

    /// Returns whether a begin sentinel is matched and not yet closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened_by.is_some()
    }

    /// Sequence of the begin sentinel holding the bracket open.
    #[must_use]
    pub fn opened_by(&self) -> Option<Sequence> {
        self.opened_by
    }
}
