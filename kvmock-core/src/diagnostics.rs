//! Unexpected-call audit log and verification helpers.

use std::fmt;

use kvmock_common::error::{MockError, MockResult};
use kvmock_common::ids::Sequence;

use crate::command::CommandFrame;
use crate::expectation::ExpectationSummary;
use crate::queue::ExpectationQueue;

/// Audit record for one issued command that matched no pending expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedCall {
    /// Issued command and its arguments.
    pub frame: CommandFrame,
    /// Last sequence registered when the call arrived (`#0` when none).
    pub registered_through: Sequence,
    /// Error returned to the caller.
    pub error: MockError,
}

impl fmt::Display for UnexpectedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cmd '{}' after {}: {}",
            self.frame, self.registered_through, self.error
        )
    }
}

/// Append-only list of unexpected calls, cleared together with the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    calls: Vec<UnexpectedCall>,
}

impl CallLog {
    /// Appends one record.
    pub fn record(&mut self, call: UnexpectedCall) {
        self.calls.push(call);
    }

    /// Recorded calls in arrival order.
    #[must_use]
    pub fn calls(&self) -> &[UnexpectedCall] {
        &self.calls
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Fails with one aggregate error when any call was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::UnexpectedCalls`] listing every record.
    pub fn verify_empty(&self) -> MockResult<()> {
        if self.calls.is_empty() {
            return Ok(());
        }
        Err(MockError::UnexpectedCalls(
            self.calls.iter().map(ToString::to_string).collect(),
        ))
    }
}

/// Snapshots every pending expectation.
#[must_use]
pub fn pending_summaries(queue: &ExpectationQueue) -> Vec<ExpectationSummary> {
    queue.pending().map(|entry| entry.summary()).collect()
}

/// Fails with one aggregate error when any expectation is still pending.
///
/// # Errors
///
/// Returns [`MockError::UnmetExpectations`] listing every pending entry.
pub fn verify_all_consumed(queue: &ExpectationQueue) -> MockResult<()> {
    if queue.pending_len() == 0 {
        return Ok(());
    }
    Err(MockError::UnmetExpectations(
        pending_summaries(queue)
            .iter()
            .map(ToString::to_string)
            .collect(),
    ))
}
