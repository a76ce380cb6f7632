//! Dispatch seam between client handles and the expectation engine.
//!
//! Client handles never perform I/O. Every command they issue, alone or as part of a batch,
//! is handed to an [`Interceptor`], and the returned results are written into the typed
//! result objects the caller holds.

use std::fmt;

use kvmock_common::error::MockResult;

use crate::command::{CommandFrame, Reply};

/// Replacement for a client's command-dispatch path.
pub trait Interceptor: fmt::Debug + Send + Sync {
    /// Resolves one command.
    ///
    /// # Errors
    ///
    /// Returns the configured error of the matched expectation, or an engine error when
    /// nothing matched.
    fn process_command(&self, frame: &CommandFrame) -> MockResult<Reply>;

    /// Resolves a plain pipeline, one result per frame in order.
    ///
    /// The default redirects each frame to [`Self::process_command`].
    fn process_pipeline(&self, frames: &[CommandFrame]) -> Vec<MockResult<Reply>> {
        frames
            .iter()
            .map(|frame| self.process_command(frame))
            .collect()
    }

    /// Resolves a transactional batch. `frames` holds only the payload; the begin and end
    /// sentinels are implied.
    ///
    /// # Errors
    ///
    /// Returns an error for the whole batch when the bracket sentinels cannot be matched or
    /// carry a configured error. Payload results are only produced on success.
    fn process_transaction(&self, frames: &[CommandFrame]) -> MockResult<Vec<MockResult<Reply>>>;
}
