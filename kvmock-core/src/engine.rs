//! Shared mock state and the interceptor implementation.

use std::sync::{Mutex, MutexGuard};

use kvmock_common::config::{MatchMode, MockConfig};
use kvmock_common::error::{MockError, MockResult};
use kvmock_common::ids::{ExpectationId, Sequence};

use crate::bracket::TxBracket;
use crate::command::{CommandFrame, Reply};
use crate::diagnostics::{self, CallLog, UnexpectedCall};
use crate::expectation::{ExpectationSummary, Outcome, Role};
use crate::interceptor::Interceptor;
use crate::matcher::{Matcher, Rejection};
use crate::queue::{ExpectationQueue, Lookup};

/// Expectation engine owned by one mock instance.
///
/// Queue, mode flag, unexpected-call log and bracket marker live behind a single mutex that
/// is held for exactly one registration, lookup, batch, clear or diagnostic call. Custom
/// matchers run while the lock is held and must not call back into the same engine.
#[derive(Debug)]
pub struct MockEngine {
    config: MockConfig,
    state: Mutex<EngineState>,
}

#[derive(Debug)]
struct EngineState {
    queue: ExpectationQueue,
    mode: MatchMode,
    log: CallLog,
    bracket: TxBracket,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl MockEngine {
    /// Creates an engine with an empty queue in the configured default mode.
    #[must_use]
    pub fn new(config: MockConfig) -> Self {
        let mode = config.default_mode;
        Self {
            config,
            state: Mutex::new(EngineState {
                queue: ExpectationQueue::new(),
                mode,
                log: CallLog::default(),
                bracket: TxBracket::default(),
            }),
        }
    }

    /// Construction-time settings.
    #[must_use]
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Appends one expectation and returns its id.
    pub fn register(&self, frame: CommandFrame, matcher: Matcher, role: Role) -> ExpectationId {
        let mut state = self.lock();
        let kind = matcher.kind();
        let command = frame.to_string();
        let id = state.queue.register(frame, matcher, role);
        tracing::debug!(%id, %command, matcher = %kind, ?role, "expectation registered");
        id
    }

    /// Overwrites the outcome of one expectation; the last write wins.
    ///
    /// Writes aimed at an expectation discarded by [`Self::clear`] are ignored, even when a
    /// later registration reuses its sequence.
    pub fn set_outcome(&self, id: ExpectationId, outcome: Outcome) {
        let mut state = self.lock();
        if !state.queue.set_outcome(id, outcome) {
            tracing::debug!(%id, "outcome ignored for cleared expectation");
        }
    }

    /// Switches the match mode for every subsequent lookup.
    pub fn set_mode(&self, mode: MatchMode) {
        self.lock().mode = mode;
        tracing::debug!(?mode, "match mode changed");
    }

    /// Current match mode.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.lock().mode
    }

    /// Discards every expectation, the unexpected-call log and the bracket marker, and
    /// restores the configured default mode.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.queue.clear();
        state.log.clear();
        state.bracket = TxBracket::default();
        state.mode = self.config.default_mode;
        tracing::debug!("expectations cleared");
    }

    /// Snapshots every pending expectation in registration order.
    #[must_use]
    pub fn pending(&self) -> Vec<ExpectationSummary> {
        diagnostics::pending_summaries(&self.lock().queue)
    }

    /// Checks that every registered expectation was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::UnmetExpectations`] listing every pending expectation.
    pub fn expectations_were_met(&self) -> MockResult<()> {
        diagnostics::verify_all_consumed(&self.lock().queue)
    }

    /// Commands that matched nothing, in arrival order.
    #[must_use]
    pub fn unexpected_calls(&self) -> Vec<UnexpectedCall> {
        self.lock().log.calls().to_vec()
    }

    /// Checks that no command missed the queue.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::UnexpectedCalls`] listing every recorded miss.
    pub fn verify_no_unexpected_calls(&self) -> MockResult<()> {
        self.lock().log.verify_empty()
    }

    /// Whether a begin sentinel is matched and its end sentinel is not.
    #[must_use]
    pub fn bracket_open(&self) -> bool {
        self.lock().bracket.is_open()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("mock state lock was poisoned by a panicking caller, recovering");
            let guard = poisoned.into_inner();
            self.state.clear_poison();
            guard
        })
    }
}

impl Interceptor for MockEngine {
    fn process_command(&self, frame: &CommandFrame) -> MockResult<Reply> {
        self.lock().resolve(frame, &self.config)
    }

    fn process_pipeline(&self, frames: &[CommandFrame]) -> Vec<MockResult<Reply>> {
        let mut state = self.lock();
        frames
            .iter()
            .map(|frame| state.resolve(frame, &self.config))
            .collect()
    }

    fn process_transaction(&self, frames: &[CommandFrame]) -> MockResult<Vec<MockResult<Reply>>> {
        self.lock().run_transaction(frames, &self.config)
    }
}

impl EngineState {
    fn resolve(&mut self, frame: &CommandFrame, config: &MockConfig) -> MockResult<Reply> {
        match self.queue.lookup(frame, self.mode) {
            Lookup::Matched {
                sequence,
                role,
                outcome,
            } => {
                tracing::debug!(%sequence, command = %frame, "expectation matched");
                self.apply_role(sequence, role);
                outcome.resolve(&frame.name)
            }
            Lookup::Mismatch {
                expected,
                rejection,
            } => {
                let error = match rejection {
                    Rejection::Diagnostic(reason) => MockError::Mismatch {
                        expected: expected.to_string(),
                        actual: frame.to_string(),
                        reason,
                    },
                    Rejection::Custom(error) => error,
                };
                Err(self.record_unexpected(frame.clone(), error, config))
            }
            Lookup::NotFound { queue_empty } => {
                let error = MockError::NoMatch {
                    call: frame.to_string(),
                    queue_empty,
                };
                Err(self.record_unexpected(frame.clone(), error, config))
            }
        }
    }

    fn run_transaction(
        &mut self,
        frames: &[CommandFrame],
        config: &MockConfig,
    ) -> MockResult<Vec<MockResult<Reply>>> {
        let begin_frame = CommandFrame::new(config.tx_begin_command.clone(), Vec::new());
        let end_frame = CommandFrame::new(config.tx_end_command.clone(), Vec::new());

        let Some(begin) = self.queue.sentinel(Role::TxBegin, self.mode) else {
            return Err(self.bracket_failure(begin_frame, "no pending begin expectation", config));
        };
        let end_available = match self.mode {
            MatchMode::Ordered => self.queue.has_pending_role_after(Role::TxEnd, begin),
            MatchMode::Unordered => self.queue.sentinel(Role::TxEnd, self.mode).is_some(),
        };
        if !end_available {
            return Err(self.bracket_failure(end_frame, "no pending end expectation", config));
        }

        let (sequence, role, outcome) = self.queue.consume(begin);
        self.apply_role(sequence, role);
        if let Err(error) = outcome.resolve(&begin_frame.name) {
            let _ = self.bracket.close();
            return Err(error);
        }

        let replies = frames
            .iter()
            .map(|frame| self.resolve(frame, config))
            .collect::<Vec<_>>();

        let Some(end) = self.queue.sentinel(Role::TxEnd, self.mode) else {
            let _ = self.bracket.close();
            return Err(self.bracket_failure(
                end_frame,
                "end expectation is not next after the batch",
                config,
            ));
        };
        let (sequence, role, outcome) = self.queue.consume(end);
        self.apply_role(sequence, role);
        outcome.resolve(&end_frame.name)?;
        Ok(replies)
    }

    fn apply_role(&mut self, sequence: Sequence, role: Role) {
        match role {
            Role::TxBegin => {
                if !self.bracket.open(sequence) {
                    tracing::warn!(%sequence, "begin sentinel matched while a bracket was open");
                }
            }
            Role::TxEnd => {
                if !self.bracket.close() {
                    tracing::warn!(%sequence, "end sentinel matched without an open bracket");
                }
            }
            Role::Normal | Role::Watch => {}
        }
    }

    fn bracket_failure(
        &mut self,
        frame: CommandFrame,
        reason: &str,
        config: &MockConfig,
    ) -> MockError {
        let error = MockError::TransactionNotExpected {
            reason: reason.to_owned(),
        };
        self.record_unexpected(frame, error, config)
    }

    fn record_unexpected(
        &mut self,
        frame: CommandFrame,
        error: MockError,
        config: &MockConfig,
    ) -> MockError {
        tracing::warn!(command = %frame, %error, "unexpected call");
        if config.record_unexpected_calls {
            self.log.record(UnexpectedCall {
                frame,
                registered_through: self.queue.last_sequence(),
                error: error.clone(),
            });
        }
        error
    }
}

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;
