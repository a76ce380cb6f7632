//! One declared anticipated command and its configured outcome.

use std::fmt;

use kvmock_common::error::{MockError, MockResult};
use kvmock_common::ids::Sequence;

use crate::command::{CommandFrame, Reply};
use crate::matcher::{CompiledPatterns, Matcher, MatcherKind, Rejection};

/// Canned result replayed when an expectation matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    /// Nothing configured yet.
    #[default]
    Unset,
    /// Successful reply payload.
    Value(Reply),
    /// Error returned as the command's result.
    Error(MockError),
}

impl Outcome {
    /// Converts the outcome into the command result seen by the caller.
    ///
    /// # Errors
    ///
    /// Returns the configured error, or [`MockError::UnsetOutcome`] when nothing was set.
    pub fn resolve(&self, command: &str) -> MockResult<Reply> {
        match self {
            Self::Unset => Err(MockError::UnsetOutcome {
                command: command.to_owned(),
            }),
            Self::Value(reply) => Ok(reply.clone()),
            Self::Error(error) => Err(error.clone()),
        }
    }
}

/// Marks sentinel expectations that stand for protocol brackets rather than user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Ordinary payload command.
    #[default]
    Normal,
    /// Opens a transactional batch (`multi`).
    TxBegin,
    /// Closes a transactional batch (`exec`).
    TxEnd,
    /// Optimistic-lock `watch`; matched like a normal command, never brackets.
    Watch,
}

impl Role {
    /// Returns whether this role stands for a protocol-level sentinel.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Queue entry.
#[derive(Debug, Clone)]
pub struct Expectation {
    sequence: Sequence,
    frame: CommandFrame,
    matcher: Matcher,
    patterns: CompiledPatterns,
    role: Role,
    outcome: Outcome,
    consumed: bool,
}

impl Expectation {
    pub(crate) fn new(sequence: Sequence, frame: CommandFrame, matcher: Matcher, role: Role) -> Self {
        let outcome = if role.is_sentinel() {
            Outcome::Value(Reply::ok())
        } else {
            Outcome::Unset
        };
        let patterns = match matcher {
            Matcher::Pattern => CompiledPatterns::compile(&frame.args),
            Matcher::Exact | Matcher::Custom(_) => CompiledPatterns::default(),
        };
        for reason in patterns.errors() {
            tracing::warn!(%sequence, command = %frame, reason, "invalid pattern registered");
        }
        Self {
            sequence,
            frame,
            matcher,
            patterns,
            role,
            outcome,
            consumed: false,
        }
    }

    /// Registration order.
    #[must_use]
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Expected command name and arguments.
    #[must_use]
    pub fn frame(&self) -> &CommandFrame {
        &self.frame
    }

    /// Strategy used for argument matching.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Runs phase two of matching against `actual`.
    ///
    /// # Errors
    ///
    /// Returns the matcher's [`Rejection`].
    pub fn check(&self, actual: &CommandFrame) -> Result<(), Rejection> {
        self.matcher.check_compiled(&self.patterns, &self.frame, actual)
    }

    /// Sentinel marker.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Currently configured outcome.
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether a call already consumed this entry.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }

    pub(crate) fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    /// Plain-data snapshot for diagnostics.
    #[must_use]
    pub fn summary(&self) -> ExpectationSummary {
        ExpectationSummary {
            sequence: self.sequence,
            frame: self.frame.clone(),
            matcher: self.matcher.kind(),
            role: self.role,
        }
    }
}

/// Pending-expectation record returned by verification queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationSummary {
    /// Registration order.
    pub sequence: Sequence,
    /// Expected command.
    pub frame: CommandFrame,
    /// Strategy label.
    pub matcher: MatcherKind,
    /// Sentinel marker.
    pub role: Role,
}

impl fmt::Display for ExpectationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cmd '{}' ({})", self.sequence, self.frame, self.matcher)
    }
}
