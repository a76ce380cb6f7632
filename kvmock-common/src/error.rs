//! Shared error model for the mock engine and its client handles.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Result type used by every fallible `kvmock` API.
pub type MockResult<T> = Result<T, MockError>;

/// Errors surfaced to code issuing commands through a mock client, and to test teardown
/// checks.
///
/// Per-command variants are returned as the command's own result error. The two
/// aggregate variants (`UnmetExpectations`, `UnexpectedCalls`) only come out of the
/// verification calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockError {
    /// Error configured by the test through `set_err`, returned verbatim.
    #[error("{0}")]
    Configured(String),

    /// Canonical "value not present" outcome of the store.
    #[error("kvmock: nil")]
    Nil,

    /// A command matched an expectation whose outcome was never configured.
    #[error("cmd({command}) matched an expectation without a configured value or error")]
    UnsetOutcome {
        /// Command name of the matched expectation.
        command: String,
    },

    /// No pending expectation carries the command name that was issued.
    #[error("{}call to cmd '{call}' was not expected", no_match_prefix(.queue_empty))]
    NoMatch {
        /// Rendered command with its arguments.
        call: String,
        /// Whether every expectation had already been consumed.
        queue_empty: bool,
    },

    /// The candidate expectation rejected the issued arguments.
    #[error("call to cmd '{actual}' does not match expectation '{expected}': {reason}")]
    Mismatch {
        /// Rendered expectation.
        expected: String,
        /// Rendered issued command.
        actual: String,
        /// Matcher diagnostic.
        reason: String,
    },

    /// A transactional batch arrived without its begin/end sentinel expectations.
    #[error("transaction not expected: {reason}")]
    TransactionNotExpected {
        /// Which sentinel is missing.
        reason: String,
    },

    /// Verification found expectations that were never consumed.
    #[error(
        "there are {} remaining expectations which were not matched: [{}]",
        .0.len(),
        .0.join("; ")
    )]
    UnmetExpectations(Vec<String>),

    /// Verification found commands that matched no expectation.
    #[error("{} unexpected calls were made: [{}]", .0.len(), .0.join("; "))]
    UnexpectedCalls(Vec<String>),

    /// A configured reply cannot be converted into the command's typed result.
    #[error("reply shape mismatch: expected {expected}, got {actual}")]
    ReplyShape {
        /// Shape required by the typed result.
        expected: &'static str,
        /// Rendered reply that was configured.
        actual: String,
    },

    /// Internal state does not allow this operation.
    #[error("invalid mock state: {0}")]
    InvalidState(&'static str),

    /// Error value produced by test code (typically a custom matcher), carried unchanged.
    #[error("{0}")]
    Foreign(ForeignError),
}

/// Shared handle on an arbitrary error value.
///
/// Two handles compare equal only when they point at the same value, so clones of one
/// propagated error stay equal.
#[derive(Clone)]
pub struct ForeignError(Arc<dyn StdError + Send + Sync>);

impl ForeignError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// The wrapped error.
    #[must_use]
    pub fn get(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for ForeignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ForeignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialEq for ForeignError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ForeignError {}

impl MockError {
    /// Returns whether this is the missing-value sentinel.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Wraps an arbitrary error so it reaches the caller as-is.
    pub fn foreign<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Foreign(ForeignError::new(error))
    }

    /// Recovers the concrete type of an error wrapped by [`Self::foreign`].
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Foreign(foreign) => foreign.get().downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<&str> for MockError {
    fn from(message: &str) -> Self {
        Self::Configured(message.to_owned())
    }
}

impl From<String> for MockError {
    fn from(message: String) -> Self {
        Self::Configured(message)
    }
}

fn no_match_prefix(queue_empty: &bool) -> &'static str {
    if *queue_empty {
        "all expectations were already fulfilled, "
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::MockError;
    use googletest::prelude::*;
    use rstest::rstest;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct QuotaExceeded {
        limit: u32,
    }

    impl fmt::Display for QuotaExceeded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "quota of {} exceeded", self.limit)
        }
    }

    impl std::error::Error for QuotaExceeded {}

    #[rstest]
    fn foreign_error_keeps_its_concrete_value() {
        let error = MockError::foreign(QuotaExceeded { limit: 5 });
        assert_that!(error.to_string().as_str(), eq("quota of 5 exceeded"));
        assert_that!(
            error.downcast_ref::<QuotaExceeded>(),
            eq(Some(&QuotaExceeded { limit: 5 }))
        );
        assert_that!(&error.clone(), eq(&error));
        assert_that!(error == MockError::foreign(QuotaExceeded { limit: 5 }), eq(false));
        assert_that!(MockError::from("plain").downcast_ref::<QuotaExceeded>().is_none(), eq(true));
    }

    #[rstest]
    fn configured_error_renders_verbatim() {
        let error = MockError::from("set error");
        assert_that!(error.to_string().as_str(), eq("set error"));
        assert_that!(&error, eq(&MockError::Configured("set error".to_owned())));
    }

    #[rstest]
    #[case(true, "all expectations were already fulfilled, call to cmd 'get key' was not expected")]
    #[case(false, "call to cmd 'get key' was not expected")]
    fn no_match_mentions_exhausted_queue(#[case] queue_empty: bool, #[case] expected: &str) {
        let error = MockError::NoMatch {
            call: "get key".to_owned(),
            queue_empty,
        };
        assert_that!(error.to_string().as_str(), eq(expected));
    }

    #[rstest]
    fn unmet_expectations_lists_every_entry() {
        let error = MockError::UnmetExpectations(vec!["#1 get a".to_owned(), "#2 get b".to_owned()]);
        assert_that!(
            error.to_string().as_str(),
            eq("there are 2 remaining expectations which were not matched: [#1 get a; #2 get b]")
        );
    }

    #[rstest]
    fn nil_is_distinguishable_from_failures() {
        assert_that!(MockError::Nil.is_nil(), eq(true));
        assert_that!(MockError::from("boom").is_nil(), eq(false));
    }
}
