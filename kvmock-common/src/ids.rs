//! Identifier types used by the expectation queue and its diagnostics.

use std::fmt;

/// Registration order of one expectation inside a single mock.
///
/// Sequences start at `1` after every queue clear and grow by one per registration, so two
/// expectations registered between the same pair of clears never share a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence(u64);

impl Sequence {
    /// First sequence handed out by an empty queue.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw sequence value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the sequence that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of one registered expectation: the queue generation it was registered in plus
/// its sequence.
///
/// Every queue clear starts a new generation, so an id obtained before a clear never
/// addresses an expectation registered after it, even when the sequence is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpectationId {
    generation: u64,
    sequence: Sequence,
}

impl ExpectationId {
    #[must_use]
    pub const fn new(generation: u64, sequence: Sequence) -> Self {
        Self {
            generation,
            sequence,
        }
    }

    /// Clear generation the expectation was registered in.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn sequence(self) -> Sequence {
        self.sequence
    }
}

impl fmt::Display for ExpectationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (generation {})", self.sequence, self.generation)
    }
}
