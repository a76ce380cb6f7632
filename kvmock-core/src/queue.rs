//! Ordered expectation storage, registration and consumption.

use std::collections::VecDeque;

use kvmock_common::config::MatchMode;
use kvmock_common::ids::{ExpectationId, Sequence};

use crate::command::CommandFrame;
use crate::containers::HotMap;
use crate::expectation::{Expectation, Outcome, Role};
use crate::matcher::{Matcher, Rejection};

/// Result of resolving one issued command against the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The candidate accepted the call and is now consumed.
    Matched {
        /// Sequence of the consumed expectation.
        sequence: Sequence,
        /// Role of the consumed expectation.
        role: Role,
        /// Outcome as configured at match time.
        outcome: Outcome,
    },
    /// The candidate shares the command name but rejected the arguments.
    Mismatch {
        /// Expected command of the candidate, which stays pending.
        expected: CommandFrame,
        /// Matcher verdict.
        rejection: Rejection,
    },
    /// No candidate carries the issued command name.
    NotFound {
        /// Whether the queue had no pending entry at all.
        queue_empty: bool,
    },
}

/// Expectations of one mock in registration order.
///
/// Consumption always removes the earliest pending entry of a given command name: in ordered
/// mode the candidate is the earliest pending entry overall, in unordered mode the earliest
/// pending entry of that name. The per-name index relies on this.
#[derive(Debug)]
pub struct ExpectationQueue {
    entries: Vec<Expectation>,
    last_sequence: Sequence,
    generation: u64,
    head: usize,
    pending: usize,
    by_name: HotMap<String, VecDeque<usize>>,
}

impl Default for ExpectationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpectationQueue {
    /// Builds an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_sequence: Sequence::new(0),
            generation: 0,
            head: 0,
            pending: 0,
            by_name: HotMap::new(),
        }
    }

    /// Appends one expectation and returns its id.
    ///
    /// Arity is not validated and duplicates are allowed.
    pub fn register(&mut self, frame: CommandFrame, matcher: Matcher, role: Role) -> ExpectationId {
        let sequence = self.last_sequence.next();
        self.last_sequence = sequence;

        let index = self.entries.len();
        self.by_name
            .entry(index_key(&frame.name))
            .or_default()
            .push_back(index);
        self.entries
            .push(Expectation::new(sequence, frame, matcher, role));
        self.pending += 1;
        ExpectationId::new(self.generation, sequence)
    }

    /// Overwrites the outcome of one entry.
    ///
    /// Returns `false` when the id is unknown or belongs to a generation discarded by
    /// [`Self::clear`].
    pub fn set_outcome(&mut self, id: ExpectationId, outcome: Outcome) -> bool {
        if id.generation() != self.generation {
            return false;
        }
        let Some(index) = self.position(id.sequence()) else {
            return false;
        };
        self.entries[index].set_outcome(outcome);
        true
    }

    /// Resolves one issued command under the given mode.
    pub fn lookup(&mut self, actual: &CommandFrame, mode: MatchMode) -> Lookup {
        let queue_empty = self.pending == 0;
        let Some(index) = self.candidate(actual, mode) else {
            return Lookup::NotFound { queue_empty };
        };

        let entry = &self.entries[index];
        match entry.check(actual) {
            Ok(()) => {
                let (sequence, role, outcome) = self.consume(index);
                Lookup::Matched {
                    sequence,
                    role,
                    outcome,
                }
            }
            Err(rejection) => Lookup::Mismatch {
                expected: entry.frame().clone(),
                rejection,
            },
        }
    }

    /// Locates the sentinel of `role` that a transactional batch would consume.
    ///
    /// In ordered mode the sentinel must be the queue head; in unordered mode it is the
    /// earliest pending entry with that role.
    #[must_use]
    pub fn sentinel(&self, role: Role, mode: MatchMode) -> Option<usize> {
        match mode {
            MatchMode::Ordered => self
                .entries
                .get(self.head)
                .filter(|entry| !entry.is_consumed() && entry.role() == role)
                .map(|_| self.head),
            MatchMode::Unordered => self.first_pending_with_role(role, 0),
        }
    }

    /// Returns whether a pending entry with `role` exists strictly after `index`.
    #[must_use]
    pub fn has_pending_role_after(&self, role: Role, index: usize) -> bool {
        self.first_pending_with_role(role, index + 1).is_some()
    }

    /// Consumes the entry at `index` regardless of its matcher.
    ///
    /// Used for sentinels located through [`Self::sentinel`].
    pub fn consume(&mut self, index: usize) -> (Sequence, Role, Outcome) {
        let entry = &mut self.entries[index];
        entry.mark_consumed();
        let snapshot = (entry.sequence(), entry.role(), entry.outcome().clone());

        let key = index_key(&entry.frame().name);
        if let Some(positions) = self.by_name.get_mut(&key) {
            if let Some(slot) = positions.iter().position(|position| *position == index) {
                let _ = positions.remove(slot);
            }
            if positions.is_empty() {
                let _ = self.by_name.remove(&key);
            }
        }

        self.pending -= 1;
        while self
            .entries
            .get(self.head)
            .is_some_and(Expectation::is_consumed)
        {
            self.head += 1;
        }
        snapshot
    }

    /// Unconsumed entries in registration order.
    pub fn pending(&self) -> impl Iterator<Item = &Expectation> {
        self.entries.iter().filter(|entry| !entry.is_consumed())
    }

    /// Number of unconsumed entries.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending
    }

    /// Sequence handed out by the most recent registration (`#0` when none).
    #[must_use]
    pub fn last_sequence(&self) -> Sequence {
        self.last_sequence
    }

    /// Current clear generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Discards every entry, restarts sequence numbering and opens a new generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.last_sequence = Sequence::new(0);
        self.generation = self.generation.wrapping_add(1);
        self.head = 0;
        self.pending = 0;
    }

    fn candidate(&self, actual: &CommandFrame, mode: MatchMode) -> Option<usize> {
        match mode {
            MatchMode::Ordered => self
                .entries
                .get(self.head)
                .filter(|entry| !entry.is_consumed() && entry.frame().same_command(actual))
                .map(|_| self.head),
            MatchMode::Unordered => self
                .by_name
                .get(&index_key(&actual.name))
                .and_then(|positions| positions.front().copied()),
        }
    }

    fn first_pending_with_role(&self, role: Role, from: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, entry)| !entry.is_consumed() && entry.role() == role)
            .map(|(index, _)| index)
    }

    fn position(&self, sequence: Sequence) -> Option<usize> {
        self.entries
            .binary_search_by_key(&sequence, Expectation::sequence)
            .ok()
    }
}

fn index_key(name: &str) -> String {
    name.to_ascii_lowercase()
}
