//! Argument matching strategies.
//!
//! Matching runs in two phases. Phase one compares only command names (see
//! [`CommandFrame::same_command`]); the queue performs it before any strategy is consulted, so
//! an unrelated command never reaches a custom matcher. Phase two, implemented here, compares
//! argument lists for a candidate whose name already matched.

use std::fmt;
use std::sync::Arc;

use kvmock_common::error::MockError;
use regex::Regex;

use crate::command::{Arg, CommandFrame};
use crate::containers::HotMap;

/// User-supplied comparison over the full expected and actual argument lists.
///
/// Both slices start with the command name. Returning an error rejects the call, and that
/// exact error becomes the command's result error; wrap other error types with
/// [`MockError::foreign`] to hand them through unchanged.
pub type CustomMatchFn = Arc<dyn Fn(&[Arg], &[Arg]) -> Result<(), MockError> + Send + Sync>;

/// Matching strategy bound to one expectation at registration time.
#[derive(Clone, Default)]
pub enum Matcher {
    /// Positional equality over canonicalized arguments.
    #[default]
    Exact,
    /// String descriptors are full-string regular expressions, others compare exactly.
    Pattern,
    /// Delegates the whole decision to a user function.
    Custom(CustomMatchFn),
}

/// Strategy label without the callback, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// See [`Matcher::Exact`].
    Exact,
    /// See [`Matcher::Pattern`].
    Pattern,
    /// See [`Matcher::Custom`].
    Custom,
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Pattern => "regexp",
            Self::Custom => "custom",
        })
    }
}

/// Why phase two rejected a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Engine-produced diagnostic from the exact or pattern strategy.
    Diagnostic(String),
    /// Error returned by a custom matcher, propagated as-is.
    Custom(MockError),
}

impl Matcher {
    /// Wraps a closure as a custom matcher.
    pub fn custom<F>(function: F) -> Self
    where
        F: Fn(&[Arg], &[Arg]) -> Result<(), MockError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(function))
    }

    /// Returns the strategy label.
    #[must_use]
    pub fn kind(&self) -> MatcherKind {
        match self {
            Self::Exact => MatcherKind::Exact,
            Self::Pattern => MatcherKind::Pattern,
            Self::Custom(_) => MatcherKind::Custom,
        }
    }

    /// Runs phase two for a candidate whose command name already matched.
    ///
    /// Pattern expectations compile their expressions for this call only; the queue uses
    /// [`Self::check_compiled`] with the set built at registration.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] describing why `actual` does not satisfy `expected`.
    pub fn check(&self, expected: &CommandFrame, actual: &CommandFrame) -> Result<(), Rejection> {
        match self {
            Self::Pattern => {
                let patterns = CompiledPatterns::compile(&expected.args);
                self.check_compiled(&patterns, expected, actual)
            }
            _ => self.check_compiled(&CompiledPatterns::default(), expected, actual),
        }
    }

    /// Runs phase two against expressions compiled ahead of time.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] describing why `actual` does not satisfy `expected`.
    pub fn check_compiled(
        &self,
        patterns: &CompiledPatterns,
        expected: &CommandFrame,
        actual: &CommandFrame,
    ) -> Result<(), Rejection> {
        match self {
            Self::Exact => exact_args(&expected.args, &actual.args),
            Self::Pattern => patterns.check(&expected.args, &actual.args),
            Self::Custom(function) => function(&expected.full_args(), &actual.full_args())
                .map_err(Rejection::Custom),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("Exact"),
            Self::Pattern => f.write_str("Pattern"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn check_arity(expected: &[Arg], actual: &[Arg]) -> Result<(), Rejection> {
    if expected.len() == actual.len() {
        return Ok(());
    }
    Err(Rejection::Diagnostic(format!(
        "argument count differs: expected {}, got {}",
        expected.len(),
        actual.len()
    )))
}

fn exact_args(expected: &[Arg], actual: &[Arg]) -> Result<(), Rejection> {
    check_arity(expected, actual)?;
    for (position, (want, got)) in expected.iter().zip(actual).enumerate() {
        if want.canonical() != got.canonical() {
            return Err(Rejection::Diagnostic(format!(
                "argument {position} differs: expected {} `{want}`, got {} `{got}`",
                want.kind(),
                got.kind()
            )));
        }
    }
    Ok(())
}

/// Anchored expressions of one pattern expectation, keyed by their source text.
///
/// Every string descriptor is compiled once, map keys and values included. A source that
/// fails to compile keeps its diagnostic and rejects every call that reaches it.
#[derive(Debug, Clone, Default)]
pub struct CompiledPatterns {
    compiled: HotMap<String, Result<Regex, String>>,
}

impl CompiledPatterns {
    /// Compiles every string descriptor in `args`.
    #[must_use]
    pub fn compile(args: &[Arg]) -> Self {
        let mut patterns = Self::default();
        for arg in args {
            patterns.collect(arg);
        }
        patterns
    }

    /// Diagnostics of the sources that failed to compile.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.compiled
            .values()
            .filter_map(|compiled| compiled.as_ref().err().map(String::as_str))
    }

    fn collect(&mut self, arg: &Arg) {
        match arg {
            Arg::Str(pattern) => {
                if !self.compiled.contains_key(pattern.as_str()) {
                    let compiled = Regex::new(&format!("^(?:{pattern})$"))
                        .map_err(|error| format!("invalid pattern `{pattern}`: {error}"));
                    let _ = self.compiled.insert(pattern.clone(), compiled);
                }
            }
            Arg::Map(pairs) => {
                for (key, value) in pairs {
                    self.collect(key);
                    self.collect(value);
                }
            }
            _ => {}
        }
    }

    fn check(&self, expected: &[Arg], actual: &[Arg]) -> Result<(), Rejection> {
        check_arity(expected, actual)?;
        for (position, (want, got)) in expected.iter().zip(actual).enumerate() {
            if !self.arg(want, got).map_err(Rejection::Diagnostic)? {
                return Err(Rejection::Diagnostic(format!(
                    "argument {position} does not match: expected `{want}`, got `{got}`"
                )));
            }
        }
        Ok(())
    }

    fn arg(&self, want: &Arg, got: &Arg) -> Result<bool, String> {
        match (want, got) {
            (Arg::Str(pattern), _) => self.full_match(pattern, &got.to_string()),
            (Arg::Map(want_pairs), Arg::Map(got_pairs)) => {
                if want_pairs.len() != got_pairs.len() {
                    return Ok(false);
                }
                let mut used = vec![false; got_pairs.len()];
                self.assign_pairs(want_pairs, got_pairs, &mut used)
            }
            _ => Ok(want.canonical() == got.canonical()),
        }
    }

    /// Finds a one-to-one assignment of expected pairs onto actual pairs, backtracking when
    /// an earlier, broader pattern took a pair a later one needs.
    fn assign_pairs(
        &self,
        want: &[(Arg, Arg)],
        got: &[(Arg, Arg)],
        used: &mut [bool],
    ) -> Result<bool, String> {
        let Some(((want_key, want_value), rest)) = want.split_first() else {
            return Ok(true);
        };
        for (index, (got_key, got_value)) in got.iter().enumerate() {
            if used[index] || !self.arg(want_key, got_key)? || !self.arg(want_value, got_value)? {
                continue;
            }
            used[index] = true;
            if self.assign_pairs(rest, got, used)? {
                return Ok(true);
            }
            used[index] = false;
        }
        Ok(false)
    }

    fn full_match(&self, pattern: &str, text: &str) -> Result<bool, String> {
        let anchored = match self.compiled.get(pattern) {
            Some(Ok(anchored)) => anchored,
            Some(Err(reason)) => return Err(reason.clone()),
            None => return Err(format!("pattern `{pattern}` was not compiled")),
        };
        let matched = anchored.is_match(text);
        tracing::trace!(pattern, text, matched, "pattern argument check");
        Ok(matched)
    }
}
