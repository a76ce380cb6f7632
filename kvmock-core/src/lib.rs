//! Expectation-matching engine behind the `kvmock` key-value client test double.
//!
//! Tests register expectations (command name, arguments, canned outcome) on a [`MockEngine`];
//! client handles hand every issued command to the engine through the [`Interceptor`] seam,
//! and the engine replays the outcome of the matching expectation instead of doing I/O.

pub mod bracket;
pub mod command;
pub mod containers;
pub mod diagnostics;
pub mod engine;
pub mod expectation;
pub mod interceptor;
pub mod matcher;
pub mod queue;

pub use command::{Arg, CommandFrame, Reply};
pub use diagnostics::UnexpectedCall;
pub use engine::MockEngine;
pub use expectation::{ExpectationSummary, Outcome, Role};
pub use interceptor::Interceptor;
pub use matcher::{CompiledPatterns, CustomMatchFn, Matcher, MatcherKind};
