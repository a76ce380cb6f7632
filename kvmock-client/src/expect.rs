//! Expectation builders and the control surface shared by every mock handle.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use kvmock_common::config::MatchMode;
use kvmock_common::error::{MockError, MockResult};
use kvmock_common::ids::{ExpectationId, Sequence};
use kvmock_core::command::{Arg, Reply};
use kvmock_core::diagnostics::UnexpectedCall;
use kvmock_core::engine::MockEngine;
use kvmock_core::expectation::{ExpectationSummary, Outcome, Role};
use kvmock_core::matcher::Matcher;

use crate::cmd::{Cmd, IntoReply};
use crate::cmds;

/// Handle on one registered expectation, used to configure its outcome.
///
/// Setters overwrite each other; the last write before the expectation is matched wins.
/// After the mock is cleared the handle goes inert.
pub struct Expected<T> {
    engine: Arc<MockEngine>,
    id: ExpectationId,
    _value: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Expected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expected")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T> Expected<T> {
    /// Registration sequence of the expectation.
    #[must_use]
    pub fn sequence(&self) -> Sequence {
        self.id.sequence()
    }

    #[must_use]
    pub fn id(&self) -> ExpectationId {
        self.id
    }

    /// Makes the matched command fail with `error`.
    pub fn set_err(&self, error: impl Into<MockError>) -> &Self {
        self.set_outcome(Outcome::Error(error.into()))
    }

    /// Makes the matched command report a missing key.
    pub fn set_nil_result(&self) -> &Self {
        self.set_outcome(Outcome::Error(MockError::Nil))
    }

    /// Stores a raw reply regardless of the command's result type.
    pub fn set_reply(&self, reply: Reply) -> &Self {
        self.set_outcome(Outcome::Value(reply))
    }

    fn set_outcome(&self, outcome: Outcome) -> &Self {
        self.engine.set_outcome(self.id, outcome);
        self
    }
}

impl<T: IntoReply> Expected<T> {
    /// Makes the matched command succeed with `value`.
    pub fn set_val(&self, value: impl Into<T>) -> &Self {
        self.set_reply(value.into().into_reply())
    }
}

pub(crate) fn register<T>(
    engine: &Arc<MockEngine>,
    cmd: Cmd<T>,
    matcher: Matcher,
    role: Role,
) -> Expected<T> {
    let id = engine.register(cmd.command().clone(), matcher, role);
    Expected {
        engine: Arc::clone(engine),
        id,
        _value: PhantomData,
    }
}

/// Expectation factories.
///
/// Implemented for `&M` of every mock handle (exact matching) and for [`MatchScope`]
/// (pattern or custom matching for a single registration).
pub trait Expectations: Sized {
    /// Registers an expectation for a prepared command.
    fn expect_cmd<T>(self, cmd: Cmd<T>) -> Expected<T>;

    /// Expectation for an arbitrary command.
    fn expect<I, A>(self, name: &str, args: I) -> Expected<Reply>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.expect_cmd(cmds::do_cmd(name, args))
    }

    fn expect_ping(self) -> Expected<String> {
        self.expect_cmd(cmds::ping())
    }

    fn expect_echo(self, message: impl Into<Arg>) -> Expected<String> {
        self.expect_cmd(cmds::echo(message))
    }

    fn expect_del<I, K>(self, keys: I) -> Expected<i64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.expect_cmd(cmds::del(keys))
    }

    fn expect_exists<I, K>(self, keys: I) -> Expected<i64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.expect_cmd(cmds::exists(keys))
    }

    fn expect_expire(self, key: impl Into<Arg>, expiration: Duration) -> Expected<bool> {
        self.expect_cmd(cmds::expire(key, expiration))
    }

    fn expect_ttl(self, key: impl Into<Arg>) -> Expected<i64> {
        self.expect_cmd(cmds::ttl(key))
    }

    fn expect_keys(self, pattern: impl Into<Arg>) -> Expected<Vec<String>> {
        self.expect_cmd(cmds::keys(pattern))
    }

    fn expect_get(self, key: impl Into<Arg>) -> Expected<String> {
        self.expect_cmd(cmds::get(key))
    }

    fn expect_set(
        self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
        expiration: Duration,
    ) -> Expected<String> {
        self.expect_cmd(cmds::set(key, value, expiration))
    }

    fn expect_set_nx(
        self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
        expiration: Duration,
    ) -> Expected<bool> {
        self.expect_cmd(cmds::set_nx(key, value, expiration))
    }

    fn expect_get_set(self, key: impl Into<Arg>, value: impl Into<Arg>) -> Expected<String> {
        self.expect_cmd(cmds::get_set(key, value))
    }

    fn expect_incr(self, key: impl Into<Arg>) -> Expected<i64> {
        self.expect_cmd(cmds::incr(key))
    }

    fn expect_incr_by(self, key: impl Into<Arg>, increment: i64) -> Expected<i64> {
        self.expect_cmd(cmds::incr_by(key, increment))
    }

    fn expect_decr(self, key: impl Into<Arg>) -> Expected<i64> {
        self.expect_cmd(cmds::decr(key))
    }

    fn expect_append(self, key: impl Into<Arg>, value: impl Into<Arg>) -> Expected<i64> {
        self.expect_cmd(cmds::append(key, value))
    }

    fn expect_mget<I, K>(self, keys: I) -> Expected<Vec<Option<String>>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.expect_cmd(cmds::mget(keys))
    }

    fn expect_mset<I, K, V>(self, pairs: I) -> Expected<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        self.expect_cmd(cmds::mset(pairs))
    }

    fn expect_mset_flat<I, A>(self, items: I) -> Expected<String>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.expect_cmd(cmds::mset_flat(items))
    }

    fn expect_mset_nx<I, K, V>(self, pairs: I) -> Expected<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        self.expect_cmd(cmds::mset_nx(pairs))
    }

    fn expect_hget(self, key: impl Into<Arg>, field: impl Into<Arg>) -> Expected<String> {
        self.expect_cmd(cmds::hget(key, field))
    }

    fn expect_hset<I, F, V>(self, key: impl Into<Arg>, pairs: I) -> Expected<i64>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Arg>,
        V: Into<Arg>,
    {
        self.expect_cmd(cmds::hset(key, pairs))
    }

    fn expect_hset_flat<I, A>(self, key: impl Into<Arg>, items: I) -> Expected<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.expect_cmd(cmds::hset_flat(key, items))
    }

    fn expect_hgetall(self, key: impl Into<Arg>) -> Expected<HashMap<String, String>> {
        self.expect_cmd(cmds::hgetall(key))
    }

    fn expect_hdel<I, F>(self, key: impl Into<Arg>, fields: I) -> Expected<i64>
    where
        I: IntoIterator<Item = F>,
        F: Into<Arg>,
    {
        self.expect_cmd(cmds::hdel(key, fields))
    }

    fn expect_hincr_by(
        self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        increment: i64,
    ) -> Expected<i64> {
        self.expect_cmd(cmds::hincr_by(key, field, increment))
    }

    fn expect_lpush<I, V>(self, key: impl Into<Arg>, values: I) -> Expected<i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        self.expect_cmd(cmds::lpush(key, values))
    }

    fn expect_rpush<I, V>(self, key: impl Into<Arg>, values: I) -> Expected<i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        self.expect_cmd(cmds::rpush(key, values))
    }

    fn expect_lrange(self, key: impl Into<Arg>, start: i64, stop: i64) -> Expected<Vec<String>> {
        self.expect_cmd(cmds::lrange(key, start, stop))
    }

    fn expect_lpop(self, key: impl Into<Arg>) -> Expected<String> {
        self.expect_cmd(cmds::lpop(key))
    }

    fn expect_sadd<I, M>(self, key: impl Into<Arg>, members: I) -> Expected<i64>
    where
        I: IntoIterator<Item = M>,
        M: Into<Arg>,
    {
        self.expect_cmd(cmds::sadd(key, members))
    }

    fn expect_smembers(self, key: impl Into<Arg>) -> Expected<Vec<String>> {
        self.expect_cmd(cmds::smembers(key))
    }
}

/// Single-use expectation factory carrying a non-default matcher.
///
/// Obtained from [`BaseMock::regexp`] or [`BaseMock::custom_match`]; the matcher applies to
/// the one expectation it registers.
#[derive(Debug)]
pub struct MatchScope<'a> {
    engine: &'a Arc<MockEngine>,
    matcher: Matcher,
}

impl Expectations for MatchScope<'_> {
    fn expect_cmd<T>(self, cmd: Cmd<T>) -> Expected<T> {
        register(self.engine, cmd, self.matcher, Role::Normal)
    }
}

/// Control surface shared by the single-node and cluster mocks.
pub trait BaseMock {
    /// Engine backing this mock.
    fn engine(&self) -> &Arc<MockEngine>;

    /// Next registration treats every string argument as a regular expression that must match
    /// the whole actual argument.
    fn regexp(&self) -> MatchScope<'_> {
        MatchScope {
            engine: self.engine(),
            matcher: Matcher::Pattern,
        }
    }

    /// Next registration is decided by `f(expected_args, actual_args)`.
    ///
    /// Both argument lists carry the command name first. The function only runs for calls
    /// with the same command name, and its error is returned to the caller unchanged.
    fn custom_match<F>(&self, f: F) -> MatchScope<'_>
    where
        F: Fn(&[Arg], &[Arg]) -> MockResult<()> + Send + Sync + 'static,
    {
        MatchScope {
            engine: self.engine(),
            matcher: Matcher::custom(f),
        }
    }

    /// Switches between strict-order and any-order matching.
    fn match_expectations_in_order(&self, in_order: bool) {
        self.engine().set_mode(MatchMode::from_in_order(in_order));
    }

    /// Discards every expectation and recorded call and restores the default mode.
    fn clear_expect(&self) {
        self.engine().clear();
    }

    /// Pending expectations, in registration order.
    fn pending_expectations(&self) -> Vec<ExpectationSummary> {
        self.engine().pending()
    }

    /// Checks that every registered expectation was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::UnmetExpectations`] naming each pending expectation.
    fn expectations_were_met(&self) -> MockResult<()> {
        self.engine().expectations_were_met()
    }
}

impl<M: BaseMock> Expectations for &M {
    fn expect_cmd<T>(self, cmd: Cmd<T>) -> Expected<T> {
        register(self.engine(), cmd, Matcher::Exact, Role::Normal)
    }
}

/// Access to commands that matched no expectation.
pub trait UnexpectedCallLog: BaseMock {
    /// Whether any command missed the queue, and the recorded misses in arrival order.
    fn unexpected_calls_were_made(&self) -> (bool, Vec<UnexpectedCall>) {
        let calls = self.engine().unexpected_calls();
        (!calls.is_empty(), calls)
    }

    /// Checks that no command missed the queue.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::UnexpectedCalls`] listing every miss.
    fn verify_no_unexpected_calls(&self) -> MockResult<()> {
        self.engine().verify_no_unexpected_calls()
    }
}
