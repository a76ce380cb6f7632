//! Command bindings shared by every client handle.

use std::time::Duration;

use kvmock_core::command::Arg;
use kvmock_core::interceptor::Interceptor;

use crate::cmd::{
    BoolCmd, Cmder, IntCmd, MapStringStringCmd, RawCmd, SliceCmd, StatusCmd, StringCmd,
    StringSliceCmd,
};
use crate::cmds;

/// Resolves one command through the interceptor and stores the result in it.
pub(crate) fn dispatch<C: Cmder>(interceptor: &dyn Interceptor, mut cmd: C) -> C {
    let reply = interceptor.process_command(cmd.frame());
    cmd.apply(reply);
    cmd
}

/// Typed command bindings.
///
/// Implementors only decide what running a command means: direct handles resolve it right
/// away and hand back the populated command, pipelines queue it and hand back a slot.
pub trait Commands {
    /// What a binding returns for a command of type `C`.
    type Output<C: Cmder>;

    /// Runs or queues one prepared command.
    fn run<C: Cmder>(&self, cmd: C) -> Self::Output<C>;

    fn do_cmd<I, A>(&self, name: &str, args: I) -> Self::Output<RawCmd>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.run(cmds::do_cmd(name, args))
    }

    fn ping(&self) -> Self::Output<StatusCmd> {
        self.run(cmds::ping())
    }

    fn echo(&self, message: impl Into<Arg>) -> Self::Output<StringCmd> {
        self.run(cmds::echo(message))
    }

    fn del<I, K>(&self, keys: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.run(cmds::del(keys))
    }

    fn exists<I, K>(&self, keys: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.run(cmds::exists(keys))
    }

    fn expire(&self, key: impl Into<Arg>, expiration: Duration) -> Self::Output<BoolCmd> {
        self.run(cmds::expire(key, expiration))
    }

    fn ttl(&self, key: impl Into<Arg>) -> Self::Output<IntCmd> {
        self.run(cmds::ttl(key))
    }

    fn keys(&self, pattern: impl Into<Arg>) -> Self::Output<StringSliceCmd> {
        self.run(cmds::keys(pattern))
    }

    fn get(&self, key: impl Into<Arg>) -> Self::Output<StringCmd> {
        self.run(cmds::get(key))
    }

    fn set(
        &self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
        expiration: Duration,
    ) -> Self::Output<StatusCmd> {
        self.run(cmds::set(key, value, expiration))
    }

    fn set_nx(
        &self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
        expiration: Duration,
    ) -> Self::Output<BoolCmd> {
        self.run(cmds::set_nx(key, value, expiration))
    }

    fn get_set(&self, key: impl Into<Arg>, value: impl Into<Arg>) -> Self::Output<StringCmd> {
        self.run(cmds::get_set(key, value))
    }

    fn incr(&self, key: impl Into<Arg>) -> Self::Output<IntCmd> {
        self.run(cmds::incr(key))
    }

    fn incr_by(&self, key: impl Into<Arg>, increment: i64) -> Self::Output<IntCmd> {
        self.run(cmds::incr_by(key, increment))
    }

    fn decr(&self, key: impl Into<Arg>) -> Self::Output<IntCmd> {
        self.run(cmds::decr(key))
    }

    fn append(&self, key: impl Into<Arg>, value: impl Into<Arg>) -> Self::Output<IntCmd> {
        self.run(cmds::append(key, value))
    }

    fn mget<I, K>(&self, keys: I) -> Self::Output<SliceCmd>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.run(cmds::mget(keys))
    }

    fn mset<I, K, V>(&self, pairs: I) -> Self::Output<StatusCmd>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        self.run(cmds::mset(pairs))
    }

    fn mset_flat<I, A>(&self, items: I) -> Self::Output<StatusCmd>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.run(cmds::mset_flat(items))
    }

    fn mset_nx<I, K, V>(&self, pairs: I) -> Self::Output<BoolCmd>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        self.run(cmds::mset_nx(pairs))
    }

    fn hget(&self, key: impl Into<Arg>, field: impl Into<Arg>) -> Self::Output<StringCmd> {
        self.run(cmds::hget(key, field))
    }

    fn hset<I, F, V>(&self, key: impl Into<Arg>, pairs: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Arg>,
        V: Into<Arg>,
    {
        self.run(cmds::hset(key, pairs))
    }

    fn hset_flat<I, A>(&self, key: impl Into<Arg>, items: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.run(cmds::hset_flat(key, items))
    }

    fn hgetall(&self, key: impl Into<Arg>) -> Self::Output<MapStringStringCmd> {
        self.run(cmds::hgetall(key))
    }

    fn hdel<I, F>(&self, key: impl Into<Arg>, fields: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = F>,
        F: Into<Arg>,
    {
        self.run(cmds::hdel(key, fields))
    }

    fn hincr_by(
        &self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        increment: i64,
    ) -> Self::Output<IntCmd> {
        self.run(cmds::hincr_by(key, field, increment))
    }

    fn lpush<I, V>(&self, key: impl Into<Arg>, values: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        self.run(cmds::lpush(key, values))
    }

    fn rpush<I, V>(&self, key: impl Into<Arg>, values: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        self.run(cmds::rpush(key, values))
    }

    fn lrange(&self, key: impl Into<Arg>, start: i64, stop: i64) -> Self::Output<StringSliceCmd> {
        self.run(cmds::lrange(key, start, stop))
    }

    fn lpop(&self, key: impl Into<Arg>) -> Self::Output<StringCmd> {
        self.run(cmds::lpop(key))
    }

    fn sadd<I, M>(&self, key: impl Into<Arg>, members: I) -> Self::Output<IntCmd>
    where
        I: IntoIterator<Item = M>,
        M: Into<Arg>,
    {
        self.run(cmds::sadd(key, members))
    }

    fn smembers(&self, key: impl Into<Arg>) -> Self::Output<StringSliceCmd> {
        self.run(cmds::smembers(key))
    }
}
