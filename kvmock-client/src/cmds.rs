//! Constructors for unprocessed commands.
//!
//! Client bindings and expectation builders share these so an expectation declared as
//! `expect_set("key", "value", ttl)` produces exactly the frame that `set("key", "value", ttl)`
//! issues.

use std::time::Duration;

use kvmock_core::command::{Arg, CommandFrame};

use crate::cmd::{
    BoolCmd, Cmd, IntCmd, MapStringStringCmd, RawCmd, SliceCmd, StatusCmd, StringCmd,
    StringSliceCmd,
};

fn build<T>(name: &str, args: Vec<Arg>) -> Cmd<T> {
    Cmd::new(CommandFrame::new(name, args))
}

fn collect<I, A>(items: I) -> Vec<Arg>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    items.into_iter().map(Into::into).collect()
}

fn prefixed<I, A>(first: Arg, rest: I) -> Vec<Arg>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    let mut args = vec![first];
    args.extend(rest.into_iter().map(Into::into));
    args
}

fn millis(expiration: Duration) -> i64 {
    i64::try_from(expiration.as_millis()).unwrap_or(i64::MAX)
}

fn seconds(expiration: Duration) -> i64 {
    i64::try_from(expiration.as_secs()).unwrap_or(i64::MAX)
}

/// Expiration suffix: nothing for zero, `px <ms>` below one second or for fractional seconds,
/// `ex <secs>` otherwise.
pub(crate) fn expiration_args(expiration: Duration) -> Vec<Arg> {
    if expiration.is_zero() {
        Vec::new()
    } else if expiration < Duration::from_secs(1) || expiration.subsec_nanos() != 0 {
        vec![Arg::from("px"), Arg::Int(millis(expiration))]
    } else {
        vec![Arg::from("ex"), Arg::Int(seconds(expiration))]
    }
}

/// Arbitrary command.
pub fn do_cmd<I, A>(name: &str, args: I) -> RawCmd
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    build(name, collect(args))
}

pub fn ping() -> StatusCmd {
    build("ping", Vec::new())
}

pub fn echo(message: impl Into<Arg>) -> StringCmd {
    build("echo", vec![message.into()])
}

pub fn del<I, K>(keys: I) -> IntCmd
where
    I: IntoIterator<Item = K>,
    K: Into<Arg>,
{
    build("del", collect(keys))
}

pub fn exists<I, K>(keys: I) -> IntCmd
where
    I: IntoIterator<Item = K>,
    K: Into<Arg>,
{
    build("exists", collect(keys))
}

/// `expire key <secs>`. A non-zero expiration below one second is sent as `1`.
pub fn expire(key: impl Into<Arg>, expiration: Duration) -> BoolCmd {
    let secs = if expiration > Duration::ZERO && expiration < Duration::from_secs(1) {
        1
    } else {
        seconds(expiration)
    };
    build("expire", vec![key.into(), Arg::Int(secs)])
}

pub fn ttl(key: impl Into<Arg>) -> IntCmd {
    build("ttl", vec![key.into()])
}

pub fn keys(pattern: impl Into<Arg>) -> StringSliceCmd {
    build("keys", vec![pattern.into()])
}

pub fn get(key: impl Into<Arg>) -> StringCmd {
    build("get", vec![key.into()])
}

/// `set key value [ex secs | px ms]`.
pub fn set(key: impl Into<Arg>, value: impl Into<Arg>, expiration: Duration) -> StatusCmd {
    let mut args = vec![key.into(), value.into()];
    args.extend(expiration_args(expiration));
    build("set", args)
}

/// `setnx key value` without expiration, `set key value <expiration> nx` with one.
pub fn set_nx(key: impl Into<Arg>, value: impl Into<Arg>, expiration: Duration) -> BoolCmd {
    if expiration.is_zero() {
        return build("setnx", vec![key.into(), value.into()]);
    }
    let mut args = vec![key.into(), value.into()];
    args.extend(expiration_args(expiration));
    args.push(Arg::from("nx"));
    build("set", args)
}

pub fn get_set(key: impl Into<Arg>, value: impl Into<Arg>) -> StringCmd {
    build("getset", vec![key.into(), value.into()])
}

pub fn incr(key: impl Into<Arg>) -> IntCmd {
    build("incr", vec![key.into()])
}

pub fn incr_by(key: impl Into<Arg>, increment: i64) -> IntCmd {
    build("incrby", vec![key.into(), Arg::Int(increment)])
}

pub fn decr(key: impl Into<Arg>) -> IntCmd {
    build("decr", vec![key.into()])
}

pub fn append(key: impl Into<Arg>, value: impl Into<Arg>) -> IntCmd {
    build("append", vec![key.into(), value.into()])
}

pub fn mget<I, K>(keys: I) -> SliceCmd
where
    I: IntoIterator<Item = K>,
    K: Into<Arg>,
{
    build("mget", collect(keys))
}

/// `mset` from key/value pairs. Pair order does not affect matching.
pub fn mset<I, K, V>(pairs: I) -> StatusCmd
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arg>,
    V: Into<Arg>,
{
    build("mset", vec![Arg::map(pairs)])
}

/// `mset` from a flattened `key value key value ...` list.
pub fn mset_flat<I, A>(items: I) -> StatusCmd
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    build("mset", Arg::pairs_from_flat(items))
}

pub fn mset_nx<I, K, V>(pairs: I) -> BoolCmd
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arg>,
    V: Into<Arg>,
{
    build("msetnx", vec![Arg::map(pairs)])
}

pub fn hget(key: impl Into<Arg>, field: impl Into<Arg>) -> StringCmd {
    build("hget", vec![key.into(), field.into()])
}

/// `hset key` followed by field/value pairs. Pair order does not affect matching.
pub fn hset<I, F, V>(key: impl Into<Arg>, pairs: I) -> IntCmd
where
    I: IntoIterator<Item = (F, V)>,
    F: Into<Arg>,
    V: Into<Arg>,
{
    build("hset", vec![key.into(), Arg::map(pairs)])
}

/// `hset key` followed by a flattened `field value ...` list.
pub fn hset_flat<I, A>(key: impl Into<Arg>, items: I) -> IntCmd
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    let mut args = vec![key.into()];
    args.extend(Arg::pairs_from_flat(items));
    build("hset", args)
}

pub fn hgetall(key: impl Into<Arg>) -> MapStringStringCmd {
    build("hgetall", vec![key.into()])
}

pub fn hdel<I, F>(key: impl Into<Arg>, fields: I) -> IntCmd
where
    I: IntoIterator<Item = F>,
    F: Into<Arg>,
{
    build("hdel", prefixed(key.into(), fields))
}

pub fn hincr_by(key: impl Into<Arg>, field: impl Into<Arg>, increment: i64) -> IntCmd {
    build("hincrby", vec![key.into(), field.into(), Arg::Int(increment)])
}

pub fn lpush<I, V>(key: impl Into<Arg>, values: I) -> IntCmd
where
    I: IntoIterator<Item = V>,
    V: Into<Arg>,
{
    build("lpush", prefixed(key.into(), values))
}

pub fn rpush<I, V>(key: impl Into<Arg>, values: I) -> IntCmd
where
    I: IntoIterator<Item = V>,
    V: Into<Arg>,
{
    build("rpush", prefixed(key.into(), values))
}

pub fn lrange(key: impl Into<Arg>, start: i64, stop: i64) -> StringSliceCmd {
    build("lrange", vec![key.into(), Arg::Int(start), Arg::Int(stop)])
}

pub fn lpop(key: impl Into<Arg>) -> StringCmd {
    build("lpop", vec![key.into()])
}

pub fn sadd<I, M>(key: impl Into<Arg>, members: I) -> IntCmd
where
    I: IntoIterator<Item = M>,
    M: Into<Arg>,
{
    build("sadd", prefixed(key.into(), members))
}

pub fn smembers(key: impl Into<Arg>) -> StringSliceCmd {
    build("smembers", vec![key.into()])
}

/// `watch key ...`.
pub fn watch<I, K>(keys: I) -> Cmd<()>
where
    I: IntoIterator<Item = K>,
    K: Into<Arg>,
{
    build("watch", collect(keys))
}

#[cfg(test)]
mod tests {
    use super::{expiration_args, expire, hset_flat, mset, mset_flat, set, set_nx};
    use googletest::prelude::*;
    use kvmock_core::command::Arg;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(Duration::ZERO, "set key value")]
    #[case(Duration::from_secs(60), "set key value ex 60")]
    #[case(Duration::from_millis(500), "set key value px 500")]
    #[case(Duration::from_millis(1500), "set key value px 1500")]
    fn set_encodes_expiration(#[case] expiration: Duration, #[case] expected: &str) {
        let cmd = set("key", "value", expiration);
        assert_that!(cmd.command().to_string().as_str(), eq(expected));
    }

    #[rstest]
    fn set_nx_switches_to_set_with_nx_flag_when_expiring() {
        assert_that!(
            set_nx("key", "value", Duration::ZERO).command().to_string().as_str(),
            eq("setnx key value")
        );
        assert_that!(
            set_nx("key", "value", Duration::from_secs(5)).command().to_string().as_str(),
            eq("set key value ex 5 nx")
        );
    }

    #[rstest]
    #[case(Duration::from_millis(1), "expire key 1")]
    #[case(Duration::from_millis(999), "expire key 1")]
    #[case(Duration::from_millis(2500), "expire key 2")]
    #[case(Duration::ZERO, "expire key 0")]
    fn expire_clamps_sub_second_durations(#[case] expiration: Duration, #[case] expected: &str) {
        let cmd = expire("key", expiration);
        assert_that!(cmd.command().to_string().as_str(), eq(expected));
    }

    #[rstest]
    fn expiration_args_are_empty_for_zero() {
        assert_that!(expiration_args(Duration::ZERO).is_empty(), eq(true));
    }

    #[rstest]
    fn mset_pairs_and_flat_list_produce_equal_canonical_args() {
        let from_pairs = mset([("key1", "value1"), ("key2", "value2")]);
        let from_flat = mset_flat(["key2", "value2", "key1", "value1"]);
        let canonical = |args: &[Arg]| args.iter().map(Arg::canonical).collect::<Vec<_>>();
        assert_that!(
            &canonical(&from_pairs.command().args),
            eq(&canonical(&from_flat.command().args))
        );
    }

    #[rstest]
    fn hset_flat_keeps_key_before_pairs() {
        let cmd = hset_flat("hash", ["field", "value"]);
        assert_that!(cmd.command().to_string().as_str(), eq("hset hash field value"));
    }
}
