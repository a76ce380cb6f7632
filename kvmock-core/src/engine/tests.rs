use super::MockEngine;
use crate::command::{Arg, CommandFrame, Reply};
use crate::expectation::{Outcome, Role};
use crate::interceptor::Interceptor;
use crate::matcher::Matcher;
use googletest::prelude::*;
use kvmock_common::config::{MatchMode, MockConfig};
use kvmock_common::error::MockError;
use kvmock_common::ids::{ExpectationId, Sequence};
use rstest::rstest;
use std::sync::Arc;

fn frame(name: &str, args: &[&str]) -> CommandFrame {
    CommandFrame::new(name, args.iter().map(|arg| Arg::from(*arg)).collect())
}

fn bulk(value: &str) -> Reply {
    Reply::BulkString(value.as_bytes().to_vec())
}

fn expect_value(engine: &MockEngine, command: CommandFrame, reply: Reply) -> ExpectationId {
    let id = engine.register(command, Matcher::Exact, Role::Normal);
    engine.set_outcome(id, Outcome::Value(reply));
    id
}

fn expect_bracket(engine: &MockEngine, payload: &[(CommandFrame, Reply)]) {
    let _ = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    for (command, reply) in payload {
        let _ = expect_value(engine, command.clone(), reply.clone());
    }
    let _ = engine.register(frame("exec", &[]), Matcher::Exact, Role::TxEnd);
}

#[rstest]
fn get_set_get_scenario_replays_in_order() {
    let engine = MockEngine::default();
    let set = CommandFrame::new(
        "set",
        vec![Arg::from("key"), Arg::from("1"), Arg::from("ex"), Arg::from(60)],
    );
    let _ = expect_value(&engine, frame("get", &["key"]), bulk("1"));
    let _ = expect_value(&engine, set.clone(), Reply::ok());
    let _ = expect_value(&engine, frame("get", &["key"]), bulk("1"));

    assert_that!(&engine.process_command(&frame("get", &["key"])), eq(&Ok(bulk("1"))));
    assert_that!(engine.pending().len(), eq(2_usize));
    assert_that!(&engine.process_command(&set), eq(&Ok(Reply::ok())));
    assert_that!(&engine.process_command(&frame("get", &["key"])), eq(&Ok(bulk("1"))));
    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
    assert_that!(&engine.verify_no_unexpected_calls(), eq(&Ok(())));
}

#[rstest]
fn ordered_strictness_rejects_out_of_order_call_and_keeps_both_pending() {
    let engine = MockEngine::default();
    let _ = expect_value(&engine, frame("get", &["a"]), bulk("A"));
    let _ = expect_value(&engine, frame("hget", &["h", "f"]), bulk("B"));

    let out_of_order = engine.process_command(&frame("hget", &["h", "f"]));
    assert_that!(
        &out_of_order,
        eq(&Err(MockError::NoMatch {
            call: "hget h f".to_owned(),
            queue_empty: false,
        }))
    );
    assert_that!(engine.pending().len(), eq(2_usize));
    assert_that!(engine.unexpected_calls().len(), eq(1_usize));

    assert_that!(&engine.process_command(&frame("get", &["a"])), eq(&Ok(bulk("A"))));
    assert_that!(&engine.process_command(&frame("hget", &["h", "f"])), eq(&Ok(bulk("B"))));
}

#[rstest]
fn unordered_mode_accepts_reverse_order() {
    let engine = MockEngine::default();
    engine.set_mode(MatchMode::Unordered);
    let _ = expect_value(&engine, frame("get", &["a"]), bulk("A"));
    let _ = expect_value(&engine, frame("hget", &["h", "f"]), bulk("B"));

    assert_that!(&engine.process_command(&frame("hget", &["h", "f"])), eq(&Ok(bulk("B"))));
    assert_that!(&engine.process_command(&frame("get", &["a"])), eq(&Ok(bulk("A"))));
    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
}

#[rstest]
fn exhausted_queue_reports_fulfilled_expectations() {
    let engine = MockEngine::default();
    assert_that!(
        &engine.process_command(&frame("get", &["a"])),
        eq(&Err(MockError::NoMatch {
            call: "get a".to_owned(),
            queue_empty: true,
        }))
    );
}

#[rstest]
fn mismatch_carries_expected_and_actual() {
    let engine = MockEngine::default();
    let _ = expect_value(&engine, frame("get", &["a"]), bulk("A"));
    let Err(MockError::Mismatch {
        expected, actual, ..
    }) = engine.process_command(&frame("get", &["b"]))
    else {
        panic!("same command with other args must mismatch");
    };
    assert_that!(expected.as_str(), eq("get a"));
    assert_that!(actual.as_str(), eq("get b"));
}

#[rstest]
fn custom_error_surfaces_only_for_same_named_command() {
    let engine = MockEngine::default();
    let sequence = engine.register(
        frame("get", &["key"]),
        Matcher::custom(|_, _| Err(MockError::from("mismatch"))),
        Role::Normal,
    );
    engine.set_outcome(sequence, Outcome::Value(Reply::ok()));

    assert_that!(
        &engine.process_command(&frame("get", &["key"])),
        eq(&Err(MockError::from("mismatch")))
    );
    let other = engine.process_command(&frame("incr", &["key"]));
    assert_that!(matches!(other, Err(MockError::NoMatch { .. })), eq(true));
    assert_that!(engine.expectations_were_met().is_err(), eq(true));
}

#[rstest]
fn pattern_expectation_matches_digits_only() {
    let engine = MockEngine::default();
    let sequence = engine.register(frame("get", &["^[0-9]+$"]), Matcher::Pattern, Role::Normal);
    engine.set_outcome(sequence, Outcome::Value(Reply::ok()));

    assert_that!(engine.process_command(&frame("get", &["abc"])).is_err(), eq(true));
    assert_that!(&engine.process_command(&frame("get", &["123"])), eq(&Ok(Reply::ok())));
}

#[rstest]
fn unset_and_configured_outcomes_resolve_as_errors() {
    let engine = MockEngine::default();
    let _ = engine.register(frame("get", &["unset"]), Matcher::Exact, Role::Normal);
    let failing = engine.register(frame("get", &["err"]), Matcher::Exact, Role::Normal);
    engine.set_outcome(failing, Outcome::Error(MockError::from("set error")));
    let missing = engine.register(frame("get", &["nil"]), Matcher::Exact, Role::Normal);
    engine.set_outcome(missing, Outcome::Error(MockError::Nil));

    assert_that!(
        &engine.process_command(&frame("get", &["unset"])),
        eq(&Err(MockError::UnsetOutcome {
            command: "get".to_owned()
        }))
    );
    assert_that!(
        &engine.process_command(&frame("get", &["err"])),
        eq(&Err(MockError::from("set error")))
    );
    assert_that!(&engine.process_command(&frame("get", &["nil"])), eq(&Err(MockError::Nil)));
    assert_that!(&engine.verify_no_unexpected_calls(), eq(&Ok(())));
}

#[rstest]
fn pipeline_matches_each_frame_like_sequential_calls() {
    let engine = MockEngine::default();
    let _ = expect_value(&engine, frame("get", &["key1"]), bulk("one"));
    let _ = expect_value(&engine, frame("hget", &["hash", "field"]), bulk("two"));

    let replies = engine.process_pipeline(&[frame("get", &["key1"]), frame("hget", &["hash", "field"])]);
    assert_that!(&replies, eq(&vec![Ok(bulk("one")), Ok(bulk("two"))]));
    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
}

#[rstest]
fn transaction_without_begin_fails_wholly_without_consuming_payload() {
    let engine = MockEngine::default();
    let _ = expect_value(&engine, frame("get", &["key1"]), bulk("one"));
    let _ = engine.register(frame("exec", &[]), Matcher::Exact, Role::TxEnd);

    let result = engine.process_transaction(&[frame("get", &["key1"])]);
    assert_that!(
        &result,
        eq(&Err(MockError::TransactionNotExpected {
            reason: "no pending begin expectation".to_owned()
        }))
    );
    assert_that!(engine.pending().len(), eq(2_usize));
    assert_that!(engine.bracket_open(), eq(false));
}

#[rstest]
fn transaction_without_end_fails_wholly_without_consuming_payload() {
    let engine = MockEngine::default();
    let _ = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    let _ = expect_value(&engine, frame("get", &["key1"]), bulk("one"));

    let result = engine.process_transaction(&[frame("get", &["key1"])]);
    assert_that!(result.is_err(), eq(true));
    assert_that!(engine.pending().len(), eq(2_usize));
}

#[rstest]
#[case(MatchMode::Ordered)]
#[case(MatchMode::Unordered)]
fn bracketed_transaction_succeeds_end_to_end(#[case] mode: MatchMode) {
    let engine = MockEngine::default();
    engine.set_mode(mode);
    expect_bracket(
        &engine,
        &[
            (frame("get", &["key1"]), bulk("one")),
            (frame("hget", &["hash", "field"]), bulk("two")),
        ],
    );

    let replies = engine
        .process_transaction(&[frame("get", &["key1"]), frame("hget", &["hash", "field"])])
        .expect("bracketed batch should succeed");
    assert_that!(&replies, eq(&vec![Ok(bulk("one")), Ok(bulk("two"))]));
    assert_that!(engine.bracket_open(), eq(false));
    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
}

#[rstest]
fn unordered_transaction_accepts_shuffled_payload() {
    let engine = MockEngine::default();
    engine.set_mode(MatchMode::Unordered);
    expect_bracket(
        &engine,
        &[
            (frame("get", &["key1"]), bulk("one")),
            (frame("hget", &["hash", "field"]), bulk("two")),
        ],
    );

    let replies = engine
        .process_transaction(&[frame("hget", &["hash", "field"]), frame("get", &["key1"])])
        .expect("unordered batch should succeed");
    assert_that!(&replies, eq(&vec![Ok(bulk("two")), Ok(bulk("one"))]));
}

#[rstest]
fn ordered_transaction_with_payload_miss_fails_at_end_and_closes_bracket() {
    let engine = MockEngine::default();
    expect_bracket(&engine, &[(frame("get", &["key1"]), bulk("one"))]);

    let result = engine.process_transaction(&[frame("get", &["other"])]);
    assert_that!(
        &result,
        eq(&Err(MockError::TransactionNotExpected {
            reason: "end expectation is not next after the batch".to_owned()
        }))
    );
    assert_that!(engine.bracket_open(), eq(false));
    assert_that!(engine.unexpected_calls().len(), eq(2_usize));
}

#[rstest]
fn ordered_transaction_payload_miss_with_end_next_completes_batch() {
    let engine = MockEngine::default();
    let _ = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    let _ = expect_value(&engine, frame("get", &["a"]), bulk("A"));
    let _ = engine.register(frame("exec", &[]), Matcher::Exact, Role::TxEnd);
    let _ = expect_value(&engine, frame("get", &["b"]), bulk("B"));

    let replies = engine
        .process_transaction(&[frame("get", &["a"]), frame("get", &["b"])])
        .expect("end sentinel is next after the matched payload");
    assert_that!(
        &replies,
        eq(&vec![
            Ok(bulk("A")),
            Err(MockError::NoMatch {
                call: "get b".to_owned(),
                queue_empty: false,
            }),
        ])
    );
    assert_that!(engine.bracket_open(), eq(false));
    assert_that!(engine.unexpected_calls().len(), eq(1_usize));

    let pending = engine.pending();
    assert_that!(pending.len(), eq(1_usize));
    assert_that!(pending[0].frame.to_string().as_str(), eq("get b"));
}

#[rstest]
fn begin_sentinel_error_aborts_batch_before_payload() {
    let engine = MockEngine::default();
    let begin = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    engine.set_outcome(begin, Outcome::Error(MockError::from("multi refused")));
    let _ = expect_value(&engine, frame("get", &["key1"]), bulk("one"));
    let _ = engine.register(frame("exec", &[]), Matcher::Exact, Role::TxEnd);

    assert_that!(
        &engine.process_transaction(&[frame("get", &["key1"])]),
        eq(&Err(MockError::from("multi refused")))
    );
    assert_that!(engine.pending().len(), eq(2_usize));
    assert_that!(engine.bracket_open(), eq(false));
}

#[rstest]
fn single_path_sentinels_drive_the_bracket() {
    let engine = MockEngine::default();
    let _ = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    let _ = expect_value(&engine, frame("get", &["key1"]), bulk("one"));
    let _ = engine.register(frame("exec", &[]), Matcher::Exact, Role::TxEnd);

    assert_that!(&engine.process_command(&frame("multi", &[])), eq(&Ok(Reply::ok())));
    assert_that!(engine.bracket_open(), eq(true));
    assert_that!(&engine.process_command(&frame("get", &["key1"])), eq(&Ok(bulk("one"))));
    assert_that!(&engine.process_command(&frame("exec", &[])), eq(&Ok(Reply::ok())));
    assert_that!(engine.bracket_open(), eq(false));
}

#[rstest]
fn clear_resets_queue_log_bracket_and_mode() {
    let engine = MockEngine::default();
    engine.set_mode(MatchMode::Unordered);
    let _ = engine.register(frame("multi", &[]), Matcher::Exact, Role::TxBegin);
    let _ = engine.register(frame("get", &["pending"]), Matcher::Exact, Role::Normal);
    let _ = engine.process_command(&frame("multi", &[]));
    let _ = engine.process_command(&frame("nope", &[]));

    engine.clear();
    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
    assert_that!(engine.unexpected_calls().is_empty(), eq(true));
    assert_that!(engine.bracket_open(), eq(false));
    assert_that!(engine.mode(), eq(MatchMode::Ordered));
    assert_that!(
        engine
            .register(frame("get", &["a"]), Matcher::Exact, Role::Normal)
            .sequence(),
        eq(Sequence::FIRST)
    );
}

#[rstest]
fn outcome_written_after_clear_is_ignored() {
    let engine = MockEngine::default();
    let stale = engine.register(frame("get", &["a"]), Matcher::Exact, Role::Normal);
    engine.clear();
    engine.set_outcome(stale, Outcome::Value(Reply::ok()));
    assert_that!(engine.pending().is_empty(), eq(true));
}

#[rstest]
fn outcome_written_after_clear_leaves_reused_sequence_alone() {
    let engine = MockEngine::default();
    let stale = engine.register(frame("get", &["old"]), Matcher::Exact, Role::Normal);
    engine.clear();
    let fresh = expect_value(&engine, frame("get", &["new"]), bulk("fresh"));
    assert_that!(stale.sequence(), eq(fresh.sequence()));

    engine.set_outcome(stale, Outcome::Error(MockError::from("stale write")));
    assert_that!(&engine.process_command(&frame("get", &["new"])), eq(&Ok(bulk("fresh"))));
}

#[rstest]
fn disabled_call_log_still_returns_errors() {
    let engine = MockEngine::new(MockConfig {
        record_unexpected_calls: false,
        ..MockConfig::default()
    });
    assert_that!(engine.process_command(&frame("get", &["a"])).is_err(), eq(true));
    assert_that!(engine.unexpected_calls().is_empty(), eq(true));
}

#[rstest]
fn panicking_custom_matcher_does_not_wedge_the_engine() {
    let engine = Arc::new(MockEngine::default());
    let _ = engine.register(
        frame("get", &["boom"]),
        Matcher::custom(|_, _| panic!("matcher exploded")),
        Role::Normal,
    );

    let worker = Arc::clone(&engine);
    let joined = std::thread::spawn(move || worker.process_command(&frame("get", &["boom"]))).join();
    assert_that!(joined.is_err(), eq(true));

    engine.clear();
    let _ = expect_value(&engine, frame("get", &["a"]), bulk("A"));
    assert_that!(&engine.process_command(&frame("get", &["a"])), eq(&Ok(bulk("A"))));
}

#[rstest]
fn concurrent_unordered_callers_consume_every_expectation() {
    let engine = MockEngine::default();
    engine.set_mode(MatchMode::Unordered);
    for index in 0..32 {
        let command = format!("cmd{index}");
        let _ = expect_value(&engine, frame(&command, &["key"]), bulk(&command));
    }

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let engine = &engine;
            let _ = scope.spawn(move || {
                for index in (worker..32).step_by(4).rev() {
                    let command = format!("cmd{index}");
                    assert_eq!(
                        engine.process_command(&frame(&command, &["key"])),
                        Ok(bulk(&command))
                    );
                }
            });
        }
    });

    assert_that!(&engine.expectations_were_met(), eq(&Ok(())));
    assert_that!(engine.unexpected_calls().is_empty(), eq(true));
}
