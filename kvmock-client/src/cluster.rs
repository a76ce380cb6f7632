//! Cluster client handle and its mock.
//!
//! The cluster variant shares the engine and command bindings with the single-node handle
//! but exposes neither transactions, watch, nor the unexpected-call log.

use std::sync::Arc;

use kvmock_common::config::MockConfig;
use kvmock_core::engine::MockEngine;
use kvmock_core::interceptor::Interceptor;

use crate::cmd::Cmder;
use crate::commands::{self, Commands};
use crate::expect::BaseMock;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone)]
pub struct MockClusterClient {
    interceptor: Arc<dyn Interceptor>,
}

impl MockClusterClient {
    #[must_use]
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Self {
        Self { interceptor }
    }

    /// Starts a plain pipeline.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(Arc::clone(&self.interceptor), false)
    }
}

impl Commands for MockClusterClient {
    type Output<C: Cmder> = C;

    fn run<C: Cmder>(&self, cmd: C) -> C {
        commands::dispatch(self.interceptor.as_ref(), cmd)
    }
}

#[derive(Debug, Clone)]
pub struct ClusterMock {
    engine: Arc<MockEngine>,
}

impl BaseMock for ClusterMock {
    fn engine(&self) -> &Arc<MockEngine> {
        &self.engine
    }
}

#[must_use]
pub fn new_cluster_mock() -> (MockClusterClient, ClusterMock) {
    new_cluster_mock_with(MockConfig::default())
}

#[must_use]
pub fn new_cluster_mock_with(config: MockConfig) -> (MockClusterClient, ClusterMock) {
    let engine = Arc::new(MockEngine::new(config));
    let client = MockClusterClient::new(Arc::clone(&engine) as Arc<dyn Interceptor>);
    (client, ClusterMock { engine })
}

#[cfg(test)]
mod tests {
    use super::new_cluster_mock;
    use crate::commands::Commands;
    use crate::expect::{BaseMock, Expectations};
    use googletest::prelude::*;
    use kvmock_common::error::MockError;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn cluster_mock_replays_expectations() {
        let (client, mock) = new_cluster_mock();
        mock.expect_get("key").set_val("value");
        mock.expect_set("key", "value2", Duration::ZERO).set_val("OK");

        assert_that!(client.get("key").val().as_str(), eq("value"));
        assert_that!(client.set("key", "value2", Duration::ZERO).val().as_str(), eq("OK"));
        assert_that!(mock.expectations_were_met().is_ok(), eq(true));
    }

    #[rstest]
    fn cluster_pipeline_resolves_each_command() {
        let (client, mock) = new_cluster_mock();
        mock.expect_incr("counter").set_val(1);
        mock.expect_incr("counter").set_err("boom");

        let pipe = client.pipeline();
        let first = pipe.incr("counter");
        let second = pipe.incr("counter");
        let results = pipe.exec();

        assert_that!(results.get(&first).map(|cmd| cmd.val()), eq(Some(1)));
        assert_that!(
            results.get(&second).and_then(|cmd| cmd.err()),
            eq(Some(&MockError::from("boom")))
        );
        assert_that!(mock.expectations_were_met().is_ok(), eq(true));
    }

    #[rstest]
    fn cluster_mock_supports_regexp_and_clear() {
        let (client, mock) = new_cluster_mock();
        mock.regexp().expect_get("user:[0-9]+").set_val("alice");
        assert_that!(client.get("user:42").val().as_str(), eq("alice"));

        mock.expect_get("other").set_val("x");
        mock.clear_expect();
        assert_that!(mock.expectations_were_met().is_ok(), eq(true));
        assert_that!(client.get("other").err().is_some(), eq(true));
    }
}
