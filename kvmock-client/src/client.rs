//! Single-node client handle and its mock.

use std::sync::Arc;

use kvmock_common::config::MockConfig;
use kvmock_common::error::MockResult;
use kvmock_core::command::{Arg, CommandFrame};
use kvmock_core::engine::MockEngine;
use kvmock_core::expectation::Role;
use kvmock_core::interceptor::Interceptor;
use kvmock_core::matcher::Matcher;

use crate::cmd::{Cmd, Cmder};
use crate::cmds;
use crate::commands::{self, Commands};
use crate::expect::{self, BaseMock, Expected, UnexpectedCallLog};
use crate::pipeline::Pipeline;

/// Client handle whose commands are resolved by an [`Interceptor`] instead of a server.
#[derive(Debug, Clone)]
pub struct MockClient {
    interceptor: Arc<dyn Interceptor>,
}

impl MockClient {
    /// Wraps any interceptor.
    #[must_use]
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Self {
        Self { interceptor }
    }

    /// Starts a plain pipeline.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(Arc::clone(&self.interceptor), false)
    }

    /// Starts a transactional pipeline, bracketed by the begin and end sentinels on exec.
    #[must_use]
    pub fn tx_pipeline(&self) -> Pipeline {
        Pipeline::new(Arc::clone(&self.interceptor), true)
    }

    /// Issues `watch keys`, then runs `body` with a transaction handle.
    ///
    /// # Errors
    ///
    /// Returns the watch command's error without running `body`, otherwise whatever `body`
    /// returns.
    pub fn watch<I, K, F>(&self, keys: I, body: F) -> MockResult<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
        F: FnOnce(&Tx) -> MockResult<()>,
    {
        let watched = self.run(cmds::watch(keys));
        if let Some(error) = watched.err() {
            tracing::debug!(command = %watched.command(), %error, "watch failed, body skipped");
            return Err(error.clone());
        }
        body(&Tx {
            client: self.clone(),
        })
    }
}

impl Commands for MockClient {
    type Output<C: Cmder> = C;

    fn run<C: Cmder>(&self, cmd: C) -> C {
        commands::dispatch(self.interceptor.as_ref(), cmd)
    }
}

/// Transaction handle passed to a [`MockClient::watch`] body.
#[derive(Debug)]
pub struct Tx {
    client: MockClient,
}

impl Tx {
    /// Starts a transactional pipeline on the watched connection.
    #[must_use]
    pub fn tx_pipeline(&self) -> Pipeline {
        self.client.tx_pipeline()
    }

    /// Starts a plain pipeline on the watched connection.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        self.client.pipeline()
    }
}

impl Commands for Tx {
    type Output<C: Cmder> = C;

    fn run<C: Cmder>(&self, cmd: C) -> C {
        self.client.run(cmd)
    }
}

/// Expectation side of a single-node mock.
#[derive(Debug, Clone)]
pub struct ClientMock {
    engine: Arc<MockEngine>,
}

impl ClientMock {
    /// Expects the begin sentinel of a transactional pipeline.
    pub fn expect_tx_pipeline(&self) -> Expected<()> {
        let name = self.engine.config().tx_begin_command.clone();
        self.expect_sentinel(CommandFrame::new(name, Vec::new()), Role::TxBegin)
    }

    /// Expects the end sentinel of a transactional pipeline.
    pub fn expect_tx_pipeline_exec(&self) -> Expected<()> {
        let name = self.engine.config().tx_end_command.clone();
        self.expect_sentinel(CommandFrame::new(name, Vec::new()), Role::TxEnd)
    }

    /// Expects `watch keys`. The expectation succeeds unless an error is set on it.
    pub fn expect_watch<I, K>(&self, keys: I) -> Expected<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        expect::register(&self.engine, cmds::watch(keys), Matcher::Exact, Role::Watch)
    }

    fn expect_sentinel(&self, frame: CommandFrame, role: Role) -> Expected<()> {
        expect::register(&self.engine, Cmd::new(frame), Matcher::Exact, role)
    }
}

impl BaseMock for ClientMock {
    fn engine(&self) -> &Arc<MockEngine> {
        &self.engine
    }
}

impl UnexpectedCallLog for ClientMock {}

/// Creates a client handle and its mock with the default configuration.
#[must_use]
pub fn new_client_mock() -> (MockClient, ClientMock) {
    new_client_mock_with(MockConfig::default())
}

/// Creates a client handle and its mock sharing one engine.
#[must_use]
pub fn new_client_mock_with(config: MockConfig) -> (MockClient, ClientMock) {
    let engine = Arc::new(MockEngine::new(config));
    let client = MockClient::new(Arc::clone(&engine) as Arc<dyn Interceptor>);
    (client, ClientMock { engine })
}
