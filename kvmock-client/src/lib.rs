//! Fake key-value client handles for unit tests.
//!
//! [`new_client_mock`] returns a client handle and the mock that controls it. Tests register
//! expectations on the mock, run the code under test against the handle, then verify:
//!
//! ```
//! use std::time::Duration;
//! use kvmock_client::{BaseMock, Commands, Expectations, new_client_mock};
//!
//! let (client, mock) = new_client_mock();
//! mock.expect_set("session", "token", Duration::from_secs(60)).set_val("OK");
//! mock.expect_get("session").set_val("token");
//!
//! client.set("session", "token", Duration::from_secs(60));
//! assert_eq!(client.get("session").val(), "token");
//! assert!(mock.expectations_were_met().is_ok());
//! ```

pub mod client;
pub mod cluster;
pub mod cmd;
pub mod cmds;
pub mod commands;
pub mod expect;
pub mod pipeline;

pub use client::{ClientMock, MockClient, Tx, new_client_mock, new_client_mock_with};
pub use cluster::{ClusterMock, MockClusterClient, new_cluster_mock, new_cluster_mock_with};
pub use cmd::{
    BoolCmd, Cmd, Cmder, FloatCmd, FromReply, IntCmd, IntoReply, MapStringStringCmd, RawCmd,
    SliceCmd, StatusCmd, StringCmd, StringSliceCmd,
};
pub use commands::Commands;
pub use expect::{BaseMock, Expectations, Expected, MatchScope, UnexpectedCallLog};
pub use kvmock_common::config::{MatchMode, MockConfig};
pub use kvmock_common::error::{MockError, MockResult};
pub use kvmock_core::{Arg, Reply, UnexpectedCall};
pub use pipeline::{Pipeline, PipelineResults, Queued};
