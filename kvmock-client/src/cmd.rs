//! Typed command results and reply conversions.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use kvmock_common::error::{MockError, MockResult};
use kvmock_core::command::{CommandFrame, Reply};

/// Conversion from the engine's reply union into a typed command result.
pub trait FromReply: Sized {
    /// Converts one reply.
    ///
    /// # Errors
    ///
    /// Returns [`MockError::Nil`] for a null reply and [`MockError::ReplyShape`] when the
    /// reply variant cannot represent `Self`.
    fn from_reply(reply: Reply) -> MockResult<Self>;
}

/// Conversion from a typed value into the reply stored on an expectation.
pub trait IntoReply {
    /// Converts the value.
    fn into_reply(self) -> Reply;
}

fn shape_error(expected: &'static str, reply: &Reply) -> MockError {
    MockError::ReplyShape {
        expected,
        actual: format!("{} {reply}", reply.kind()),
    }
}

fn parse_text<T: std::str::FromStr>(
    expected: &'static str,
    reply: &Reply,
    text: &str,
) -> MockResult<T> {
    text.parse().map_err(|_| shape_error(expected, reply))
}

impl FromReply for Reply {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        Ok(reply)
    }
}

impl FromReply for String {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match reply {
            Reply::SimpleString(value) => Ok(value),
            Reply::BulkString(value) => Ok(String::from_utf8_lossy(&value).into_owned()),
            Reply::Integer(value) => Ok(value.to_string()),
            Reply::Double(value) => Ok(value.to_string()),
            Reply::Null => Err(MockError::Nil),
            other => Err(shape_error("string", &other)),
        }
    }
}

impl FromReply for i64 {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match &reply {
            Reply::Integer(value) => Ok(*value),
            Reply::Boolean(value) => Ok(i64::from(*value)),
            Reply::SimpleString(text) => parse_text("integer", &reply, text),
            Reply::BulkString(bytes) => {
                parse_text("integer", &reply, &String::from_utf8_lossy(bytes))
            }
            Reply::Null => Err(MockError::Nil),
            _ => Err(shape_error("integer", &reply)),
        }
    }
}

impl FromReply for f64 {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match &reply {
            Reply::Double(value) => Ok(*value),
            #[allow(clippy::cast_precision_loss)]
            Reply::Integer(value) => Ok(*value as f64),
            Reply::SimpleString(text) => parse_text("double", &reply, text),
            Reply::BulkString(bytes) => {
                parse_text("double", &reply, &String::from_utf8_lossy(bytes))
            }
            Reply::Null => Err(MockError::Nil),
            _ => Err(shape_error("double", &reply)),
        }
    }
}

impl FromReply for bool {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match reply {
            Reply::Boolean(value) => Ok(value),
            Reply::Integer(value) => Ok(value != 0),
            Reply::Null => Err(MockError::Nil),
            other => Err(shape_error("boolean", &other)),
        }
    }
}

impl FromReply for () {
    fn from_reply(_reply: Reply) -> MockResult<Self> {
        Ok(())
    }
}

impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match reply {
            Reply::Null => Ok(None),
            other => T::from_reply(other).map(Some),
        }
    }
}

impl<T: FromReply> FromReply for Vec<T> {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match reply {
            Reply::Array(items) => items.into_iter().map(T::from_reply).collect(),
            Reply::Null => Err(MockError::Nil),
            other => Err(shape_error("array", &other)),
        }
    }
}

impl FromReply for HashMap<String, String> {
    fn from_reply(reply: Reply) -> MockResult<Self> {
        match reply {
            Reply::Map(pairs) => pairs
                .into_iter()
                .map(|(key, value)| Ok((String::from_reply(key)?, String::from_reply(value)?)))
                .collect(),
            Reply::Array(items) if items.len() % 2 == 0 => {
                let mut map = HashMap::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    let _ = map.insert(String::from_reply(key)?, String::from_reply(value)?);
                }
                Ok(map)
            }
            Reply::Null => Err(MockError::Nil),
            other => Err(shape_error("map", &other)),
        }
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::BulkString(self.into_bytes())
    }
}

impl IntoReply for &str {
    fn into_reply(self) -> Reply {
        Reply::BulkString(self.as_bytes().to_vec())
    }
}

impl IntoReply for i64 {
    fn into_reply(self) -> Reply {
        Reply::Integer(self)
    }
}

impl IntoReply for f64 {
    fn into_reply(self) -> Reply {
        Reply::Double(self)
    }
}

impl IntoReply for bool {
    fn into_reply(self) -> Reply {
        Reply::Boolean(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::ok()
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Null, IntoReply::into_reply)
    }
}

impl<T: IntoReply> IntoReply for Vec<T> {
    fn into_reply(self) -> Reply {
        Reply::Array(self.into_iter().map(IntoReply::into_reply).collect())
    }
}

impl IntoReply for HashMap<String, String> {
    fn into_reply(self) -> Reply {
        let mut pairs = self.into_iter().collect::<Vec<_>>();
        pairs.sort();
        Reply::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into_reply(), value.into_reply()))
                .collect(),
        )
    }
}

/// Object-safe view of one issued command, used to batch heterogeneous results.
pub trait Cmder: Any + Send + fmt::Debug {
    /// Command as it is handed to the interceptor.
    fn frame(&self) -> &CommandFrame;
    /// Writes the interceptor's result into this command.
    fn apply(&mut self, reply: MockResult<Reply>);
    /// Error currently held by this command, if any.
    fn error(&self) -> Option<&MockError>;
    /// Upcast used to recover the concrete result type from a batch.
    fn as_any(&self) -> &dyn Any;
}

/// Result object of one command, populated by the interceptor.
///
/// A command that has not been processed yet holds [`MockError::InvalidState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd<T> {
    frame: CommandFrame,
    result: MockResult<T>,
}

/// Bulk-string result (`GET`, `HGET`, ...).
pub type StringCmd = Cmd<String>;
/// Status result (`SET`, `MSET`, `PING`, ...).
pub type StatusCmd = Cmd<String>;
/// Integer result.
pub type IntCmd = Cmd<i64>;
/// Boolean result.
pub type BoolCmd = Cmd<bool>;
/// Double result.
pub type FloatCmd = Cmd<f64>;
/// Array-of-strings result.
pub type StringSliceCmd = Cmd<Vec<String>>;
/// Array result where elements may be null (`MGET`).
pub type SliceCmd = Cmd<Vec<Option<String>>>;
/// Field/value map result (`HGETALL`).
pub type MapStringStringCmd = Cmd<HashMap<String, String>>;
/// Untyped result of a raw command.
pub type RawCmd = Cmd<Reply>;

impl<T> Cmd<T> {
    /// Creates an unprocessed command.
    #[must_use]
    pub fn new(frame: CommandFrame) -> Self {
        Self {
            frame,
            result: Err(MockError::InvalidState("command was not processed")),
        }
    }

    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.frame.name
    }

    /// Command frame.
    #[must_use]
    pub fn command(&self) -> &CommandFrame {
        &self.frame
    }

    /// Error of the command, `None` on success.
    #[must_use]
    pub fn err(&self) -> Option<&MockError> {
        self.result.as_ref().err()
    }

    /// Borrowed result.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub fn result(&self) -> Result<&T, &MockError> {
        self.result.as_ref()
    }

    /// Owned result.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub fn into_result(self) -> MockResult<T> {
        self.result
    }
}

impl<T: Clone + Default> Cmd<T> {
    /// Value of the command, or the type's zero value when the command failed.
    #[must_use]
    pub fn val(&self) -> T {
        self.result.as_ref().cloned().unwrap_or_default()
    }
}

impl<T> Cmder for Cmd<T>
where
    T: FromReply + Send + fmt::Debug + 'static,
{
    fn frame(&self) -> &CommandFrame {
        &self.frame
    }

    fn apply(&mut self, reply: MockResult<Reply>) {
        self.result = reply.and_then(T::from_reply);
    }

    fn error(&self) -> Option<&MockError> {
        self.err()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
